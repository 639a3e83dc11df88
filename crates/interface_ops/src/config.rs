//! Operator configuration
//!
//! Read from `COMMISSION_*` environment variables on top of built-in
//! defaults, so nothing has to be set for a local run.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

use core_kernel::Currency;
use infra_db::DatabaseConfig;

use crate::error::OpsError;

const ENV_PREFIX: &str = "COMMISSION";

/// Log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Operator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OpsConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    /// ISO code of the engine currency
    pub currency: String,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/commission".to_string(),
            currency: "INR".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

impl OpsConfig {
    /// Loads `.env` if present, then the process environment
    pub fn from_env() -> Result<Self, OpsError> {
        dotenvy::dotenv().ok();
        Self::load(Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads from an explicit variable map instead of the process environment
    pub fn from_map(vars: HashMap<String, String>) -> Result<Self, OpsError> {
        Self::load(Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn load(environment: Environment) -> Result<Self, OpsError> {
        let defaults = Self::default();
        let config: OpsConfig = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("currency", defaults.currency)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", "pretty")?
            .set_default("max_connections", defaults.max_connections)?
            .set_default("min_connections", defaults.min_connections)?
            .set_default("connect_timeout_secs", defaults.connect_timeout_secs)?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), OpsError> {
        self.currency()?;
        if self.max_connections == 0 {
            return Err(OpsError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn currency(&self) -> Result<Currency, OpsError> {
        Ok(Currency::from_str(&self.currency)?)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_need_no_variables() {
        let config = OpsConfig::from_map(HashMap::new()).unwrap();

        assert_eq!(config.database_url, "postgres://localhost/commission");
        assert_eq!(config.currency().unwrap(), Currency::INR);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_prefixed_variables_override_defaults() {
        let config = OpsConfig::from_map(vars(&[
            ("COMMISSION_DATABASE_URL", "postgres://db.internal/ledger"),
            ("COMMISSION_CURRENCY", "usd"),
            ("COMMISSION_LOG_FORMAT", "json"),
            ("COMMISSION_MAX_CONNECTIONS", "4"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "postgres://db.internal/ledger");
        assert_eq!(config.currency().unwrap(), Currency::USD);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.database().max_connections, 4);
    }

    #[test]
    fn test_unknown_currency_is_rejected() {
        let result = OpsConfig::from_map(vars(&[("COMMISSION_CURRENCY", "XYZ")]));
        assert!(matches!(result, Err(OpsError::Currency(_))));
    }

    #[test]
    fn test_zero_connections_is_rejected() {
        let result = OpsConfig::from_map(vars(&[("COMMISSION_MAX_CONNECTIONS", "0")]));
        assert!(matches!(result, Err(OpsError::InvalidConfig(_))));
    }
}
