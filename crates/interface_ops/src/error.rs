//! Operator error type

use std::path::PathBuf;

use thiserror::Error;

use core_kernel::MoneyError;
use domain_commission::CommissionError;
use domain_khata::KhataError;
use infra_db::DatabaseError;

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid currency: {0}")]
    Currency(#[from] MoneyError),

    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Commission(#[from] CommissionError),

    #[error(transparent)]
    Khata(#[from] KhataError),

    #[error("Migrations need a database connection")]
    NoDatabase,

    #[error("Cannot read {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
