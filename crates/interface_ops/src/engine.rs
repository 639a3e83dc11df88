//! Service wiring
//!
//! Builds the commission and khata services over either the PostgreSQL
//! adapters or the in-memory ones.

use std::sync::Arc;

use tracing::info;

use core_kernel::Currency;
use domain_commission::adapters::{InMemoryCommissionStore, InMemoryRuleStore};
use domain_commission::CommissionService;
use domain_khata::adapters::InMemoryKhataStore;
use domain_khata::KhataService;
use infra_db::{
    create_pool, run_migrations, DatabasePool, PostgresCommissionStore, PostgresKhataStore, PostgresRuleStore,
};

use crate::config::OpsConfig;
use crate::error::OpsError;

pub struct Engine {
    pub commissions: CommissionService,
    pub khata: KhataService,
    pool: Option<DatabasePool>,
}

impl Engine {
    /// Connects to the configured database
    pub async fn connect(config: &OpsConfig) -> Result<Self, OpsError> {
        let currency = config.currency()?;
        let pool = create_pool(config.database()).await?;
        info!(%currency, "Engine connected");
        Ok(Self::from_pool(pool, currency))
    }

    pub fn from_pool(pool: DatabasePool, currency: Currency) -> Self {
        let commissions = CommissionService::new(
            Arc::new(PostgresRuleStore::new(pool.clone())),
            Arc::new(PostgresCommissionStore::new(pool.clone())),
        )
        .with_currency(currency);
        let khata = KhataService::new(Arc::new(PostgresKhataStore::new(pool.clone()))).with_currency(currency);

        Self {
            commissions,
            khata,
            pool: Some(pool),
        }
    }

    /// Engine over services wired by the caller, without a database
    pub fn new(commissions: CommissionService, khata: KhataService) -> Self {
        Self {
            commissions,
            khata,
            pool: None,
        }
    }

    /// Engine over empty in-memory stores
    pub fn in_memory(currency: Currency) -> Self {
        let commissions = CommissionService::new(
            Arc::new(InMemoryRuleStore::new()),
            Arc::new(InMemoryCommissionStore::new()),
        )
        .with_currency(currency);
        let khata = KhataService::new(Arc::new(InMemoryKhataStore::new())).with_currency(currency);
        Self::new(commissions, khata)
    }

    /// Applies pending schema migrations
    pub async fn migrate(&self) -> Result<(), OpsError> {
        let pool = self.pool.as_ref().ok_or(OpsError::NoDatabase)?;
        run_migrations(pool).await?;
        info!("Migrations applied");
        Ok(())
    }
}
