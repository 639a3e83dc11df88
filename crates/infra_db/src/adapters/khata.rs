//! PostgreSQL khata store

use async_trait::async_trait;

use core_kernel::{ClientId, DomainPort, HealthCheckResult, HealthCheckable, LedgerEntryId, PortError};
use domain_khata::{ClientTotals, KhataStore, LedgerEntry};

use crate::adapters::ping;
use crate::error::DatabaseError;
use crate::pool::DatabasePool;
use crate::repositories::KhataRepository;

#[derive(Debug, Clone)]
pub struct PostgresKhataStore {
    repository: KhataRepository,
    pool: DatabasePool,
}

impl PostgresKhataStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            repository: KhataRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresKhataStore {}

#[async_trait]
impl HealthCheckable for PostgresKhataStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-khata-store").await
    }
}

#[async_trait]
impl KhataStore for PostgresKhataStore {
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, PortError> {
        self.repository.insert(&entry).await.map_err(|e| match (e, entry.offsets) {
            // the partial unique index on offsets_entry_id
            (DatabaseError::DuplicateEntry(_), Some(target)) => {
                PortError::conflict(format!("entry {} already offset", target))
            }
            (DatabaseError::ForeignKeyViolation(_), Some(target)) => PortError::not_found("LedgerEntry", target),
            (other, _) => other.into(),
        })?;
        Ok(entry)
    }

    async fn get_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, PortError> {
        self.repository.get(id).await.map_err(|e| {
            if e.is_not_found() {
                PortError::not_found("LedgerEntry", id)
            } else {
                e.into()
            }
        })
    }

    async fn entries_for(&self, client_id: ClientId) -> Result<Vec<LedgerEntry>, PortError> {
        Ok(self.repository.for_client(client_id).await?)
    }

    async fn totals_for(&self, client_id: ClientId) -> Result<ClientTotals, PortError> {
        Ok(self.repository.totals_for(client_id).await?)
    }

    async fn client_totals(&self) -> Result<Vec<ClientTotals>, PortError> {
        Ok(self.repository.all_totals().await?)
    }
}
