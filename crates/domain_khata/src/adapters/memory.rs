//! In-memory khata store
//!
//! Entries are pushed onto a vector under a write lock, so concurrent
//! appends are serialised and none is lost.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, ClientId, DomainPort, HealthCheckResult, HealthCheckable, LedgerEntryId, PortError,
};

use crate::entry::LedgerEntry;
use crate::ledger::{totals_by_client, ClientTotals};
use crate::ports::KhataStore;

#[derive(Debug, Default, Clone)]
pub struct InMemoryKhataStore {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl InMemoryKhataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl DomainPort for InMemoryKhataStore {}

#[async_trait]
impl HealthCheckable for InMemoryKhataStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory-khata-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl KhataStore for InMemoryKhataStore {
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, PortError> {
        let mut entries = self.entries.write().await;
        if let Some(target) = entry.offsets {
            if entries.iter().any(|e| e.offsets == Some(target)) {
                return Err(PortError::conflict(format!("entry {} already offset", target)));
            }
        }
        entries.push(entry.clone());
        Ok(entry)
    }

    async fn get_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, PortError> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| PortError::not_found("LedgerEntry", id))
    }

    async fn entries_for(&self, client_id: ClientId) -> Result<Vec<LedgerEntry>, PortError> {
        let mut entries: Vec<LedgerEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.client_id == client_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.entry_date, e.created_at, e.id));
        Ok(entries)
    }

    async fn totals_for(&self, client_id: ClientId) -> Result<ClientTotals, PortError> {
        let entries = self.entries.read().await;
        let totals = totals_by_client(entries.iter().filter(|e| e.client_id == client_id));
        Ok(totals
            .into_iter()
            .next()
            .unwrap_or_else(|| ClientTotals::empty(client_id)))
    }

    async fn client_totals(&self) -> Result<Vec<ClientTotals>, PortError> {
        let entries = self.entries.read().await;
        Ok(totals_by_client(entries.iter()))
    }
}
