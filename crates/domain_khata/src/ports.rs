//! Khata Domain Ports
//!
//! The ledger store is append-only: there is no update or delete operation.
//! Concurrent appends for the same client must all be kept, and totals are
//! always folded from the stored entries.

use async_trait::async_trait;

use core_kernel::{ClientId, DomainPort, HealthCheckable, LedgerEntryId, PortError};

use crate::entry::LedgerEntry;
use crate::ledger::ClientTotals;

#[async_trait]
pub trait KhataStore: DomainPort + HealthCheckable {
    /// Appends an entry
    ///
    /// Fails with `PortError::Conflict` when `entry.offsets` names an entry
    /// that already has an offsetting entry.
    async fn append(&self, entry: LedgerEntry) -> Result<LedgerEntry, PortError>;

    async fn get_entry(&self, id: LedgerEntryId) -> Result<LedgerEntry, PortError>;

    /// Every entry of one client, oldest first
    async fn entries_for(&self, client_id: ClientId) -> Result<Vec<LedgerEntry>, PortError>;

    /// Debit and credit sums of one client
    async fn totals_for(&self, client_id: ClientId) -> Result<ClientTotals, PortError>;

    /// Debit and credit sums of every client with at least one entry
    async fn client_totals(&self) -> Result<Vec<ClientTotals>, PortError>;
}
