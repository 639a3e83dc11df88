//! Khata Domain - the client ledger
//!
//! An append-only sequence of debit and credit entries per client. The
//! balance is always folded from the entries, never kept as a mutable
//! field, so stored and derived balances cannot drift apart.
//!
//! - DEBIT: the client owes money (e.g. a premium the agent fronted)
//! - CREDIT: money collected from the client

pub mod entry;
pub mod ledger;
pub mod ports;
pub mod adapters;
pub mod service;
pub mod error;

pub use entry::{EntryType, LedgerEntry, NewEntry};
pub use ledger::{
    pending_collections, totals_by_client, BalanceStatus, ClientLedger, ClientTotals,
    PendingCollection, Statement, StatementLine,
};
pub use ports::KhataStore;
pub use service::KhataService;
pub use error::KhataError;
