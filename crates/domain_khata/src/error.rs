//! Khata errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{Currency, LedgerEntryId, MoneyError, PortError};

/// Errors that can occur in the client ledger
#[derive(Debug, Error)]
pub enum KhataError {
    /// Entry amounts must be strictly positive
    #[error("Invalid ledger amount {0}: must be greater than zero")]
    InvalidAmount(Decimal),

    #[error("Currency mismatch: ledger is kept in {expected}, entry is in {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    #[error("Ledger entry not found: {0}")]
    EntryNotFound(String),

    /// An offsetting entry already exists for this entry
    #[error("Ledger entry {0} has already been offset")]
    AlreadyOffset(LedgerEntryId),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Store error: {0}")]
    Port(#[from] PortError),
}
