//! Ledger entries
//!
//! Entries are immutable once created. A mistaken entry is corrected by
//! appending an offsetting entry of the opposite type, never by editing or
//! deleting it.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClientId, LedgerEntryId, Money, PolicyId};

use crate::error::KhataError;

/// Direction of an entry
///
/// A debit is money the client owes, a credit is money collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    /// The type that cancels this one
    pub fn opposite(&self) -> Self {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }

    /// Contribution of `amount` to the balance
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            EntryType::Debit => amount,
            EntryType::Credit => -amount,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Ok(EntryType::Debit),
            "CREDIT" => Ok(EntryType::Credit),
            other => Err(format!("unknown entry type: {}", other)),
        }
    }
}

/// Input for a new entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub client_id: ClientId,
    pub entry_type: EntryType,
    pub amount: Money,
    pub description: String,
    pub entry_date: NaiveDate,
    pub policy_id: Option<PolicyId>,
}

/// One posted debit or credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub client_id: ClientId,
    pub entry_type: EntryType,
    /// Always positive
    pub amount: Money,
    pub description: String,
    pub entry_date: NaiveDate,
    pub policy_id: Option<PolicyId>,
    /// The entry this one cancels, if it is an offsetting entry
    pub offsets: Option<LedgerEntryId>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Creates an entry, rejecting non-positive amounts
    pub fn new(input: NewEntry) -> Result<Self, KhataError> {
        if !input.amount.is_positive() {
            return Err(KhataError::InvalidAmount(input.amount.amount()));
        }
        Ok(Self {
            id: LedgerEntryId::new_v7(),
            client_id: input.client_id,
            entry_type: input.entry_type,
            amount: input.amount,
            description: input.description,
            entry_date: input.entry_date,
            policy_id: input.policy_id,
            offsets: None,
            created_at: Utc::now(),
        })
    }

    /// Builds the entry that cancels this one
    pub fn offsetting(&self, entry_date: NaiveDate, reason: &str) -> Self {
        let description = if reason.trim().is_empty() {
            format!("Offset of {} ({})", self.id, self.description)
        } else {
            format!("Offset of {}: {}", self.id, reason.trim())
        };
        Self {
            id: LedgerEntryId::new_v7(),
            client_id: self.client_id,
            entry_type: self.entry_type.opposite(),
            amount: self.amount,
            description,
            entry_date,
            policy_id: self.policy_id,
            offsets: Some(self.id),
            created_at: Utc::now(),
        }
    }

    /// Contribution to the client balance
    pub fn signed_amount(&self) -> Decimal {
        self.entry_type.signed(self.amount.amount())
    }
}
