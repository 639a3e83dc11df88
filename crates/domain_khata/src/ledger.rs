//! Derived balances and projections
//!
//! A client's balance is never stored. It is always the fold
//! `sum(debits) - sum(credits)` over every entry posted for the client:
//! positive means the client owes money, negative means the client holds an
//! advance.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ClientId, Currency, Money};

use crate::entry::{EntryType, LedgerEntry};
use crate::error::KhataError;

/// Debit and credit sums for one client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTotals {
    pub client_id: ClientId,
    pub debits: Decimal,
    pub credits: Decimal,
    pub entry_count: u64,
}

impl ClientTotals {
    pub fn empty(client_id: ClientId) -> Self {
        Self {
            client_id,
            debits: Decimal::ZERO,
            credits: Decimal::ZERO,
            entry_count: 0,
        }
    }

    fn add(&mut self, entry: &LedgerEntry) {
        match entry.entry_type {
            EntryType::Debit => self.debits += entry.amount.amount(),
            EntryType::Credit => self.credits += entry.amount.amount(),
        }
        self.entry_count += 1;
    }

    pub fn balance(&self) -> Decimal {
        self.debits - self.credits
    }
}

/// Folds entries into per-client totals
pub fn totals_by_client<'a, I>(entries: I) -> Vec<ClientTotals>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    let mut totals: HashMap<ClientId, ClientTotals> = HashMap::new();
    for entry in entries {
        totals
            .entry(entry.client_id)
            .or_insert_with(|| ClientTotals::empty(entry.client_id))
            .add(entry);
    }
    totals.into_values().collect()
}

/// Which way a balance leans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    /// Client owes money
    Owes,
    Settled,
    /// Client has paid in advance
    Advance,
}

impl BalanceStatus {
    pub fn of(balance: Decimal) -> Self {
        if balance > Decimal::ZERO {
            BalanceStatus::Owes
        } else if balance < Decimal::ZERO {
            BalanceStatus::Advance
        } else {
            BalanceStatus::Settled
        }
    }
}

/// A client with money outstanding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCollection {
    pub client_id: ClientId,
    pub total_pending: Money,
    /// Every entry posted for the client, not only the unpaid debits
    pub entry_count: u64,
}

/// Clients whose balance is positive, largest first
pub fn pending_collections(totals: Vec<ClientTotals>, currency: Currency) -> Vec<PendingCollection> {
    let mut pending: Vec<PendingCollection> = totals
        .into_iter()
        .filter(|t| t.balance() > Decimal::ZERO)
        .map(|t| PendingCollection {
            client_id: t.client_id,
            total_pending: Money::new(t.balance(), currency),
            entry_count: t.entry_count,
        })
        .collect();

    pending.sort_by(|a, b| {
        b.total_pending
            .amount()
            .cmp(&a.total_pending.amount())
            .then_with(|| a.client_id.cmp(&b.client_id))
    });
    pending
}

/// One row of a statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub entry: LedgerEntry,
    /// Balance after this entry
    pub running_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub client_id: ClientId,
    pub lines: Vec<StatementLine>,
    pub total_debits: Money,
    pub total_credits: Money,
    pub closing_balance: Money,
}

/// All entries of one client
#[derive(Debug, Clone)]
pub struct ClientLedger {
    client_id: ClientId,
    currency: Currency,
    entries: Vec<LedgerEntry>,
}

impl ClientLedger {
    /// Builds a ledger, ignoring entries that belong to other clients
    pub fn new(client_id: ClientId, currency: Currency, entries: Vec<LedgerEntry>) -> Self {
        let mut entries: Vec<LedgerEntry> = entries.into_iter().filter(|e| e.client_id == client_id).collect();
        entries.sort_by_key(|e| (e.entry_date, e.created_at, e.id));
        Self {
            client_id,
            currency,
            entries,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    fn sum_of(&self, entry_type: EntryType) -> Result<Money, KhataError> {
        let amounts: Vec<&Money> = self
            .entries
            .iter()
            .filter(|e| e.entry_type == entry_type)
            .map(|e| &e.amount)
            .collect();
        Ok(Money::sum(self.currency, amounts)?)
    }

    pub fn total_debits(&self) -> Result<Money, KhataError> {
        self.sum_of(EntryType::Debit)
    }

    pub fn total_credits(&self) -> Result<Money, KhataError> {
        self.sum_of(EntryType::Credit)
    }

    /// `sum(debits) - sum(credits)`
    pub fn balance(&self) -> Result<Money, KhataError> {
        Ok(self.total_debits()?.checked_sub(&self.total_credits()?)?)
    }

    pub fn status(&self) -> Result<BalanceStatus, KhataError> {
        Ok(BalanceStatus::of(self.balance()?.amount()))
    }

    /// Entries in date order with the balance after each
    pub fn statement(&self) -> Result<Statement, KhataError> {
        let mut running = Money::zero(self.currency);
        let mut lines = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            running = match entry.entry_type {
                EntryType::Debit => running.checked_add(&entry.amount)?,
                EntryType::Credit => running.checked_sub(&entry.amount)?,
            };
            lines.push(StatementLine {
                entry: entry.clone(),
                running_balance: running,
            });
        }

        Ok(Statement {
            client_id: self.client_id,
            lines,
            total_debits: self.total_debits()?,
            total_credits: self.total_credits()?,
            closing_balance: running,
        })
    }
}
