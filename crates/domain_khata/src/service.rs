//! Khata service
//!
//! Entry points used by the collection and payout workflows. Fronting a
//! premium and collecting it later are two independent appends; the service
//! does not link them, so callers must not record the same collection twice.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, instrument};

use core_kernel::{ClientId, Currency, LedgerEntryId, Money, PolicyId, PortError};

use crate::entry::{EntryType, LedgerEntry, NewEntry};
use crate::error::KhataError;
use crate::ledger::{pending_collections, ClientLedger, PendingCollection, Statement};
use crate::ports::KhataStore;

pub struct KhataService {
    store: Arc<dyn KhataStore>,
    currency: Currency,
}

impl KhataService {
    pub fn new(store: Arc<dyn KhataStore>) -> Self {
        Self {
            store,
            currency: Currency::default(),
        }
    }

    /// Sets the currency the ledger is kept in
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Appends a debit or credit for a client
    ///
    /// # Errors
    ///
    /// `InvalidAmount` when `amount <= 0`.
    #[instrument(skip_all, fields(client_id = %client_id, entry_type = %entry_type, amount = %amount))]
    pub async fn append_entry(
        &self,
        client_id: ClientId,
        entry_type: EntryType,
        amount: Decimal,
        description: impl Into<String> + Send,
        entry_date: NaiveDate,
        policy_id: Option<PolicyId>,
    ) -> Result<LedgerEntry, KhataError> {
        let entry = LedgerEntry::new(NewEntry {
            client_id,
            entry_type,
            amount: Money::new(amount, self.currency),
            description: description.into(),
            entry_date,
            policy_id,
        })?;
        self.post(entry).await
    }

    /// Appends a pre-built entry in the ledger currency
    pub async fn post(&self, entry: LedgerEntry) -> Result<LedgerEntry, KhataError> {
        if entry.amount.currency() != self.currency {
            return Err(KhataError::CurrencyMismatch {
                expected: self.currency,
                found: entry.amount.currency(),
            });
        }
        if !entry.amount.is_positive() {
            return Err(KhataError::InvalidAmount(entry.amount.amount()));
        }

        let offsets = entry.offsets;
        let stored = self.store.append(entry).await.map_err(|e| match (e, offsets) {
            (PortError::Conflict { .. }, Some(target)) => KhataError::AlreadyOffset(target),
            (other, _) => KhataError::Port(other),
        })?;

        info!(entry_id = %stored.id, "Ledger entry posted");
        Ok(stored)
    }

    /// The agent paid the insurer on the client's behalf: the client owes it
    pub async fn front_premium(
        &self,
        client_id: ClientId,
        policy_id: PolicyId,
        amount: Decimal,
        entry_date: NaiveDate,
    ) -> Result<LedgerEntry, KhataError> {
        self.append_entry(
            client_id,
            EntryType::Debit,
            amount,
            format!("Premium paid on client's behalf for policy {}", policy_id),
            entry_date,
            Some(policy_id),
        )
        .await
    }

    /// The client paid the agent
    pub async fn record_collection(
        &self,
        client_id: ClientId,
        amount: Decimal,
        entry_date: NaiveDate,
        policy_id: Option<PolicyId>,
    ) -> Result<LedgerEntry, KhataError> {
        let description = match policy_id {
            Some(policy) => format!("Collection received against policy {}", policy),
            None => "Collection received".to_string(),
        };
        self.append_entry(client_id, EntryType::Credit, amount, description, entry_date, policy_id)
            .await
    }

    /// Appends the opposite entry for a posted one
    ///
    /// The original entry is left untouched.
    #[instrument(skip_all, fields(entry_id = %entry_id))]
    pub async fn offset_entry(
        &self,
        entry_id: LedgerEntryId,
        entry_date: NaiveDate,
        reason: &str,
    ) -> Result<LedgerEntry, KhataError> {
        let original = self.store.get_entry(entry_id).await.map_err(|e| {
            if e.is_not_found() {
                KhataError::EntryNotFound(entry_id.to_string())
            } else {
                KhataError::Port(e)
            }
        })?;
        // an offset is itself never offset; post a fresh entry instead
        if original.offsets.is_some() {
            return Err(KhataError::AlreadyOffset(entry_id));
        }

        self.post(original.offsetting(entry_date, reason)).await
    }

    /// `sum(debits) - sum(credits)` over every entry of the client
    pub async fn balance(&self, client_id: ClientId) -> Result<Money, KhataError> {
        let totals = self.store.totals_for(client_id).await?;
        Ok(Money::new(totals.balance(), self.currency))
    }

    pub async fn ledger(&self, client_id: ClientId) -> Result<ClientLedger, KhataError> {
        let entries = self.store.entries_for(client_id).await?;
        Ok(ClientLedger::new(client_id, self.currency, entries))
    }

    pub async fn statement(&self, client_id: ClientId) -> Result<Statement, KhataError> {
        self.ledger(client_id).await?.statement()
    }

    /// Every client with a positive balance
    pub async fn pending_collections(&self) -> Result<Vec<PendingCollection>, KhataError> {
        let totals = self.store.client_totals().await?;
        Ok(pending_collections(totals, self.currency))
    }
}
