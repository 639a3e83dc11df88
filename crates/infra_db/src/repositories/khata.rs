//! Ledger entry repository
//!
//! `ledger_entries` is insert-only. Balances are computed with `SUM` on read
//! and never stored.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{ClientId, LedgerEntryId, Money, PolicyId};
use domain_khata::{ClientTotals, LedgerEntry};

use crate::error::DatabaseError;
use crate::pool::DatabasePool;
use crate::repositories::types::{currency, DbEntryType};

#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntryRow {
    pub entry_id: Uuid,
    pub client_id: Uuid,
    pub entry_type: DbEntryType,
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub entry_date: NaiveDate,
    pub policy_id: Option<Uuid>,
    pub offsets_entry_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntryRow {
    fn into_entry(self) -> Result<LedgerEntry, DatabaseError> {
        Ok(LedgerEntry {
            id: LedgerEntryId::from_uuid(self.entry_id),
            client_id: ClientId::from_uuid(self.client_id),
            entry_type: self.entry_type.into(),
            amount: Money::new(self.amount, currency(&self.currency)?),
            description: self.description,
            entry_date: self.entry_date,
            policy_id: self.policy_id.map(PolicyId::from_uuid),
            offsets: self.offsets_entry_id.map(LedgerEntryId::from_uuid),
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClientTotalsRow {
    pub client_id: Uuid,
    pub debits: Decimal,
    pub credits: Decimal,
    pub entry_count: i64,
}

impl ClientTotalsRow {
    fn into_totals(self) -> Result<ClientTotals, DatabaseError> {
        Ok(ClientTotals {
            client_id: ClientId::from_uuid(self.client_id),
            debits: self.debits,
            credits: self.credits,
            entry_count: u64::try_from(self.entry_count)
                .map_err(|_| DatabaseError::corrupt(format!("negative entry count {}", self.entry_count)))?,
        })
    }
}

const ENTRY_COLUMNS: &str = "entry_id, client_id, entry_type, amount, currency, description, \
     entry_date, policy_id, offsets_entry_id, created_at";

const TOTALS_SELECT: &str = r#"
    SELECT client_id,
           COALESCE(SUM(amount) FILTER (WHERE entry_type = 'DEBIT'), 0) AS debits,
           COALESCE(SUM(amount) FILTER (WHERE entry_type = 'CREDIT'), 0) AS credits,
           COUNT(*) AS entry_count
    FROM ledger_entries
"#;

#[derive(Debug, Clone)]
pub struct KhataRepository {
    pool: DatabasePool,
}

impl KhataRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Appends one entry
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` when the entry offsets one that is already offset.
    #[instrument(skip_all, fields(entry_id = %entry.id, client_id = %entry.client_id))]
    pub async fn insert(&self, entry: &LedgerEntry) -> Result<(), DatabaseError> {
        sqlx::query(&format!(
            "INSERT INTO ledger_entries ({ENTRY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(entry.id.as_uuid())
        .bind(entry.client_id.as_uuid())
        .bind(DbEntryType::from(entry.entry_type))
        .bind(entry.amount.amount())
        .bind(entry.amount.currency().code())
        .bind(&entry.description)
        .bind(entry.entry_date)
        .bind(entry.policy_id.map(Uuid::from))
        .bind(entry.offsets.map(Uuid::from))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        debug!("Ledger entry inserted");
        Ok(())
    }

    pub async fn get(&self, id: LedgerEntryId) -> Result<LedgerEntry, DatabaseError> {
        sqlx::query_as::<_, LedgerEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM ledger_entries WHERE entry_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("LedgerEntry", id))?
        .into_entry()
    }

    /// Entries of one client in posting order
    pub async fn for_client(&self, client_id: ClientId) -> Result<Vec<LedgerEntry>, DatabaseError> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM ledger_entries
            WHERE client_id = $1
            ORDER BY entry_date, created_at, entry_id
            "#
        ))
        .bind(client_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LedgerEntryRow::into_entry).collect()
    }

    pub async fn totals_for(&self, client_id: ClientId) -> Result<ClientTotals, DatabaseError> {
        let row = sqlx::query_as::<_, ClientTotalsRow>(&format!(
            "{TOTALS_SELECT} WHERE client_id = $1 GROUP BY client_id"
        ))
        .bind(client_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.into_totals(),
            None => Ok(ClientTotals::empty(client_id)),
        }
    }

    pub async fn all_totals(&self) -> Result<Vec<ClientTotals>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClientTotalsRow>(&format!("{TOTALS_SELECT} GROUP BY client_id"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ClientTotalsRow::into_totals).collect()
    }
}
