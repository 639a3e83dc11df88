//! PostgreSQL enum types and their domain counterparts

use rust_decimal::Decimal;

use core_kernel::{Currency, Rate};
use domain_commission::{MotorCover, PolicyCategory};
use domain_khata::EntryType;

use crate::error::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "policy_category", rename_all = "snake_case")]
pub enum DbPolicyCategory {
    Health,
    Life,
    Motor,
    Term,
    Travel,
    Property,
}

impl From<PolicyCategory> for DbPolicyCategory {
    fn from(category: PolicyCategory) -> Self {
        match category {
            PolicyCategory::Health => DbPolicyCategory::Health,
            PolicyCategory::Life => DbPolicyCategory::Life,
            PolicyCategory::Motor => DbPolicyCategory::Motor,
            PolicyCategory::Term => DbPolicyCategory::Term,
            PolicyCategory::Travel => DbPolicyCategory::Travel,
            PolicyCategory::Property => DbPolicyCategory::Property,
        }
    }
}

impl From<DbPolicyCategory> for PolicyCategory {
    fn from(category: DbPolicyCategory) -> Self {
        match category {
            DbPolicyCategory::Health => PolicyCategory::Health,
            DbPolicyCategory::Life => PolicyCategory::Life,
            DbPolicyCategory::Motor => PolicyCategory::Motor,
            DbPolicyCategory::Term => PolicyCategory::Term,
            DbPolicyCategory::Travel => PolicyCategory::Travel,
            DbPolicyCategory::Property => PolicyCategory::Property,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "premium_kind", rename_all = "snake_case")]
pub enum DbPremiumKind {
    Motor,
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "motor_cover", rename_all = "snake_case")]
pub enum DbMotorCover {
    Comprehensive,
    OdOnly,
    TpOnly,
}

impl From<MotorCover> for DbMotorCover {
    fn from(cover: MotorCover) -> Self {
        match cover {
            MotorCover::Comprehensive => DbMotorCover::Comprehensive,
            MotorCover::OwnDamageOnly => DbMotorCover::OdOnly,
            MotorCover::ThirdPartyOnly => DbMotorCover::TpOnly,
        }
    }
}

impl From<DbMotorCover> for MotorCover {
    fn from(cover: DbMotorCover) -> Self {
        match cover {
            DbMotorCover::Comprehensive => MotorCover::Comprehensive,
            DbMotorCover::OdOnly => MotorCover::OwnDamageOnly,
            DbMotorCover::TpOnly => MotorCover::ThirdPartyOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "rate_origin", rename_all = "snake_case")]
pub enum DbRateOrigin {
    BrokerOverride,
    Manual,
    RateTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "ledger_entry_type", rename_all = "UPPERCASE")]
pub enum DbEntryType {
    Debit,
    Credit,
}

impl From<EntryType> for DbEntryType {
    fn from(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Debit => DbEntryType::Debit,
            EntryType::Credit => DbEntryType::Credit,
        }
    }
}

impl From<DbEntryType> for EntryType {
    fn from(entry_type: DbEntryType) -> Self {
        match entry_type {
            DbEntryType::Debit => EntryType::Debit,
            DbEntryType::Credit => EntryType::Credit,
        }
    }
}

/// Rates are stored as percentages
pub(crate) fn percent(rate: Option<Rate>) -> Option<Decimal> {
    rate.map(|r| r.as_percentage())
}

pub(crate) fn rate(percent: Option<Decimal>) -> Option<Rate> {
    percent.map(Rate::from_percentage)
}

pub(crate) fn currency(code: &str) -> Result<Currency, DatabaseError> {
    code.parse::<Currency>()
        .map_err(|e| DatabaseError::corrupt(format!("currency '{}': {}", code, e)))
}
