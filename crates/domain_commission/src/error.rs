//! Commission domain errors
//!
//! Resolution and computation failures are returned to the caller as-is;
//! nothing here is ever defaulted to a zero commission.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{CommissionId, CommissionRuleId, InsurerId, MoneyError, PolicyId, PortError};

use crate::category::PolicyCategory;

/// Errors that can occur in the commission domain
#[derive(Debug, Error)]
pub enum CommissionError {
    /// No active rule for the insurer/category on the as-of date
    #[error("No active commission rule for insurer {insurer}, category {category} on {as_of}")]
    RuleNotFound {
        insurer: InsurerId,
        category: PolicyCategory,
        as_of: NaiveDate,
    },

    /// The premium falls in a gap between tiers
    #[error("No tier of rule {rule_id} covers premium {amount}")]
    NoTierForAmount {
        rule_id: CommissionRuleId,
        amount: Decimal,
    },

    /// Sub-agent payout attempted on a commission without a sub-agent
    #[error("Commission {0} has no sub-agent assigned")]
    NoSubAgentAssigned(CommissionId),

    /// Neither an override, a manual rate nor a resolved tier was available
    #[error("No commission rate available for policy {0}")]
    MissingRate(PolicyId),

    /// Premium facts are inconsistent or negative
    #[error("Invalid premium: {0}")]
    InvalidPremium(String),

    /// Unknown policy category code
    #[error("Unknown policy category: {0}")]
    UnknownCategory(String),

    /// Commission record not found
    #[error("Commission not found: {0}")]
    CommissionNotFound(String),

    /// Policy not found
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    /// Money arithmetic failed (currency mismatch)
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// The backing store failed
    #[error("Store error: {0}")]
    Port(#[from] PortError),
}

impl CommissionError {
    /// Creates an invalid premium error
    pub fn invalid_premium(message: impl Into<String>) -> Self {
        CommissionError::InvalidPremium(message.into())
    }

    /// True for the two resolution failures that must stop policy creation
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            CommissionError::RuleNotFound { .. } | CommissionError::NoTierForAmount { .. }
        )
    }
}
