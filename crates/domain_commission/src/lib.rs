//! Commission Domain
//!
//! Resolves the commission rule for a policy, computes the total commission
//! from its premium facts, splits it between agent and sub-agent and tracks
//! receipt from the insurer and payout to the sub-agent.
//!
//! # Flow
//!
//! ```text
//! PolicyTerms ──► RateTable::resolve ──► compute_total_commission
//!                                                 │
//!                                                 ▼
//!        CommissionRecord ◄── split_commission (agent / sub-agent)
//!                │
//!                ├── mark_received            (insurer → agent)
//!                └── mark_paid_to_sub_agent   (agent → sub-agent)
//! ```

pub mod category;
pub mod premium;
pub mod policy;
pub mod rate_table;
pub mod calculator;
pub mod settlement;
pub mod record;
pub mod summary;
pub mod ports;
pub mod adapters;
pub mod service;
pub mod error;

pub use category::PolicyCategory;
pub use premium::{MotorCover, MotorPremium, PolicyPremium, StandardPremium};
pub use policy::{ManualRates, PolicyTerms};
pub use rate_table::{CommissionRule, RateTable, ResolvedTier, RuleTier, TierIssue, TierRate};
pub use calculator::{
    compute_total_commission, requires_rate_table, CommissionComputation, CommissionMethod,
    MotorBreakdown, RateOrigin,
};
pub use settlement::{split_commission, Settlement, SubAgentRateSpec};
pub use record::{CommissionRecord, PayoutState, ReceiptState, TransitionOutcome};
pub use summary::{summarize, summarize_by_agent, CommissionSummary};
pub use ports::{CommissionQuery, CommissionStore, RuleStore, Transition};
pub use service::{CommissionPreview, CommissionService, RecordVerification};
pub use error::CommissionError;
