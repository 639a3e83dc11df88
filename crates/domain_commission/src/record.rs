//! Commission record and its two one-way flags
//!
//! Receipt from the insurer and payout to the sub-agent run on unrelated
//! schedules, so they are independent booleans rather than one combined
//! state. Each flag only ever moves from false to true; repeating a
//! transition is a successful no-op that keeps the first timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AgentId, CommissionId, Money, PolicyId, SubAgentId};

use crate::calculator::{CommissionComputation, RateOrigin};
use crate::error::CommissionError;
use crate::policy::PolicyTerms;
use crate::settlement::Settlement;

/// Result of a state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// This call moved the flag
    Applied,
    /// The flag was already set, nothing changed
    AlreadyProcessed,
}

impl TransitionOutcome {
    pub fn was_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceiptState {
    PendingReceipt,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutState {
    PendingPayout,
    Paid,
}

/// One per policy, created with the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub id: CommissionId,
    pub policy_id: PolicyId,
    pub agent_id: AgentId,
    pub sub_agent_id: Option<SubAgentId>,
    pub total_commission: Money,
    pub agent_commission: Money,
    /// None when the policy has no sub-agent
    pub sub_agent_commission: Option<Money>,
    pub broker_override: Option<Decimal>,
    /// Rate source, kept so the total can be recomputed later
    pub origin: RateOrigin,
    pub received_from_insurer: bool,
    pub received_at: Option<DateTime<Utc>>,
    pub paid_to_sub_agent: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CommissionRecord {
    /// Builds the initial record for a policy, with both flags pending
    pub fn open(terms: &PolicyTerms, computation: &CommissionComputation, settlement: &Settlement) -> Self {
        Self {
            id: CommissionId::new_v7(),
            policy_id: terms.policy_id,
            agent_id: terms.agent_id,
            sub_agent_id: terms.sub_agent_id,
            total_commission: computation.total,
            agent_commission: settlement.agent_amount,
            sub_agent_commission: settlement.sub_agent_amount,
            broker_override: terms.effective_broker_override(),
            origin: computation.origin,
            received_from_insurer: false,
            received_at: None,
            paid_to_sub_agent: false,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn receipt_state(&self) -> ReceiptState {
        if self.received_from_insurer {
            ReceiptState::Received
        } else {
            ReceiptState::PendingReceipt
        }
    }

    pub fn payout_state(&self) -> PayoutState {
        if self.paid_to_sub_agent {
            PayoutState::Paid
        } else {
            PayoutState::PendingPayout
        }
    }

    pub fn has_sub_agent(&self) -> bool {
        self.sub_agent_id.is_some()
    }

    /// Marks the commission received from the insurer
    pub fn mark_received(&mut self, at: DateTime<Utc>) -> TransitionOutcome {
        if self.received_from_insurer {
            return TransitionOutcome::AlreadyProcessed;
        }
        self.received_from_insurer = true;
        self.received_at = Some(at);
        TransitionOutcome::Applied
    }

    /// Marks the sub-agent share paid
    ///
    /// # Errors
    ///
    /// `NoSubAgentAssigned` when the policy has no sub-agent, whatever the
    /// flag's current value.
    pub fn mark_paid_to_sub_agent(&mut self, at: DateTime<Utc>) -> Result<TransitionOutcome, CommissionError> {
        if !self.has_sub_agent() {
            return Err(CommissionError::NoSubAgentAssigned(self.id));
        }
        if self.paid_to_sub_agent {
            return Ok(TransitionOutcome::AlreadyProcessed);
        }
        self.paid_to_sub_agent = true;
        self.paid_at = Some(at);
        Ok(TransitionOutcome::Applied)
    }
}
