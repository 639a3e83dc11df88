//! Commission Domain Ports
//!
//! Storage needs of the commission engine. Two adapters implement them:
//! the in-memory stores in [`crate::adapters`] and the PostgreSQL stores in
//! `infra_db`.
//!
//! # Guarantees every adapter must give
//!
//! - `insert_policy_with_commission` is all-or-nothing: a policy is never
//!   stored without its commission record, and vice versa.
//! - `mark_received` / `mark_paid_to_sub_agent` move their flag at most
//!   once, even under concurrent calls for the same commission. Every
//!   caller gets the record back; only the first sees `Applied`.
//!
//! ```rust,ignore
//! let rules: Arc<dyn RuleStore> = Arc::new(InMemoryRuleStore::new());
//! let commissions: Arc<dyn CommissionStore> = Arc::new(PostgresCommissionStore::new(pool));
//! let service = CommissionService::new(rules, commissions);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use core_kernel::{
    AgentId, CommissionId, CommissionRuleId, DomainPort, HealthCheckable, InsurerId, PolicyId,
    PortError, SubAgentId,
};

use crate::category::PolicyCategory;
use crate::policy::PolicyTerms;
use crate::rate_table::CommissionRule;
use crate::record::{CommissionRecord, TransitionOutcome};

/// Filters for listing commission records
#[derive(Debug, Clone, Default)]
pub struct CommissionQuery {
    pub agent_id: Option<AgentId>,
    pub sub_agent_id: Option<SubAgentId>,
    pub received_from_insurer: Option<bool>,
    pub paid_to_sub_agent: Option<bool>,
    /// Only records with (true) or without (false) a sub-agent
    pub has_sub_agent: Option<bool>,
    pub limit: Option<u32>,
}

impl CommissionQuery {
    /// Records still awaiting money from the insurer
    pub fn pending_receipt() -> Self {
        Self {
            received_from_insurer: Some(false),
            ..Default::default()
        }
    }

    /// Records with a sub-agent share not yet paid out
    pub fn pending_payout() -> Self {
        Self {
            paid_to_sub_agent: Some(false),
            has_sub_agent: Some(true),
            ..Default::default()
        }
    }

    pub fn for_agent(agent_id: AgentId) -> Self {
        Self {
            agent_id: Some(agent_id),
            ..Default::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Applies the filters to one record
    pub fn matches(&self, record: &CommissionRecord) -> bool {
        if let Some(agent) = self.agent_id {
            if record.agent_id != agent {
                return false;
            }
        }
        if let Some(sub) = self.sub_agent_id {
            if record.sub_agent_id != Some(sub) {
                return false;
            }
        }
        if let Some(received) = self.received_from_insurer {
            if record.received_from_insurer != received {
                return false;
            }
        }
        if let Some(paid) = self.paid_to_sub_agent {
            if record.paid_to_sub_agent != paid {
                return false;
            }
        }
        if let Some(has_sub) = self.has_sub_agent {
            if record.has_sub_agent() != has_sub {
                return false;
            }
        }
        true
    }
}

/// A record after a flag transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub record: CommissionRecord,
    pub outcome: TransitionOutcome,
}

/// Commission rule storage
#[async_trait]
pub trait RuleStore: DomainPort + HealthCheckable {
    /// Stores a rule with its tiers, replacing any rule with the same id
    async fn save_rule(&self, rule: CommissionRule) -> Result<CommissionRule, PortError>;

    /// Active rules for the insurer and category in force on `as_of`
    async fn find_rules(
        &self,
        insurer: InsurerId,
        category: PolicyCategory,
        as_of: NaiveDate,
    ) -> Result<Vec<CommissionRule>, PortError>;

    /// Every stored rule, active or not
    async fn all_rules(&self) -> Result<Vec<CommissionRule>, PortError>;

    /// Activates or retires a rule
    async fn set_rule_active(&self, id: CommissionRuleId, active: bool) -> Result<(), PortError>;
}

/// Policy and commission record storage
#[async_trait]
pub trait CommissionStore: DomainPort + HealthCheckable {
    /// Stores a policy and its commission record atomically
    ///
    /// Fails with `PortError::Conflict` if the policy already exists.
    async fn insert_policy_with_commission(
        &self,
        terms: &PolicyTerms,
        record: &CommissionRecord,
    ) -> Result<(), PortError>;

    async fn get_policy(&self, id: PolicyId) -> Result<PolicyTerms, PortError>;

    async fn get_commission(&self, id: CommissionId) -> Result<CommissionRecord, PortError>;

    async fn find_by_policy(&self, policy_id: PolicyId) -> Result<Option<CommissionRecord>, PortError>;

    /// Sets `received_from_insurer` if it is not set yet
    async fn mark_received(&self, id: CommissionId, at: DateTime<Utc>) -> Result<Transition, PortError>;

    /// Sets `paid_to_sub_agent` if it is not set yet
    ///
    /// Fails with `PortError::Validation` when the record has no sub-agent.
    async fn mark_paid_to_sub_agent(&self, id: CommissionId, at: DateTime<Utc>) -> Result<Transition, PortError>;

    async fn find_commissions(&self, query: CommissionQuery) -> Result<Vec<CommissionRecord>, PortError>;
}
