//! In-memory commission stores
//!
//! State lives behind a `tokio::sync::RwLock`. Flag transitions check and
//! set under a single write guard, which gives the same at-most-once
//! behaviour as the conditional UPDATE used by the PostgreSQL adapter.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;

use core_kernel::{
    AdapterHealth, CommissionId, CommissionRuleId, DomainPort, HealthCheckResult, HealthCheckable,
    InsurerId, PolicyId, PortError,
};

use crate::category::PolicyCategory;
use crate::policy::PolicyTerms;
use crate::ports::{CommissionQuery, CommissionStore, RuleStore, Transition};
use crate::rate_table::CommissionRule;
use crate::record::CommissionRecord;

fn healthy(adapter_id: &str) -> HealthCheckResult {
    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status: AdapterHealth::Healthy,
        latency_ms: 0,
        message: None,
        checked_at: Utc::now(),
    }
}

/// Rule store backed by a map
#[derive(Debug, Default, Clone)]
pub struct InMemoryRuleStore {
    rules: Arc<RwLock<HashMap<CommissionRuleId, CommissionRule>>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store
    pub async fn with_rules(rules: Vec<CommissionRule>) -> Self {
        let store = Self::new();
        {
            let mut guard = store.rules.write().await;
            for rule in rules {
                guard.insert(rule.id, rule);
            }
        }
        store
    }
}

impl DomainPort for InMemoryRuleStore {}

#[async_trait]
impl HealthCheckable for InMemoryRuleStore {
    async fn health_check(&self) -> HealthCheckResult {
        healthy("memory-rule-store")
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn save_rule(&self, rule: CommissionRule) -> Result<CommissionRule, PortError> {
        self.rules.write().await.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn find_rules(
        &self,
        insurer: InsurerId,
        category: PolicyCategory,
        as_of: NaiveDate,
    ) -> Result<Vec<CommissionRule>, PortError> {
        Ok(self
            .rules
            .read()
            .await
            .values()
            .filter(|r| r.applies_to(insurer, category, as_of))
            .cloned()
            .collect())
    }

    async fn all_rules(&self) -> Result<Vec<CommissionRule>, PortError> {
        let mut rules: Vec<CommissionRule> = self.rules.read().await.values().cloned().collect();
        rules.sort_by_key(|r| (r.insurer_id, r.category, r.period.from, r.id));
        Ok(rules)
    }

    async fn set_rule_active(&self, id: CommissionRuleId, active: bool) -> Result<(), PortError> {
        let mut rules = self.rules.write().await;
        let rule = rules
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("CommissionRule", id))?;
        rule.is_active = active;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CommissionState {
    policies: HashMap<PolicyId, PolicyTerms>,
    records: HashMap<CommissionId, CommissionRecord>,
    by_policy: HashMap<PolicyId, CommissionId>,
}

/// Policy and commission store backed by maps under one lock
#[derive(Debug, Default, Clone)]
pub struct InMemoryCommissionStore {
    state: Arc<RwLock<CommissionState>>,
}

impl InMemoryCommissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored policies
    pub async fn policy_count(&self) -> usize {
        self.state.read().await.policies.len()
    }

    /// Number of stored commission records
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }
}

impl DomainPort for InMemoryCommissionStore {}

#[async_trait]
impl HealthCheckable for InMemoryCommissionStore {
    async fn health_check(&self) -> HealthCheckResult {
        healthy("memory-commission-store")
    }
}

#[async_trait]
impl CommissionStore for InMemoryCommissionStore {
    async fn insert_policy_with_commission(
        &self,
        terms: &PolicyTerms,
        record: &CommissionRecord,
    ) -> Result<(), PortError> {
        if record.policy_id != terms.policy_id {
            return Err(PortError::validation_field(
                "commission record belongs to a different policy",
                "policy_id",
            ));
        }

        let mut state = self.state.write().await;
        if state.policies.contains_key(&terms.policy_id) {
            return Err(PortError::conflict(format!("policy {} already exists", terms.policy_id)));
        }
        if state.records.contains_key(&record.id) {
            return Err(PortError::conflict(format!("commission {} already exists", record.id)));
        }

        state.policies.insert(terms.policy_id, terms.clone());
        state.records.insert(record.id, record.clone());
        state.by_policy.insert(terms.policy_id, record.id);
        Ok(())
    }

    async fn get_policy(&self, id: PolicyId) -> Result<PolicyTerms, PortError> {
        self.state
            .read()
            .await
            .policies
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Policy", id))
    }

    async fn get_commission(&self, id: CommissionId) -> Result<CommissionRecord, PortError> {
        self.state
            .read()
            .await
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("CommissionRecord", id))
    }

    async fn find_by_policy(&self, policy_id: PolicyId) -> Result<Option<CommissionRecord>, PortError> {
        let state = self.state.read().await;
        Ok(state
            .by_policy
            .get(&policy_id)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn mark_received(&self, id: CommissionId, at: DateTime<Utc>) -> Result<Transition, PortError> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("CommissionRecord", id))?;

        let outcome = record.mark_received(at);
        Ok(Transition {
            record: record.clone(),
            outcome,
        })
    }

    async fn mark_paid_to_sub_agent(&self, id: CommissionId, at: DateTime<Utc>) -> Result<Transition, PortError> {
        let mut state = self.state.write().await;
        let record = state
            .records
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("CommissionRecord", id))?;

        let outcome = record
            .mark_paid_to_sub_agent(at)
            .map_err(|e| PortError::validation_field(e.to_string(), "sub_agent_id"))?;
        Ok(Transition {
            record: record.clone(),
            outcome,
        })
    }

    async fn find_commissions(&self, query: CommissionQuery) -> Result<Vec<CommissionRecord>, PortError> {
        let state = self.state.read().await;
        let mut records: Vec<CommissionRecord> = state
            .records
            .values()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        records.sort_by_key(|r| (r.created_at, r.id));

        if let Some(limit) = query.limit {
            records.truncate(limit as usize);
        }
        Ok(records)
    }
}
