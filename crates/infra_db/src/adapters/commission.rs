//! PostgreSQL commission stores

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, instrument, warn};

use core_kernel::{
    CommissionId, CommissionRuleId, DomainPort, HealthCheckResult, HealthCheckable, InsurerId,
    PolicyId, PortError,
};
use domain_commission::{
    CommissionQuery, CommissionRecord, CommissionRule, CommissionStore, PolicyCategory, PolicyTerms,
    RuleStore, Transition,
};

use crate::adapters::ping;
use crate::pool::DatabasePool;
use crate::repositories::{CommissionRepository, FlagUpdate, RuleRepository};

/// Commission rules in PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresRuleStore {
    repository: RuleRepository,
    pool: DatabasePool,
}

impl PostgresRuleStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            repository: RuleRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresRuleStore {}

#[async_trait]
impl HealthCheckable for PostgresRuleStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-rule-store").await
    }
}

#[async_trait]
impl RuleStore for PostgresRuleStore {
    async fn save_rule(&self, rule: CommissionRule) -> Result<CommissionRule, PortError> {
        self.repository.save(&rule).await?;
        Ok(rule)
    }

    #[instrument(skip(self))]
    async fn find_rules(
        &self,
        insurer: InsurerId,
        category: PolicyCategory,
        as_of: NaiveDate,
    ) -> Result<Vec<CommissionRule>, PortError> {
        let rules = self.repository.find_in_force(insurer, category, as_of).await?;
        debug!(candidates = rules.len(), "Rules in force loaded");
        Ok(rules)
    }

    async fn all_rules(&self) -> Result<Vec<CommissionRule>, PortError> {
        Ok(self.repository.all().await?)
    }

    async fn set_rule_active(&self, id: CommissionRuleId, active: bool) -> Result<(), PortError> {
        self.repository.set_active(id, active).await.map_err(|e| {
            if e.is_not_found() {
                PortError::not_found("CommissionRule", id)
            } else {
                e.into()
            }
        })
    }
}

/// Policies and commission records in PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresCommissionStore {
    repository: CommissionRepository,
    pool: DatabasePool,
}

impl PostgresCommissionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            repository: CommissionRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresCommissionStore {}

#[async_trait]
impl HealthCheckable for PostgresCommissionStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-commission-store").await
    }
}

fn commission_not_found(id: CommissionId) -> impl FnOnce(crate::DatabaseError) -> PortError {
    move |e| {
        if e.is_not_found() {
            PortError::not_found("CommissionRecord", id)
        } else {
            e.into()
        }
    }
}

#[async_trait]
impl CommissionStore for PostgresCommissionStore {
    async fn insert_policy_with_commission(
        &self,
        terms: &PolicyTerms,
        record: &CommissionRecord,
    ) -> Result<(), PortError> {
        Ok(self.repository.insert_policy_with_commission(terms, record).await?)
    }

    async fn get_policy(&self, id: PolicyId) -> Result<PolicyTerms, PortError> {
        self.repository.get_policy(id).await.map_err(|e| {
            if e.is_not_found() {
                PortError::not_found("Policy", id)
            } else {
                e.into()
            }
        })
    }

    async fn get_commission(&self, id: CommissionId) -> Result<CommissionRecord, PortError> {
        self.repository.get_commission(id).await.map_err(commission_not_found(id))
    }

    async fn find_by_policy(&self, policy_id: PolicyId) -> Result<Option<CommissionRecord>, PortError> {
        Ok(self.repository.find_by_policy(policy_id).await?)
    }

    async fn mark_received(&self, id: CommissionId, at: DateTime<Utc>) -> Result<Transition, PortError> {
        let (record, outcome) = self
            .repository
            .mark_received(id, at)
            .await
            .map_err(commission_not_found(id))?;
        Ok(Transition { record, outcome })
    }

    async fn mark_paid_to_sub_agent(&self, id: CommissionId, at: DateTime<Utc>) -> Result<Transition, PortError> {
        match self
            .repository
            .mark_paid_to_sub_agent(id, at)
            .await
            .map_err(commission_not_found(id))?
        {
            FlagUpdate::Moved(record, outcome) => Ok(Transition { record, outcome }),
            FlagUpdate::NoSubAgent(record) => {
                warn!(commission_id = %record.id, "Payout requested for a commission without a sub-agent");
                Err(PortError::validation_field(
                    format!("commission {} has no sub-agent", record.id),
                    "sub_agent_id",
                ))
            }
        }
    }

    async fn find_commissions(&self, query: CommissionQuery) -> Result<Vec<CommissionRecord>, PortError> {
        Ok(self.repository.find(&query).await?)
    }
}
