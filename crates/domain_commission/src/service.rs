//! Commission service
//!
//! Orchestrates rule resolution, calculation, settlement and the record
//! lifecycle over the storage ports.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::{AgentId, CommissionId, Currency, InsurerId, Money, MoneyError, PortError};

use crate::calculator::{compute_total_commission, requires_rate_table, CommissionComputation, RateOrigin};
use crate::category::PolicyCategory;
use crate::error::CommissionError;
use crate::policy::PolicyTerms;
use crate::ports::{CommissionQuery, CommissionStore, RuleStore, Transition};
use crate::rate_table::{CommissionRule, RateTable, ResolvedTier, TierIssue, TierRate};
use crate::record::CommissionRecord;
use crate::settlement::{split_commission, Settlement};
use crate::summary::{summarize, summarize_by_agent, CommissionSummary};

/// Everything the payout form shows before submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionPreview {
    pub computation: CommissionComputation,
    pub settlement: Settlement,
    /// The tier used, when the rate table was consulted
    pub resolved: Option<ResolvedTier>,
}

impl CommissionPreview {
    pub fn total(&self) -> Money {
        self.computation.total
    }
}

/// Stored total against a fresh recomputation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordVerification {
    pub commission_id: CommissionId,
    pub stored_total: Money,
    pub recomputed_total: Money,
}

impl RecordVerification {
    pub fn matches(&self) -> bool {
        self.stored_total == self.recomputed_total
    }

    pub fn drift(&self) -> Decimal {
        self.recomputed_total.amount() - self.stored_total.amount()
    }
}

/// Application service for commissions
pub struct CommissionService {
    rules: Arc<dyn RuleStore>,
    commissions: Arc<dyn CommissionStore>,
    currency: Currency,
}

impl CommissionService {
    pub fn new(rules: Arc<dyn RuleStore>, commissions: Arc<dyn CommissionStore>) -> Self {
        Self {
            rules,
            commissions,
            currency: Currency::default(),
        }
    }

    /// Sets the reporting currency used by summaries
    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Resolves the rule tier for a premium amount
    ///
    /// # Errors
    ///
    /// `RuleNotFound` or `NoTierForAmount`; neither is ever turned into a
    /// zero rate.
    #[instrument(skip_all, fields(insurer = %insurer, category = %category, as_of = %as_of, amount = %amount))]
    pub async fn resolve_rule(
        &self,
        insurer: InsurerId,
        category: PolicyCategory,
        as_of: NaiveDate,
        amount: Decimal,
    ) -> Result<ResolvedTier, CommissionError> {
        let candidates = self.rules.find_rules(insurer, category, as_of).await?;
        let resolved = RateTable::new(candidates).resolve(insurer, category, as_of, amount)?;
        debug!(rule_id = %resolved.rule_id, rate = %resolved.tier.rate, "Resolved commission tier");
        Ok(resolved)
    }

    /// Computes and splits a commission without touching storage
    pub fn evaluate(&self, terms: &PolicyTerms, tier: Option<TierRate>) -> Result<(CommissionComputation, Settlement), CommissionError> {
        terms.validate()?;
        let computation = compute_total_commission(terms, tier)?;
        let settlement = split_commission(computation.total, terms)?;
        Ok((computation, settlement))
    }

    /// Full computation for display, resolving a rule only when needed
    #[instrument(skip(self, terms), fields(policy_id = %terms.policy_id))]
    pub async fn preview(&self, terms: &PolicyTerms) -> Result<CommissionPreview, CommissionError> {
        terms.validate()?;

        let resolved = if requires_rate_table(terms) {
            Some(
                self.resolve_rule(
                    terms.insurer_id,
                    terms.category,
                    terms.effective_date,
                    terms.premium.rating_base(),
                )
                .await?,
            )
        } else {
            None
        };

        let (computation, settlement) = self.evaluate(terms, resolved.map(|r| r.tier_rate()))?;
        Ok(CommissionPreview {
            computation,
            settlement,
            resolved,
        })
    }

    /// Creates the commission record for a new policy
    ///
    /// The policy and its record are stored together or not at all. A
    /// resolution failure stops creation; no record with a zero commission
    /// is ever written. Terms must be in the service currency so stored
    /// records can always be summarised together.
    #[instrument(skip(self, terms), fields(policy_id = %terms.policy_id, insurer = %terms.insurer_id))]
    pub async fn create_policy_commission(&self, terms: &PolicyTerms) -> Result<CommissionRecord, CommissionError> {
        if terms.currency != self.currency {
            warn!(currency = %terms.currency, expected = %self.currency, "Policy currency differs from the book");
            return Err(MoneyError::CurrencyMismatch(self.currency.to_string(), terms.currency.to_string()).into());
        }

        let preview = match self.preview(terms).await {
            Ok(preview) => preview,
            Err(e) => {
                if e.is_resolution_failure() {
                    warn!(error = %e, "Commission rule resolution failed, policy not created");
                }
                return Err(e);
            }
        };

        let record = CommissionRecord::open(terms, &preview.computation, &preview.settlement);
        self.commissions.insert_policy_with_commission(terms, &record).await?;

        info!(
            commission_id = %record.id,
            total = %record.total_commission.amount(),
            agent = %record.agent_commission.amount(),
            sub_agent = ?record.sub_agent_commission.map(|m| m.amount()),
            "Commission record created"
        );
        Ok(record)
    }

    pub async fn get_commission(&self, id: CommissionId) -> Result<CommissionRecord, CommissionError> {
        self.commissions
            .get_commission(id)
            .await
            .map_err(|e| not_found_as(e, || CommissionError::CommissionNotFound(id.to_string())))
    }

    /// Marks a commission received from the insurer
    ///
    /// Repeating the call is a successful no-op reported as
    /// `AlreadyProcessed`; the first date is kept.
    #[instrument(skip(self), fields(commission_id = %id))]
    pub async fn mark_received(&self, id: CommissionId, date: Option<DateTime<Utc>>) -> Result<Transition, CommissionError> {
        let transition = self
            .commissions
            .mark_received(id, date.unwrap_or_else(Utc::now))
            .await
            .map_err(|e| not_found_as(e, || CommissionError::CommissionNotFound(id.to_string())))?;

        info!(outcome = ?transition.outcome, "Commission receipt recorded");
        Ok(transition)
    }

    /// Marks the sub-agent share paid out
    ///
    /// # Errors
    ///
    /// `NoSubAgentAssigned` when the policy has no sub-agent.
    #[instrument(skip(self), fields(commission_id = %id))]
    pub async fn mark_paid_to_sub_agent(
        &self,
        id: CommissionId,
        date: Option<DateTime<Utc>>,
    ) -> Result<Transition, CommissionError> {
        let record = self.get_commission(id).await?;
        if !record.has_sub_agent() {
            return Err(CommissionError::NoSubAgentAssigned(id));
        }

        let transition = self
            .commissions
            .mark_paid_to_sub_agent(id, date.unwrap_or_else(Utc::now))
            .await
            .map_err(|e| match e {
                PortError::Validation { .. } => CommissionError::NoSubAgentAssigned(id),
                other => not_found_as(other, || CommissionError::CommissionNotFound(id.to_string())),
            })?;

        info!(outcome = ?transition.outcome, "Sub-agent payout recorded");
        Ok(transition)
    }

    /// Recomputes a stored record from its stored inputs
    #[instrument(skip(self), fields(commission_id = %id))]
    pub async fn verify_record(&self, id: CommissionId) -> Result<RecordVerification, CommissionError> {
        let record = self.get_commission(id).await?;
        let terms = self
            .commissions
            .get_policy(record.policy_id)
            .await
            .map_err(|e| not_found_as(e, || CommissionError::PolicyNotFound(record.policy_id.to_string())))?;

        let tier = match record.origin {
            RateOrigin::RateTable { rule_id, rate } => Some(TierRate { rule_id, rate }),
            RateOrigin::BrokerOverride | RateOrigin::Manual => None,
        };
        let recomputed = compute_total_commission(&terms, tier)?;

        let verification = RecordVerification {
            commission_id: id,
            stored_total: record.total_commission,
            recomputed_total: recomputed.total,
        };
        if !verification.matches() {
            warn!(drift = %verification.drift(), "Stored commission differs from recomputation");
        }
        Ok(verification)
    }

    pub async fn find_commissions(&self, query: CommissionQuery) -> Result<Vec<CommissionRecord>, CommissionError> {
        Ok(self.commissions.find_commissions(query).await?)
    }

    /// Records the insurer has not paid yet
    pub async fn pending_receipts(&self) -> Result<Vec<CommissionRecord>, CommissionError> {
        self.find_commissions(CommissionQuery::pending_receipt()).await
    }

    /// Records with an unpaid sub-agent share
    pub async fn pending_sub_agent_payouts(&self) -> Result<Vec<CommissionRecord>, CommissionError> {
        self.find_commissions(CommissionQuery::pending_payout()).await
    }

    pub async fn summary_for_agent(&self, agent_id: AgentId) -> Result<CommissionSummary, CommissionError> {
        let records = self.find_commissions(CommissionQuery::for_agent(agent_id)).await?;
        summarize(self.currency, &records)
    }

    pub async fn summary_by_agent(&self) -> Result<BTreeMap<AgentId, CommissionSummary>, CommissionError> {
        let records = self.find_commissions(CommissionQuery::default()).await?;
        summarize_by_agent(self.currency, &records)
    }

    /// Stores a rule; irregular tiers are logged, not refused
    #[instrument(skip(self, rule), fields(rule_id = %rule.id, insurer = %rule.insurer_id, category = %rule.category))]
    pub async fn save_rule(&self, rule: CommissionRule) -> Result<CommissionRule, CommissionError> {
        let issues = rule.lint();
        if !issues.is_empty() {
            warn!(count = issues.len(), "Commission rule has irregular tiers");
        }
        let saved = self.rules.save_rule(rule).await?;
        info!(tiers = saved.tiers().len(), "Commission rule saved");
        Ok(saved)
    }

    /// Reports tier gaps and overlaps across every stored rule
    pub async fn lint_rules(&self) -> Result<Vec<TierIssue>, CommissionError> {
        let rules = self.rules.all_rules().await?;
        let issues = RateTable::new(rules).lint();
        if !issues.is_empty() {
            warn!(count = issues.len(), "Rate table has irregular tiers");
        }
        Ok(issues)
    }
}

fn not_found_as(error: PortError, not_found: impl FnOnce() -> CommissionError) -> CommissionError {
    if error.is_not_found() {
        not_found()
    } else {
        CommissionError::Port(error)
    }
}
