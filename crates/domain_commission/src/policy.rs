//! Policy terms handed over by policy intake
//!
//! `PolicyTerms` is everything the engine needs to know about a policy:
//! who sold it, who insures it, the premium facts and any rates or amounts
//! keyed manually by the operator.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{AgentId, ClientId, Currency, InsurerId, PolicyId, Rate, SubAgentId};

use crate::category::PolicyCategory;
use crate::error::CommissionError;
use crate::premium::PolicyPremium;
use crate::settlement::SubAgentRateSpec;

/// Rates keyed by the operator on the policy form
///
/// A rate that is absent or zero counts as not supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualRates {
    /// Flat rate applied to the rating base
    pub commission_rate: Option<Rate>,
    /// Motor own-damage rate
    pub od_rate: Option<Rate>,
    /// Motor third-party rate
    pub tp_rate: Option<Rate>,
    /// Motor net rate, supersedes the OD/TP rates
    pub net_rate: Option<Rate>,
}

fn positive(rate: Option<Rate>) -> Option<Rate> {
    rate.filter(Rate::is_positive)
}

impl ManualRates {
    pub fn flat(rate: Rate) -> Self {
        Self {
            commission_rate: Some(rate),
            ..Self::default()
        }
    }

    pub fn motor(od_rate: Rate, tp_rate: Rate) -> Self {
        Self {
            od_rate: Some(od_rate),
            tp_rate: Some(tp_rate),
            ..Self::default()
        }
    }

    pub fn motor_net(net_rate: Rate) -> Self {
        Self {
            net_rate: Some(net_rate),
            ..Self::default()
        }
    }

    /// Flat rate, if positive
    pub fn flat_rate(&self) -> Option<Rate> {
        positive(self.commission_rate)
    }

    /// Net rate, if positive
    pub fn net(&self) -> Option<Rate> {
        positive(self.net_rate)
    }

    /// OD rate, if positive
    pub fn od(&self) -> Option<Rate> {
        positive(self.od_rate)
    }

    /// TP rate, if positive
    pub fn tp(&self) -> Option<Rate> {
        positive(self.tp_rate)
    }

    /// True when any motor component rate is keyed
    pub fn has_motor_rates(&self) -> bool {
        self.net().is_some() || self.od().is_some() || self.tp().is_some()
    }

    /// True when nothing usable was keyed
    pub fn is_empty(&self) -> bool {
        self.flat_rate().is_none() && !self.has_motor_rates()
    }
}

/// The policy as seen by the commission engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTerms {
    pub policy_id: PolicyId,
    pub client_id: ClientId,
    pub insurer_id: InsurerId,
    pub category: PolicyCategory,
    /// Date the rule table is resolved on
    pub effective_date: NaiveDate,
    pub currency: Currency,
    pub premium: PolicyPremium,
    pub agent_id: AgentId,
    pub sub_agent_id: Option<SubAgentId>,
    /// Per-policy sub-agent rates, used only for this policy's settlement
    pub sub_agent_rates: SubAgentRateSpec,
    pub manual_rates: ManualRates,
    /// Manually keyed broker payout
    pub broker_override: Option<Decimal>,
}

impl PolicyTerms {
    /// Creates terms with no sub-agent, no manual rates and no override
    pub fn new(
        client_id: ClientId,
        insurer_id: InsurerId,
        agent_id: AgentId,
        category: PolicyCategory,
        effective_date: NaiveDate,
        premium: impl Into<PolicyPremium>,
    ) -> Self {
        Self {
            policy_id: PolicyId::new_v7(),
            client_id,
            insurer_id,
            category,
            effective_date,
            currency: Currency::default(),
            premium: premium.into(),
            agent_id,
            sub_agent_id: None,
            sub_agent_rates: SubAgentRateSpec::default(),
            manual_rates: ManualRates::default(),
            broker_override: None,
        }
    }

    pub fn with_policy_id(mut self, policy_id: PolicyId) -> Self {
        self.policy_id = policy_id;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Assigns a sub-agent together with the per-policy rates they earn
    pub fn with_sub_agent(mut self, sub_agent_id: SubAgentId, rates: SubAgentRateSpec) -> Self {
        self.sub_agent_id = Some(sub_agent_id);
        self.sub_agent_rates = rates;
        self
    }

    pub fn with_manual_rates(mut self, rates: ManualRates) -> Self {
        self.manual_rates = rates;
        self
    }

    pub fn with_broker_override(mut self, amount: Decimal) -> Self {
        self.broker_override = Some(amount);
        self
    }

    /// Broker override when present and positive
    pub fn effective_broker_override(&self) -> Option<Decimal> {
        self.broker_override.filter(|a| *a > Decimal::ZERO)
    }

    /// Checks premium facts against the category
    ///
    /// # Errors
    ///
    /// Returns `InvalidPremium` when the premium shape does not match the
    /// category, or when the premium facts themselves are invalid.
    pub fn validate(&self) -> Result<(), CommissionError> {
        if self.category.is_motor() != self.premium.is_motor() {
            return Err(CommissionError::invalid_premium(format!(
                "{} policy cannot carry a {} premium",
                self.category,
                if self.premium.is_motor() { "motor" } else { "standard" }
            )));
        }
        if let Some(amount) = self.broker_override {
            if amount < Decimal::ZERO {
                return Err(CommissionError::invalid_premium(format!(
                    "broker override must not be negative, got {}",
                    amount
                )));
            }
        }
        self.premium.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::premium::{MotorCover, MotorPremium, StandardPremium};
    use rust_decimal_macros::dec;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_zero_rates_count_as_absent() {
        let rates = ManualRates {
            commission_rate: Some(Rate::zero()),
            od_rate: Some(Rate::zero()),
            tp_rate: None,
            net_rate: Some(Rate::zero()),
        };
        assert!(rates.is_empty());
        assert!(!rates.has_motor_rates());
    }

    #[test]
    fn test_category_and_premium_shape_must_agree() {
        let terms = PolicyTerms::new(
            ClientId::new(),
            InsurerId::new(),
            AgentId::new(),
            PolicyCategory::Health,
            date(),
            MotorPremium::new(MotorCover::ThirdPartyOnly, dec!(2360)).with_tp(dec!(2000)),
        );
        assert!(matches!(terms.validate(), Err(CommissionError::InvalidPremium(_))));

        let terms = PolicyTerms::new(
            ClientId::new(),
            InsurerId::new(),
            AgentId::new(),
            PolicyCategory::Health,
            date(),
            StandardPremium::new(dec!(59000)).with_net(dec!(50000)),
        );
        assert!(terms.validate().is_ok());
    }

    #[test]
    fn test_zero_override_is_ignored() {
        let terms = PolicyTerms::new(
            ClientId::new(),
            InsurerId::new(),
            AgentId::new(),
            PolicyCategory::Life,
            date(),
            StandardPremium::new(dec!(1000)),
        )
        .with_broker_override(dec!(0));

        assert_eq!(terms.effective_broker_override(), None);
    }
}
