//! Settlement splitter
//!
//! Apportions a total commission between the agent and an optional
//! sub-agent. The sub-agent share is computed on its own from the rates
//! keyed on the policy, not as a fraction of the total. The sub-agent's
//! stored default percentage is not consulted: with no per-policy rates
//! the agent keeps everything.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use core_kernel::{round_half_up, Money, MoneyError, Rate};

use crate::calculator::{motor_components, ComponentRates};
use crate::error::CommissionError;
use crate::policy::PolicyTerms;
use crate::premium::PolicyPremium;

/// Sub-agent rates keyed on one policy
///
/// Zero rates count as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAgentRateSpec {
    pub od_rate: Option<Rate>,
    pub tp_rate: Option<Rate>,
    pub net_rate: Option<Rate>,
}

impl SubAgentRateSpec {
    pub fn components(od_rate: Rate, tp_rate: Rate) -> Self {
        Self {
            od_rate: Some(od_rate),
            tp_rate: Some(tp_rate),
            net_rate: None,
        }
    }

    pub fn net(net_rate: Rate) -> Self {
        Self {
            net_rate: Some(net_rate),
            ..Self::default()
        }
    }

    /// True when no positive rate is keyed
    pub fn is_empty(&self) -> bool {
        ![self.od_rate, self.tp_rate, self.net_rate]
            .iter()
            .flatten()
            .any(Rate::is_positive)
    }

    fn positive(rate: Option<Rate>) -> Option<Rate> {
        rate.filter(Rate::is_positive)
    }

    /// Unrounded sub-agent share of the premium
    ///
    /// Motor: net premium at the net rate when both are positive, otherwise
    /// OD and TP at their rates. Other lines only have a net component, which
    /// is the rating base (net premium, or gross when net is absent).
    pub fn share_of(&self, premium: &PolicyPremium) -> Result<Decimal, MoneyError> {
        let rates = ComponentRates {
            net: Self::positive(self.net_rate),
            od: Self::positive(self.od_rate),
            tp: Self::positive(self.tp_rate),
        };

        match premium {
            PolicyPremium::Motor(_) => Ok(motor_components(premium, &rates)?.raw_total),
            PolicyPremium::Standard(_) => rates
                .net
                .map_or(Ok(Decimal::ZERO), |rate| rate.of(premium.rating_base())),
        }
    }
}

/// Agent and sub-agent shares of one commission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub agent_amount: Money,
    /// None when the policy has no sub-agent
    pub sub_agent_amount: Option<Money>,
    /// The computed sub-agent share exceeded the total and was cut to it
    pub sub_agent_capped: bool,
}

impl Settlement {
    /// Sub-agent amount, zero when there is no sub-agent
    pub fn sub_agent_or_zero(&self) -> Money {
        self.sub_agent_amount
            .unwrap_or_else(|| Money::zero(self.agent_amount.currency()))
    }
}

/// Splits `total` between the agent and the policy's sub-agent
///
/// Guarantees `agent >= 0` and `agent + sub_agent <= total`. A sub-agent
/// share larger than the total is capped at the total and logged.
pub fn split_commission(total: Money, terms: &PolicyTerms) -> Result<Settlement, CommissionError> {
    if terms.sub_agent_id.is_none() {
        return Ok(Settlement {
            agent_amount: total,
            sub_agent_amount: None,
            sub_agent_capped: false,
        });
    }

    let dp = total.currency().decimal_places();
    let raw = round_half_up(terms.sub_agent_rates.share_of(&terms.premium)?, dp);
    let mut sub_agent = Money::new(raw, total.currency());

    let capped = sub_agent.amount() > total.amount().max(Decimal::ZERO);
    if capped {
        warn!(
            policy_id = %terms.policy_id,
            sub_agent_share = %sub_agent.amount(),
            total = %total.amount(),
            "Sub-agent share exceeds total commission, capping"
        );
        sub_agent = total.floor_zero();
    }

    let agent = total.checked_sub(&sub_agent)?.floor_zero();

    Ok(Settlement {
        agent_amount: agent,
        sub_agent_amount: Some(sub_agent),
        sub_agent_capped: capped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::PolicyCategory;
    use crate::premium::{MotorCover, MotorPremium, StandardPremium};
    use chrono::NaiveDate;
    use core_kernel::{AgentId, ClientId, Currency, InsurerId, SubAgentId};
    use rust_decimal_macros::dec;

    fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    fn pct(p: Decimal) -> Rate {
        Rate::from_percentage(p)
    }

    fn health(total: Decimal, net: Decimal) -> PolicyTerms {
        PolicyTerms::new(
            ClientId::new(),
            InsurerId::new(),
            AgentId::new(),
            PolicyCategory::Health,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            StandardPremium::new(total).with_net(net),
        )
    }

    #[test]
    fn test_no_sub_agent_keeps_full_total() {
        let settlement = split_commission(inr(dec!(3500)), &health(dec!(59000), dec!(50000))).unwrap();
        assert_eq!(settlement.agent_amount, inr(dec!(3500)));
        assert_eq!(settlement.sub_agent_amount, None);
        assert!(settlement.sub_agent_or_zero().is_zero());
    }

    #[test]
    fn test_sub_agent_without_rates_gets_nothing() {
        let terms = health(dec!(59000), dec!(50000)).with_sub_agent(SubAgentId::new(), SubAgentRateSpec::default());
        let settlement = split_commission(inr(dec!(3500)), &terms).unwrap();
        assert_eq!(settlement.agent_amount, inr(dec!(3500)));
        assert_eq!(settlement.sub_agent_amount, Some(inr(dec!(0))));
    }

    #[test]
    fn test_standard_net_rate_applies_to_rating_base() {
        let terms = health(dec!(59000), dec!(50000))
            .with_sub_agent(SubAgentId::new(), SubAgentRateSpec::net(pct(dec!(2.5))));
        let settlement = split_commission(inr(dec!(3500)), &terms).unwrap();
        assert_eq!(settlement.sub_agent_amount, Some(inr(dec!(1250.00))));
        assert_eq!(settlement.agent_amount, inr(dec!(2250.00)));
    }

    #[test]
    fn test_oversized_share_is_capped() {
        let terms = PolicyTerms::new(
            ClientId::new(),
            InsurerId::new(),
            AgentId::new(),
            PolicyCategory::Motor,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            MotorPremium::new(MotorCover::Comprehensive, dec!(11800))
                .with_od(dec!(8000))
                .with_tp(dec!(2000)),
        )
        .with_sub_agent(SubAgentId::new(), SubAgentRateSpec::components(pct(dec!(20)), pct(dec!(20))));

        let settlement = split_commission(inr(dec!(1300)), &terms).unwrap();
        assert!(settlement.sub_agent_capped);
        assert_eq!(settlement.sub_agent_amount, Some(inr(dec!(1300))));
        assert!(settlement.agent_amount.is_zero());
    }
}
