//! Commission calculator
//!
//! Pure function from policy terms (plus the resolved tier rate, when one
//! was needed) to the total commission. Precedence:
//!
//! 1. a positive broker override is the total, no rate math runs
//! 2. motor policies: net premium at the net rate when both are positive,
//!    otherwise OD at the OD rate plus TP at the TP rate
//! 3. other lines: rating base (net premium, or gross when net is absent)
//!    at the manual flat rate, or the tier rate when no manual rate is keyed
//!
//! Component products are summed unrounded and the total is rounded
//! half-up to the currency's places once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{round_half_up, CommissionRuleId, Money, MoneyError, Rate};

use crate::error::CommissionError;
use crate::policy::PolicyTerms;
use crate::premium::PolicyPremium;
use crate::rate_table::TierRate;

/// How the total was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommissionMethod {
    BrokerOverride,
    MotorNet {
        rate: Rate,
    },
    MotorComponents {
        od_rate: Option<Rate>,
        tp_rate: Option<Rate>,
    },
    Standard {
        rate: Rate,
        base: Decimal,
    },
}

/// Where the rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateOrigin {
    BrokerOverride,
    Manual,
    RateTable {
        rule_id: CommissionRuleId,
        rate: Rate,
    },
}

impl RateOrigin {
    pub fn rule_id(&self) -> Option<CommissionRuleId> {
        match self {
            RateOrigin::RateTable { rule_id, .. } => Some(*rule_id),
            _ => None,
        }
    }
}

/// Per-component motor figures, each rounded for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorBreakdown {
    pub od_commission: Decimal,
    pub tp_commission: Decimal,
    pub net_commission: Decimal,
}

/// Result of [`compute_total_commission`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionComputation {
    pub total: Money,
    pub method: CommissionMethod,
    pub origin: RateOrigin,
    pub breakdown: Option<MotorBreakdown>,
}

/// True when the figure depends on the rate table
///
/// A positive broker override or manually keyed rates fully determine the
/// commission; only otherwise must a rule be resolved.
pub fn requires_rate_table(terms: &PolicyTerms) -> bool {
    if terms.effective_broker_override().is_some() {
        return false;
    }
    if terms.premium.is_motor() {
        terms.manual_rates.is_empty()
    } else {
        terms.manual_rates.flat_rate().is_none()
    }
}

/// Computes the total commission for a policy
///
/// `tier` is the rate resolved from the table. It is only read when neither
/// a broker override nor a manual rate determines the figure.
///
/// # Errors
///
/// Returns `MissingRate` when no override, manual rate or tier is available.
pub fn compute_total_commission(
    terms: &PolicyTerms,
    tier: Option<TierRate>,
) -> Result<CommissionComputation, CommissionError> {
    let dp = terms.currency.decimal_places();

    if let Some(amount) = terms.effective_broker_override() {
        return Ok(CommissionComputation {
            total: Money::new(round_half_up(amount, dp), terms.currency),
            method: CommissionMethod::BrokerOverride,
            origin: RateOrigin::BrokerOverride,
            breakdown: None,
        });
    }

    let manual = &terms.manual_rates;

    match &terms.premium {
        PolicyPremium::Motor(_) => {
            let (rates, origin) = if manual.has_motor_rates() {
                (
                    ComponentRates {
                        net: manual.net(),
                        od: manual.od(),
                        tp: manual.tp(),
                    },
                    RateOrigin::Manual,
                )
            } else if let Some(flat) = manual.flat_rate() {
                (ComponentRates::uniform(flat), RateOrigin::Manual)
            } else if let Some(t) = tier {
                (
                    ComponentRates::uniform(t.rate),
                    RateOrigin::RateTable {
                        rule_id: t.rule_id,
                        rate: t.rate,
                    },
                )
            } else {
                return Err(CommissionError::MissingRate(terms.policy_id));
            };

            let components = motor_components(&terms.premium, &rates)?;
            Ok(CommissionComputation {
                total: Money::new(round_half_up(components.raw_total, dp), terms.currency),
                method: components.method,
                origin,
                breakdown: Some(MotorBreakdown {
                    od_commission: round_half_up(components.od, dp),
                    tp_commission: round_half_up(components.tp, dp),
                    net_commission: round_half_up(components.net, dp),
                }),
            })
        }
        PolicyPremium::Standard(_) => {
            let (rate, origin) = match (manual.flat_rate(), tier) {
                (Some(flat), _) => (flat, RateOrigin::Manual),
                (None, Some(t)) => (
                    t.rate,
                    RateOrigin::RateTable {
                        rule_id: t.rule_id,
                        rate: t.rate,
                    },
                ),
                (None, None) => return Err(CommissionError::MissingRate(terms.policy_id)),
            };

            let base = terms.premium.rating_base();
            Ok(CommissionComputation {
                total: Money::new(round_half_up(rate.of(base)?, dp), terms.currency),
                method: CommissionMethod::Standard { rate, base },
                origin,
                breakdown: None,
            })
        }
    }
}

/// Net/OD/TP rates applied to a motor premium
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ComponentRates {
    pub net: Option<Rate>,
    pub od: Option<Rate>,
    pub tp: Option<Rate>,
}

impl ComponentRates {
    fn uniform(rate: Rate) -> Self {
        Self {
            net: Some(rate),
            od: Some(rate),
            tp: Some(rate),
        }
    }
}

/// Unrounded motor component products
#[derive(Debug, Clone, Copy)]
pub(crate) struct MotorComponents {
    pub od: Decimal,
    pub tp: Decimal,
    pub net: Decimal,
    pub raw_total: Decimal,
    pub method: CommissionMethod,
}

/// Net rate supersedes the OD/TP rates whenever it and the net premium are
/// both positive. Missing premiums or rates contribute zero.
pub(crate) fn motor_components(
    premium: &PolicyPremium,
    rates: &ComponentRates,
) -> Result<MotorComponents, MoneyError> {
    let component = |amount: Option<Decimal>, rate: Option<Rate>| match (amount, rate) {
        (Some(a), Some(r)) => r.of(a),
        _ => Ok(Decimal::ZERO),
    };

    if let (Some(rate), Some(net)) = (rates.net, premium.positive_net()) {
        let net_commission = rate.of(net)?;
        return Ok(MotorComponents {
            od: Decimal::ZERO,
            tp: Decimal::ZERO,
            net: net_commission,
            raw_total: net_commission,
            method: CommissionMethod::MotorNet { rate },
        });
    }

    let od = component(premium.od(), rates.od)?;
    let tp = component(premium.tp(), rates.tp)?;
    let raw_total = od
        .checked_add(tp)
        .ok_or_else(|| MoneyError::InvalidAmount(format!("OD {} plus TP {} overflows", od, tp)))?;
    Ok(MotorComponents {
        od,
        tp,
        net: Decimal::ZERO,
        raw_total,
        method: CommissionMethod::MotorComponents {
            od_rate: rates.od,
            tp_rate: rates.tp,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::PolicyCategory;
    use crate::policy::ManualRates;
    use crate::premium::{MotorCover, MotorPremium, StandardPremium};
    use chrono::NaiveDate;
    use core_kernel::{AgentId, ClientId, InsurerId};
    use rust_decimal_macros::dec;

    fn pct(p: Decimal) -> Rate {
        Rate::from_percentage(p)
    }

    fn motor(premium: MotorPremium) -> PolicyTerms {
        PolicyTerms::new(
            ClientId::new(),
            InsurerId::new(),
            AgentId::new(),
            PolicyCategory::Motor,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            premium,
        )
    }

    #[test]
    fn test_net_rate_supersedes_component_rates() {
        let terms = motor(
            MotorPremium::new(MotorCover::Comprehensive, dec!(11800))
                .with_od(dec!(8000))
                .with_tp(dec!(2000))
                .with_net(dec!(10000)),
        )
        .with_manual_rates(ManualRates {
            commission_rate: None,
            od_rate: Some(pct(dec!(15))),
            tp_rate: Some(pct(dec!(5))),
            net_rate: Some(pct(dec!(12))),
        });

        let result = compute_total_commission(&terms, None).unwrap();
        assert_eq!(result.total.amount(), dec!(1200.00));
        assert!(matches!(result.method, CommissionMethod::MotorNet { .. }));
    }

    #[test]
    fn test_zero_net_premium_falls_back_to_components() {
        let terms = motor(
            MotorPremium::new(MotorCover::Comprehensive, dec!(11800))
                .with_od(dec!(8000))
                .with_tp(dec!(2000))
                .with_net(dec!(0)),
        )
        .with_manual_rates(ManualRates {
            commission_rate: None,
            od_rate: Some(pct(dec!(15))),
            tp_rate: Some(pct(dec!(5))),
            net_rate: Some(pct(dec!(12))),
        });

        let result = compute_total_commission(&terms, None).unwrap();
        assert_eq!(result.total.amount(), dec!(1300.00));
    }

    #[test]
    fn test_total_rounded_once_from_unrounded_components() {
        // 333.335 + 0.005 = 333.34; rounding each part first would give 333.35
        let terms = motor(
            MotorPremium::new(MotorCover::Comprehensive, dec!(4000))
                .with_od(dec!(3333.35))
                .with_tp(dec!(0.05)),
        )
        .with_manual_rates(ManualRates::motor(pct(dec!(10)), pct(dec!(10))));

        let result = compute_total_commission(&terms, None).unwrap();
        assert_eq!(result.total.amount(), dec!(333.34));
        let breakdown = result.breakdown.unwrap();
        assert_eq!(breakdown.od_commission, dec!(333.34));
        assert_eq!(breakdown.tp_commission, dec!(0.01));
    }

    #[test]
    fn test_standard_without_rate_is_missing_rate() {
        let terms = PolicyTerms::new(
            ClientId::new(),
            InsurerId::new(),
            AgentId::new(),
            PolicyCategory::Health,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            StandardPremium::new(dec!(10000)),
        );

        assert!(requires_rate_table(&terms));
        assert!(matches!(
            compute_total_commission(&terms, None),
            Err(CommissionError::MissingRate(_))
        ));
    }

    #[test]
    fn test_overflowing_premium_is_an_error() {
        let terms = motor(MotorPremium::new(MotorCover::Comprehensive, Decimal::MAX).with_od(Decimal::MAX))
            .with_manual_rates(ManualRates::motor(pct(dec!(150)), pct(dec!(5))));

        assert!(matches!(
            compute_total_commission(&terms, None),
            Err(CommissionError::Money(MoneyError::InvalidAmount(_)))
        ));
    }
}
