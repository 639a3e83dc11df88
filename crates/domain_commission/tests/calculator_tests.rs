//! Commission calculator tests

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AgentId, ClientId, CommissionRuleId, InsurerId, Rate};
use domain_commission::{
    compute_total_commission, requires_rate_table, CommissionError, CommissionMethod, ManualRates,
    MotorCover, MotorPremium, PolicyCategory, PolicyPremium, PolicyTerms, RateOrigin, StandardPremium,
    TierRate,
};

fn pct(p: Decimal) -> Rate {
    Rate::from_percentage(p)
}

fn terms(category: PolicyCategory, premium: impl Into<PolicyPremium>) -> PolicyTerms {
    PolicyTerms::new(
        ClientId::new(),
        InsurerId::new(),
        AgentId::new(),
        category,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        premium,
    )
}

fn comprehensive() -> MotorPremium {
    MotorPremium::new(MotorCover::Comprehensive, dec!(11800))
        .with_od(dec!(8000))
        .with_tp(dec!(2000))
}

fn tier(rate: Decimal) -> TierRate {
    TierRate {
        rule_id: CommissionRuleId::new(),
        rate: pct(rate),
    }
}

// ============= MOTOR =============
mod motor {
    use super::*;

    #[test]
    fn test_od_tp_components() {
        let policy = terms(PolicyCategory::Motor, comprehensive())
            .with_manual_rates(ManualRates::motor(pct(dec!(15)), pct(dec!(5))));

        let result = compute_total_commission(&policy, None).unwrap();

        assert_eq!(result.total.amount(), dec!(1300.00));
        assert_eq!(result.origin, RateOrigin::Manual);
        let breakdown = result.breakdown.unwrap();
        assert_eq!(breakdown.od_commission, dec!(1200.00));
        assert_eq!(breakdown.tp_commission, dec!(100.00));
        assert_eq!(breakdown.net_commission, dec!(0));
    }

    #[test]
    fn test_missing_component_contributes_zero() {
        let policy = terms(
            PolicyCategory::Motor,
            MotorPremium::new(MotorCover::OwnDamageOnly, dec!(9440)).with_od(dec!(8000)),
        )
        .with_manual_rates(ManualRates::motor(pct(dec!(15)), pct(dec!(5))));

        let result = compute_total_commission(&policy, None).unwrap();
        assert_eq!(result.total.amount(), dec!(1200.00));
    }

    #[test]
    fn test_net_rate_on_net_premium() {
        let policy = terms(PolicyCategory::Motor, comprehensive().with_net(dec!(10000)))
            .with_manual_rates(ManualRates::motor_net(pct(dec!(17.5))));

        let result = compute_total_commission(&policy, None).unwrap();
        assert_eq!(result.total.amount(), dec!(1750.00));
        assert_eq!(result.method, CommissionMethod::MotorNet { rate: pct(dec!(17.5)) });
    }

    #[test]
    fn test_net_rate_without_net_premium_uses_components() {
        let policy = terms(PolicyCategory::Motor, comprehensive()).with_manual_rates(ManualRates {
            commission_rate: None,
            od_rate: Some(pct(dec!(15))),
            tp_rate: Some(pct(dec!(5))),
            net_rate: Some(pct(dec!(17.5))),
        });

        let result = compute_total_commission(&policy, None).unwrap();
        assert_eq!(result.total.amount(), dec!(1300.00));
    }

    #[test]
    fn test_tier_rate_applies_to_every_component() {
        let policy = terms(PolicyCategory::Motor, comprehensive());
        assert!(requires_rate_table(&policy));

        let t = tier(dec!(10));
        let result = compute_total_commission(&policy, Some(t)).unwrap();
        assert_eq!(result.total.amount(), dec!(1000.00));
        assert_eq!(result.origin, RateOrigin::RateTable { rule_id: t.rule_id, rate: t.rate });
    }

    #[test]
    fn test_manual_rates_win_over_tier() {
        let policy = terms(PolicyCategory::Motor, comprehensive())
            .with_manual_rates(ManualRates::motor(pct(dec!(15)), pct(dec!(5))));
        assert!(!requires_rate_table(&policy));

        let result = compute_total_commission(&policy, Some(tier(dec!(30)))).unwrap();
        assert_eq!(result.total.amount(), dec!(1300.00));
    }
}

// ============= STANDARD =============
mod standard {
    use super::*;

    #[test]
    fn test_net_premium_at_tier_rate() {
        let policy = terms(PolicyCategory::Health, StandardPremium::new(dec!(59000)).with_net(dec!(50000)));

        let result = compute_total_commission(&policy, Some(tier(dec!(7)))).unwrap();
        assert_eq!(result.total.amount(), dec!(3500.00));
        assert_eq!(
            result.method,
            CommissionMethod::Standard {
                rate: pct(dec!(7)),
                base: dec!(50000)
            }
        );
        assert!(result.breakdown.is_none());
    }

    #[test]
    fn test_gross_premium_when_net_absent() {
        let policy = terms(PolicyCategory::Life, StandardPremium::new(dec!(24999)));

        let result = compute_total_commission(&policy, Some(tier(dec!(15)))).unwrap();
        // 3749.85
        assert_eq!(result.total.amount(), dec!(3749.85));
    }

    #[test]
    fn test_keyed_zero_net_is_the_base() {
        let policy = terms(PolicyCategory::Health, StandardPremium::new(dec!(59000)).with_net(dec!(0)));

        let result = compute_total_commission(&policy, Some(tier(dec!(7)))).unwrap();
        assert_eq!(result.total.amount(), dec!(0.00));
        assert_eq!(
            result.method,
            CommissionMethod::Standard {
                rate: pct(dec!(7)),
                base: dec!(0)
            }
        );
    }

    #[test]
    fn test_manual_flat_rate_wins() {
        let policy = terms(PolicyCategory::Health, StandardPremium::new(dec!(59000)).with_net(dec!(50000)))
            .with_manual_rates(ManualRates::flat(pct(dec!(10))));

        let result = compute_total_commission(&policy, Some(tier(dec!(7)))).unwrap();
        assert_eq!(result.total.amount(), dec!(5000.00));
        assert_eq!(result.origin, RateOrigin::Manual);
    }

    #[test]
    fn test_half_up_rounding() {
        // 1234.50 * 1% = 12.345
        let policy = terms(PolicyCategory::Travel, StandardPremium::new(dec!(1234.50)));
        let result = compute_total_commission(&policy, Some(tier(dec!(1)))).unwrap();
        assert_eq!(result.total.amount(), dec!(12.35));
    }

    #[test]
    fn test_no_rate_is_an_error_not_zero() {
        let policy = terms(PolicyCategory::Health, StandardPremium::new(dec!(1000)));
        assert!(matches!(
            compute_total_commission(&policy, None),
            Err(CommissionError::MissingRate(_))
        ));
    }
}

// ============= BROKER OVERRIDE =============
mod broker_override {
    use super::*;

    #[test]
    fn test_override_replaces_rate_math() {
        let policy = terms(PolicyCategory::Motor, comprehensive())
            .with_manual_rates(ManualRates::motor(pct(dec!(15)), pct(dec!(5))))
            .with_broker_override(dec!(2000));

        let result = compute_total_commission(&policy, None).unwrap();
        assert_eq!(result.total.amount(), dec!(2000));
        assert_eq!(result.method, CommissionMethod::BrokerOverride);
        assert_eq!(result.origin, RateOrigin::BrokerOverride);
        assert!(!requires_rate_table(&policy));
    }

    #[test]
    fn test_zero_override_falls_through_to_rates() {
        let policy = terms(PolicyCategory::Motor, comprehensive())
            .with_manual_rates(ManualRates::motor(pct(dec!(15)), pct(dec!(5))))
            .with_broker_override(dec!(0));

        let result = compute_total_commission(&policy, None).unwrap();
        assert_eq!(result.total.amount(), dec!(1300.00));
    }
}

// ============= PROPERTIES =============
mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn computation_is_deterministic(
            total_minor in 1i64..100_000_000i64,
            net_minor in 0i64..100_000_000i64,
            rate_bp in 1i64..5_000i64,
        ) {
            let premium = StandardPremium::new(Decimal::new(total_minor, 2)).with_net(Decimal::new(net_minor, 2));
            let policy = terms(PolicyCategory::Health, premium);
            let t = tier(Decimal::new(rate_bp, 2));

            let first = compute_total_commission(&policy, Some(t)).unwrap();
            let second = compute_total_commission(&policy, Some(t)).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn total_has_at_most_two_places(
            od_minor in 0i64..10_000_000i64,
            tp_minor in 0i64..10_000_000i64,
            od_bp in 1i64..3_000i64,
            tp_bp in 1i64..3_000i64,
        ) {
            let premium = MotorPremium::new(MotorCover::Comprehensive, Decimal::new(od_minor + tp_minor, 2))
                .with_od(Decimal::new(od_minor, 2))
                .with_tp(Decimal::new(tp_minor, 2));
            let policy = terms(PolicyCategory::Motor, premium)
                .with_manual_rates(ManualRates::motor(pct(Decimal::new(od_bp, 2)), pct(Decimal::new(tp_bp, 2))));

            let total = compute_total_commission(&policy, None).unwrap().total.amount();
            prop_assert!(total.scale() <= 2 || total == total.round_dp(2));
            prop_assert!(total >= Decimal::ZERO);
        }
    }
}
