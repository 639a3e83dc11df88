//! Settlement splitter tests

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AgentId, ClientId, Currency, InsurerId, Money, Rate, SubAgentId};
use domain_commission::{
    compute_total_commission, split_commission, ManualRates, MotorCover, MotorPremium, PolicyCategory,
    PolicyTerms, StandardPremium, SubAgentRateSpec,
};

fn pct(p: Decimal) -> Rate {
    Rate::from_percentage(p)
}

fn inr(amount: Decimal) -> Money {
    Money::new(amount, Currency::INR)
}

fn motor_policy() -> PolicyTerms {
    PolicyTerms::new(
        ClientId::new(),
        InsurerId::new(),
        AgentId::new(),
        PolicyCategory::Motor,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        MotorPremium::new(MotorCover::Comprehensive, dec!(11800))
            .with_od(dec!(8000))
            .with_tp(dec!(2000)),
    )
    .with_manual_rates(ManualRates::motor(pct(dec!(15)), pct(dec!(5))))
}

#[test]
fn test_sub_agent_component_rates() {
    let policy = motor_policy().with_sub_agent(
        SubAgentId::new(),
        SubAgentRateSpec::components(pct(dec!(10)), pct(dec!(3))),
    );
    let total = compute_total_commission(&policy, None).unwrap().total;

    let settlement = split_commission(total, &policy).unwrap();

    assert_eq!(total, inr(dec!(1300.00)));
    assert_eq!(settlement.sub_agent_amount, Some(inr(dec!(860.00))));
    assert_eq!(settlement.agent_amount, inr(dec!(440.00)));
    assert!(!settlement.sub_agent_capped);
}

#[test]
fn test_sub_agent_share_ignores_broker_override() {
    let policy = motor_policy()
        .with_broker_override(dec!(2000))
        .with_sub_agent(SubAgentId::new(), SubAgentRateSpec::components(pct(dec!(10)), pct(dec!(3))));
    let total = compute_total_commission(&policy, None).unwrap().total;

    let settlement = split_commission(total, &policy).unwrap();
    assert_eq!(settlement.sub_agent_amount, Some(inr(dec!(860.00))));
    assert_eq!(settlement.agent_amount, inr(dec!(1140.00)));
}

#[test]
fn test_motor_sub_agent_net_rate_supersedes_components() {
    let policy = PolicyTerms::new(
        ClientId::new(),
        InsurerId::new(),
        AgentId::new(),
        PolicyCategory::Motor,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        MotorPremium::new(MotorCover::Comprehensive, dec!(11800))
            .with_od(dec!(8000))
            .with_tp(dec!(2000))
            .with_net(dec!(10000)),
    )
    .with_manual_rates(ManualRates::motor_net(pct(dec!(15))))
    .with_sub_agent(
        SubAgentId::new(),
        SubAgentRateSpec {
            od_rate: Some(pct(dec!(10))),
            tp_rate: Some(pct(dec!(3))),
            net_rate: Some(pct(dec!(6))),
        },
    );
    let total = compute_total_commission(&policy, None).unwrap().total;

    let settlement = split_commission(total, &policy).unwrap();
    assert_eq!(total, inr(dec!(1500.00)));
    assert_eq!(settlement.sub_agent_amount, Some(inr(dec!(600.00))));
    assert_eq!(settlement.agent_amount, inr(dec!(900.00)));
}

#[test]
fn test_standard_policy_sub_agent_on_gross_when_no_net() {
    let policy = PolicyTerms::new(
        ClientId::new(),
        InsurerId::new(),
        AgentId::new(),
        PolicyCategory::Life,
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        StandardPremium::new(dec!(20000)),
    )
    .with_manual_rates(ManualRates::flat(pct(dec!(15))))
    .with_sub_agent(SubAgentId::new(), SubAgentRateSpec::net(pct(dec!(4))));
    let total = compute_total_commission(&policy, None).unwrap().total;

    let settlement = split_commission(total, &policy).unwrap();
    assert_eq!(settlement.sub_agent_amount, Some(inr(dec!(800.00))));
    assert_eq!(settlement.agent_amount, inr(dec!(2200.00)));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn shares_never_exceed_total(
            od_minor in 0i64..5_000_000i64,
            tp_minor in 0i64..5_000_000i64,
            agent_od_bp in 0i64..4_000i64,
            agent_tp_bp in 0i64..4_000i64,
            sub_od_bp in 0i64..6_000i64,
            sub_tp_bp in 0i64..6_000i64,
            override_minor in proptest::option::of(0i64..1_000_000i64),
        ) {
            let mut policy = PolicyTerms::new(
                ClientId::new(),
                InsurerId::new(),
                AgentId::new(),
                PolicyCategory::Motor,
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                MotorPremium::new(MotorCover::Comprehensive, Decimal::new(od_minor + tp_minor, 2))
                    .with_od(Decimal::new(od_minor, 2))
                    .with_tp(Decimal::new(tp_minor, 2)),
            )
            .with_manual_rates(ManualRates::motor(pct(Decimal::new(agent_od_bp, 2)), pct(Decimal::new(agent_tp_bp, 2))))
            .with_sub_agent(
                SubAgentId::new(),
                SubAgentRateSpec::components(pct(Decimal::new(sub_od_bp, 2)), pct(Decimal::new(sub_tp_bp, 2))),
            );
            if let Some(minor) = override_minor {
                policy = policy.with_broker_override(Decimal::new(minor, 2));
            }

            // all-zero agent rates leave no rate at all
            let total = match compute_total_commission(&policy, None) {
                Ok(c) => c.total,
                Err(_) => return Ok(()),
            };
            let settlement = split_commission(total, &policy).unwrap();
            let sub = settlement.sub_agent_or_zero();

            prop_assert!(!settlement.agent_amount.is_negative());
            prop_assert!(!sub.is_negative());
            prop_assert!(settlement.agent_amount.amount() + sub.amount() <= total.amount());
        }
    }
}
