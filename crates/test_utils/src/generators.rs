//! Property-Based Test Generators
//!
//! proptest strategies for premiums, rates and ledger entries. Amounts are
//! generated in paise so every value has at most two decimal places.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{AgentId, ClientId, InsurerId, Rate, SubAgentId};
use domain_commission::{
    ManualRates, MotorCover, MotorPremium, PolicyCategory, PolicyPremium, PolicyTerms, StandardPremium,
    SubAgentRateSpec,
};
use domain_khata::EntryType;

use crate::fixtures::DateFixtures;

/// Amount between 0.01 and 10,000,000.00
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|paise| Decimal::new(paise, 2))
}

/// Amount between 0.00 and 10,000,000.00
pub fn non_negative_amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|paise| Decimal::new(paise, 2))
}

/// Rate between 0% and 50% with two decimals
pub fn rate_strategy() -> impl Strategy<Value = Rate> {
    (0i64..=5_000i64).prop_map(|bp| Rate::from_percentage(Decimal::new(bp, 2)))
}

/// Rate between 0.01% and 50%
pub fn positive_rate_strategy() -> impl Strategy<Value = Rate> {
    (1i64..=5_000i64).prop_map(|bp| Rate::from_percentage(Decimal::new(bp, 2)))
}

pub fn non_motor_category_strategy() -> impl Strategy<Value = PolicyCategory> {
    prop_oneof![
        Just(PolicyCategory::Health),
        Just(PolicyCategory::Life),
        Just(PolicyCategory::Term),
        Just(PolicyCategory::Travel),
        Just(PolicyCategory::Property),
    ]
}

/// Comprehensive motor premium with optional net
pub fn motor_premium_strategy() -> impl Strategy<Value = MotorPremium> {
    (
        non_negative_amount_strategy(),
        non_negative_amount_strategy(),
        proptest::option::of(non_negative_amount_strategy()),
    )
        .prop_map(|(od, tp, net)| {
            let premium = MotorPremium::new(MotorCover::Comprehensive, od + tp)
                .with_od(od)
                .with_tp(tp);
            match net {
                Some(net) => premium.with_net(net),
                None => premium,
            }
        })
}

pub fn standard_premium_strategy() -> impl Strategy<Value = StandardPremium> {
    (non_negative_amount_strategy(), proptest::option::of(non_negative_amount_strategy())).prop_map(
        |(total, net)| match net {
            Some(net) => StandardPremium::new(total).with_net(net),
            None => StandardPremium::new(total),
        },
    )
}

pub fn sub_agent_rates_strategy() -> impl Strategy<Value = SubAgentRateSpec> {
    prop_oneof![
        (rate_strategy(), rate_strategy()).prop_map(|(od, tp)| SubAgentRateSpec::components(od, tp)),
        rate_strategy().prop_map(SubAgentRateSpec::net),
        Just(SubAgentRateSpec::default()),
    ]
}

/// Policy terms with manual rates, so no rate table is needed
///
/// About half carry a sub-agent and a quarter a broker override.
pub fn rated_policy_strategy() -> impl Strategy<Value = PolicyTerms> {
    let motor = (motor_premium_strategy(), positive_rate_strategy(), positive_rate_strategy())
        .prop_map(|(premium, od, tp)| {
            (PolicyCategory::Motor, PolicyPremium::from(premium), ManualRates::motor(od, tp))
        });
    let standard = (non_motor_category_strategy(), standard_premium_strategy(), positive_rate_strategy())
        .prop_map(|(category, premium, rate)| (category, PolicyPremium::from(premium), ManualRates::flat(rate)));

    (
        prop_oneof![motor, standard],
        proptest::option::of(sub_agent_rates_strategy()),
        proptest::option::weighted(0.25, amount_strategy()),
    )
        .prop_map(|((category, premium, rates), sub_agent, broker_override)| {
            let mut terms = PolicyTerms::new(
                ClientId::new(),
                InsurerId::new(),
                AgentId::new(),
                category,
                DateFixtures::policy_date(),
                premium,
            )
            .with_manual_rates(rates);
            if let Some(rates) = sub_agent {
                terms = terms.with_sub_agent(SubAgentId::new(), rates);
            }
            if let Some(amount) = broker_override {
                terms = terms.with_broker_override(amount);
            }
            terms
        })
}

pub fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![Just(EntryType::Debit), Just(EntryType::Credit)]
}

/// Sequence of (type, amount) postings for one client
pub fn postings_strategy(max_len: usize) -> impl Strategy<Value = Vec<(EntryType, Decimal)>> {
    proptest::collection::vec((entry_type_strategy(), amount_strategy()), 0..max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_amounts_have_two_decimals(amount in amount_strategy()) {
            prop_assert!(amount > Decimal::ZERO);
            prop_assert!(amount.scale() <= 2);
        }

        #[test]
        fn generated_policies_validate(terms in rated_policy_strategy()) {
            prop_assert!(terms.validate().is_ok());
        }
    }
}
