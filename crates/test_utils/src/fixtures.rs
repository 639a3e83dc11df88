//! Pre-built Test Fixtures
//!
//! The worked examples of the commission engine as ready-made data: a motor
//! policy rated per component, a health rule with premium brackets, a broker
//! override and a client ledger with an outstanding balance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use core_kernel::{
    AgentId, ClientId, Currency, EffectivePeriod, InsurerId, Money, Rate, SubAgentId,
};
use domain_commission::{
    CommissionRule, ManualRates, MotorCover, MotorPremium, PolicyCategory, PolicyTerms,
    StandardPremium, SubAgentRateSpec,
};
use domain_khata::{EntryType, LedgerEntry, NewEntry};

/// Shorthand for a percentage rate
pub fn pct(percent: Decimal) -> Rate {
    Rate::from_percentage(percent)
}

pub fn inr(amount: Decimal) -> Money {
    Money::new(amount, Currency::INR)
}

/// Fixed dates
pub struct DateFixtures;

impl DateFixtures {
    /// Start of the rate tables used in tests
    pub fn rules_from() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// Effective date of test policies
    pub fn policy_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    pub fn day(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }
}

/// Stable identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn insurer() -> InsurerId {
        InsurerId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0001))
    }

    pub fn agent() -> AgentId {
        AgentId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0002))
    }

    pub fn sub_agent() -> SubAgentId {
        SubAgentId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0003))
    }

    pub fn client() -> ClientId {
        ClientId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0004))
    }
}

/// Commission rules
pub struct RuleFixtures;

impl RuleFixtures {
    /// Health brackets: 5% below 50,000, 7% up to 100,000, 8% up to 150,000,000
    pub fn health_brackets(insurer: InsurerId) -> CommissionRule {
        CommissionRule::new(insurer, PolicyCategory::Health, EffectivePeriod::starting(DateFixtures::rules_from()))
            .with_tier(dec!(0), Some(dec!(50000)), pct(dec!(5)))
            .with_tier(dec!(50000), Some(dec!(100000)), pct(dec!(7)))
            .with_tier(dec!(100000), Some(dec!(150000000)), pct(dec!(8)))
    }

    /// One open tier at `rate` for motor policies
    pub fn motor_flat(insurer: InsurerId, rate: Decimal) -> CommissionRule {
        CommissionRule::new(insurer, PolicyCategory::Motor, EffectivePeriod::starting(DateFixtures::rules_from()))
            .with_tier(dec!(0), None, pct(rate))
    }
}

/// Policies from the worked examples
pub struct PolicyFixtures;

impl PolicyFixtures {
    /// OD 8,000 at 15% and TP 2,000 at 5%: total commission 1,300.00
    pub fn motor_components(insurer: InsurerId) -> PolicyTerms {
        PolicyTerms::new(
            ClientId::new(),
            insurer,
            AgentId::new(),
            PolicyCategory::Motor,
            DateFixtures::policy_date(),
            MotorPremium::new(MotorCover::Comprehensive, dec!(11800))
                .with_od(dec!(8000))
                .with_tp(dec!(2000)),
        )
        .with_manual_rates(ManualRates::motor(pct(dec!(15)), pct(dec!(5))))
    }

    /// The motor policy with a sub-agent on OD 10% and TP 3%: 860.00 to the
    /// sub-agent, 440.00 to the agent
    pub fn motor_with_sub_agent(insurer: InsurerId) -> PolicyTerms {
        Self::motor_components(insurer).with_sub_agent(
            SubAgentId::new(),
            SubAgentRateSpec::components(pct(dec!(10)), pct(dec!(3))),
        )
    }

    /// The motor policy with a 2,000 broker override
    pub fn motor_with_override(insurer: InsurerId) -> PolicyTerms {
        Self::motor_components(insurer).with_broker_override(dec!(2000))
    }

    /// Health policy rated from the table on its net premium
    pub fn health(insurer: InsurerId, net: Decimal) -> PolicyTerms {
        PolicyTerms::new(
            ClientId::new(),
            insurer,
            AgentId::new(),
            PolicyCategory::Health,
            DateFixtures::policy_date(),
            StandardPremium::new(net * dec!(1.18)).with_net(net),
        )
    }
}

/// Ledger entries
pub struct LedgerFixtures;

impl LedgerFixtures {
    pub fn entry(client: ClientId, entry_type: EntryType, amount: Decimal, date: NaiveDate) -> LedgerEntry {
        LedgerEntry::new(NewEntry {
            client_id: client,
            entry_type,
            amount: inr(amount),
            description: format!("{} {}", entry_type, amount),
            entry_date: date,
            policy_id: None,
        })
        .unwrap()
    }

    /// DEBIT 25,000, CREDIT 10,000, DEBIT 5,000: balance 20,000
    pub fn outstanding(client: ClientId) -> Vec<LedgerEntry> {
        vec![
            Self::entry(client, EntryType::Debit, dec!(25000), DateFixtures::day(1)),
            Self::entry(client, EntryType::Credit, dec!(10000), DateFixtures::day(5)),
            Self::entry(client, EntryType::Debit, dec!(5000), DateFixtures::day(9)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_commission::{compute_total_commission, split_commission};
    use domain_khata::ClientLedger;

    #[test]
    fn test_motor_fixture_totals() {
        let terms = PolicyFixtures::motor_with_sub_agent(IdFixtures::insurer());
        let computation = compute_total_commission(&terms, None).unwrap();
        let settlement = split_commission(computation.total, &terms).unwrap();

        assert_eq!(computation.total.amount(), dec!(1300.00));
        assert_eq!(settlement.sub_agent_or_zero().amount(), dec!(860.00));
        assert_eq!(settlement.agent_amount.amount(), dec!(440.00));
    }

    #[test]
    fn test_outstanding_ledger_balance() {
        let client = IdFixtures::client();
        let ledger = ClientLedger::new(client, Currency::INR, LedgerFixtures::outstanding(client));
        assert_eq!(ledger.balance().unwrap().amount(), dec!(20000));
    }

    #[test]
    fn test_fixed_ids_are_distinct() {
        assert_ne!(IdFixtures::agent().as_uuid(), IdFixtures::sub_agent().as_uuid());
    }
}
