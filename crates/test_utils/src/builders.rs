//! Test Data Builders
//!
//! Builders with sensible defaults so a test only spells out the facts it is
//! about.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AgentId, ClientId, Currency, InsurerId, Money, PolicyId, Rate, SubAgentId};
use domain_commission::{
    ManualRates, MotorCover, MotorPremium, PolicyCategory, PolicyPremium, PolicyTerms, StandardPremium,
    SubAgentRateSpec,
};
use domain_khata::{EntryType, LedgerEntry, NewEntry};

use crate::fixtures::DateFixtures;

/// Builder for policy terms
///
/// Defaults to a health policy with a 10,000 total premium and no rates.
pub struct PolicyTermsBuilder {
    policy_id: PolicyId,
    client_id: ClientId,
    insurer_id: InsurerId,
    agent_id: AgentId,
    category: PolicyCategory,
    effective_date: NaiveDate,
    currency: Currency,
    premium: PolicyPremium,
    sub_agent: Option<(SubAgentId, SubAgentRateSpec)>,
    manual_rates: ManualRates,
    broker_override: Option<Decimal>,
}

impl Default for PolicyTermsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyTermsBuilder {
    pub fn new() -> Self {
        Self {
            policy_id: PolicyId::new_v7(),
            client_id: ClientId::new(),
            insurer_id: InsurerId::new(),
            agent_id: AgentId::new(),
            category: PolicyCategory::Health,
            effective_date: DateFixtures::policy_date(),
            currency: Currency::INR,
            premium: StandardPremium::new(dec!(10000)).into(),
            sub_agent: None,
            manual_rates: ManualRates::default(),
            broker_override: None,
        }
    }

    pub fn with_policy_id(mut self, id: PolicyId) -> Self {
        self.policy_id = id;
        self
    }

    pub fn with_client(mut self, id: ClientId) -> Self {
        self.client_id = id;
        self
    }

    pub fn with_insurer(mut self, id: InsurerId) -> Self {
        self.insurer_id = id;
        self
    }

    pub fn with_agent(mut self, id: AgentId) -> Self {
        self.agent_id = id;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.effective_date = date;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    /// Standard premium in `category`
    pub fn standard(mut self, category: PolicyCategory, total: Decimal, net: Option<Decimal>) -> Self {
        let mut premium = StandardPremium::new(total);
        if let Some(net) = net {
            premium = premium.with_net(net);
        }
        self.category = category;
        self.premium = premium.into();
        self
    }

    /// Comprehensive motor premium split into OD and TP
    pub fn motor(mut self, od: Decimal, tp: Decimal) -> Self {
        self.category = PolicyCategory::Motor;
        self.premium = MotorPremium::new(MotorCover::Comprehensive, od + tp)
            .with_od(od)
            .with_tp(tp)
            .into();
        self
    }

    pub fn with_premium(mut self, category: PolicyCategory, premium: impl Into<PolicyPremium>) -> Self {
        self.category = category;
        self.premium = premium.into();
        self
    }

    pub fn flat_rate(mut self, rate: Rate) -> Self {
        self.manual_rates = ManualRates::flat(rate);
        self
    }

    pub fn motor_rates(mut self, od: Rate, tp: Rate) -> Self {
        self.manual_rates = ManualRates::motor(od, tp);
        self
    }

    pub fn with_sub_agent(mut self, id: SubAgentId, rates: SubAgentRateSpec) -> Self {
        self.sub_agent = Some((id, rates));
        self
    }

    pub fn with_broker_override(mut self, amount: Decimal) -> Self {
        self.broker_override = Some(amount);
        self
    }

    pub fn build(self) -> PolicyTerms {
        let mut terms = PolicyTerms::new(
            self.client_id,
            self.insurer_id,
            self.agent_id,
            self.category,
            self.effective_date,
            self.premium,
        )
        .with_policy_id(self.policy_id)
        .with_currency(self.currency)
        .with_manual_rates(self.manual_rates);

        if let Some((id, rates)) = self.sub_agent {
            terms = terms.with_sub_agent(id, rates);
        }
        if let Some(amount) = self.broker_override {
            terms = terms.with_broker_override(amount);
        }
        terms
    }
}

/// Builder for ledger entries
pub struct LedgerEntryBuilder {
    client_id: ClientId,
    entry_type: EntryType,
    amount: Money,
    description: String,
    entry_date: NaiveDate,
    policy_id: Option<PolicyId>,
}

impl LedgerEntryBuilder {
    /// A debit of `amount` INR
    pub fn debit(client_id: ClientId, amount: Decimal) -> Self {
        Self::new(client_id, EntryType::Debit, amount)
    }

    /// A credit of `amount` INR
    pub fn credit(client_id: ClientId, amount: Decimal) -> Self {
        Self::new(client_id, EntryType::Credit, amount)
    }

    fn new(client_id: ClientId, entry_type: EntryType, amount: Decimal) -> Self {
        Self {
            client_id,
            entry_type,
            amount: Money::new(amount, Currency::INR),
            description: String::new(),
            entry_date: DateFixtures::policy_date(),
            policy_id: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.entry_date = date;
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn for_policy(mut self, policy_id: PolicyId) -> Self {
        self.policy_id = Some(policy_id);
        self
    }

    pub fn in_currency(mut self, currency: Currency) -> Self {
        self.amount = Money::new(self.amount.amount(), currency);
        self
    }

    /// Builds the entry
    ///
    /// # Panics
    ///
    /// Panics if the amount is not positive.
    pub fn build(self) -> LedgerEntry {
        LedgerEntry::new(NewEntry {
            client_id: self.client_id,
            entry_type: self.entry_type,
            amount: self.amount,
            description: self.description,
            entry_date: self.entry_date,
            policy_id: self.policy_id,
        })
        .expect("ledger entry amount must be positive")
    }
}
