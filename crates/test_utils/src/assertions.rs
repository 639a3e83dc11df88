//! Custom Test Assertions
//!
//! Assertion helpers that print the domain context on failure.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_commission::{CommissionRecord, Settlement, Transition, TransitionOutcome};

/// Asserts a money amount, ignoring trailing zeros
pub fn assert_amount(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Expected {} {}, got {}",
        actual.currency(),
        expected,
        actual
    );
}

/// Asserts that a value carries no more decimals than its currency allows
pub fn assert_rounded(money: &Money) {
    let dp = money.currency().decimal_places();
    assert!(
        money.amount().normalize().scale() <= dp,
        "Expected at most {} decimal places, got {}",
        dp,
        money.amount()
    );
}

/// Asserts the split shares are non-negative and add back to the total
pub fn assert_settlement_conserves(total: &Money, settlement: &Settlement) {
    let sub = settlement.sub_agent_or_zero();
    assert!(
        !settlement.agent_amount.is_negative(),
        "Agent amount is negative: {}",
        settlement.agent_amount
    );
    assert!(!sub.is_negative(), "Sub-agent amount is negative: {}", sub);
    assert!(
        sub.amount() <= total.amount().max(Decimal::ZERO),
        "Sub-agent amount {} exceeds total {}",
        sub,
        total
    );
    if !total.is_negative() {
        assert_eq!(
            settlement.agent_amount.amount() + sub.amount(),
            total.amount(),
            "Agent {} + sub-agent {} does not add up to total {}",
            settlement.agent_amount,
            sub,
            total
        );
    }
}

/// Asserts the stored record matches the split it was opened from
pub fn assert_record_matches_settlement(record: &CommissionRecord, settlement: &Settlement) {
    assert_eq!(record.agent_commission, settlement.agent_amount, "agent commission");
    assert_eq!(record.sub_agent_commission, settlement.sub_agent_amount, "sub-agent commission");
}

pub fn assert_applied(transition: &Transition) {
    assert_eq!(
        transition.outcome,
        TransitionOutcome::Applied,
        "Expected the transition on {} to apply",
        transition.record.id
    );
}

pub fn assert_already_processed(transition: &Transition) {
    assert_eq!(
        transition.outcome,
        TransitionOutcome::AlreadyProcessed,
        "Expected {} to be already processed",
        transition.record.id
    );
}
