//! Rate table: tiered commission rules and their resolution
//!
//! A rule belongs to one insurer and one policy category, is effective over
//! a date window and maps premium brackets to rates. Rules are not validated
//! on creation. Gaps and overlaps are tolerated and resolved the same way
//! every time:
//!
//! - among rules in force on the as-of date whose tiers cover the amount,
//!   the latest `effective_from` wins (then latest `created_at`, then id)
//! - within a rule, the covering tier with the greatest `min_premium` wins,
//!   so a shared boundary belongs to the upper bracket
//!
//! [`RateTable::lint`] reports the irregularities without rejecting them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{CommissionRuleId, EffectivePeriod, InsurerId, Rate};

use crate::category::PolicyCategory;
use crate::error::CommissionError;

/// Largest distance between two tiers still treated as contiguous
const CONTIGUITY_TOLERANCE: Decimal = dec!(0.01);

/// A premium bracket and its rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTier {
    pub min_premium: Decimal,
    /// None means unbounded
    pub max_premium: Option<Decimal>,
    pub rate: Rate,
}

impl RuleTier {
    pub fn new(min_premium: Decimal, max_premium: Option<Decimal>, rate: Rate) -> Self {
        Self {
            min_premium,
            max_premium,
            rate,
        }
    }

    /// `min <= amount` and `amount <= max` (or no max)
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min_premium && self.max_premium.map_or(true, |max| amount <= max)
    }
}

/// A tiered commission rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionRule {
    pub id: CommissionRuleId,
    pub insurer_id: InsurerId,
    pub category: PolicyCategory,
    /// Sorted by `min_premium`
    tiers: Vec<RuleTier>,
    pub period: EffectivePeriod,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CommissionRule {
    /// Creates an active rule with no tiers
    pub fn new(insurer_id: InsurerId, category: PolicyCategory, period: EffectivePeriod) -> Self {
        Self {
            id: CommissionRuleId::new_v7(),
            insurer_id,
            category,
            tiers: Vec::new(),
            period,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Rebuilds a stored rule
    pub fn restore(
        id: CommissionRuleId,
        insurer_id: InsurerId,
        category: PolicyCategory,
        tiers: Vec<RuleTier>,
        period: EffectivePeriod,
        is_active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut rule = Self {
            id,
            insurer_id,
            category,
            tiers,
            period,
            is_active,
            created_at,
        };
        rule.sort_tiers();
        rule
    }

    /// Adds a tier
    pub fn with_tier(mut self, min_premium: Decimal, max_premium: Option<Decimal>, rate: Rate) -> Self {
        self.tiers.push(RuleTier::new(min_premium, max_premium, rate));
        self.sort_tiers();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn tiers(&self) -> &[RuleTier] {
        &self.tiers
    }

    fn sort_tiers(&mut self) {
        self.tiers.sort_by(|a, b| {
            a.min_premium
                .cmp(&b.min_premium)
                .then_with(|| match (a.max_premium, b.max_premium) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
        });
    }

    /// Active, same insurer and category, in force on `as_of`
    pub fn applies_to(&self, insurer: InsurerId, category: PolicyCategory, as_of: NaiveDate) -> bool {
        self.is_active
            && self.insurer_id == insurer
            && self.category == category
            && self.period.contains(as_of)
    }

    /// The covering tier with the greatest lower bound
    pub fn tier_for(&self, amount: Decimal) -> Option<&RuleTier> {
        self.tiers.iter().filter(|t| t.contains(amount)).last()
    }

    fn precedence(&self) -> (NaiveDate, DateTime<Utc>, CommissionRuleId) {
        (self.period.from, self.created_at, self.id)
    }

    /// Reports tier irregularities within this rule
    pub fn lint(&self) -> Vec<TierIssue> {
        let mut issues = Vec::new();

        if self.tiers.is_empty() {
            issues.push(TierIssue::NoTiers { rule_id: self.id });
            return issues;
        }

        for tier in &self.tiers {
            if let Some(max) = tier.max_premium {
                if max < tier.min_premium {
                    issues.push(TierIssue::InvertedTier {
                        rule_id: self.id,
                        min_premium: tier.min_premium,
                        max_premium: max,
                    });
                }
            }
        }

        for pair in self.tiers.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            match lower.max_premium {
                None => issues.push(TierIssue::Overlap {
                    rule_id: self.id,
                    lower_min: lower.min_premium,
                    upper_min: upper.min_premium,
                }),
                Some(max) if upper.min_premium < max => issues.push(TierIssue::Overlap {
                    rule_id: self.id,
                    lower_min: lower.min_premium,
                    upper_min: upper.min_premium,
                }),
                Some(max) if upper.min_premium - max > CONTIGUITY_TOLERANCE => {
                    issues.push(TierIssue::Gap {
                        rule_id: self.id,
                        from: max,
                        to: upper.min_premium,
                    })
                }
                Some(_) => {}
            }
        }

        issues
    }
}

/// Rate selected for a policy from the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTier {
    pub rule_id: CommissionRuleId,
    pub effective_from: NaiveDate,
    pub tier: RuleTier,
}

impl ResolvedTier {
    pub fn tier_rate(&self) -> TierRate {
        TierRate {
            rule_id: self.rule_id,
            rate: self.tier.rate,
        }
    }
}

/// The part of a resolved tier the calculator needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRate {
    pub rule_id: CommissionRuleId,
    pub rate: Rate,
}

/// An irregularity found by [`RateTable::lint`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierIssue {
    NoTiers {
        rule_id: CommissionRuleId,
    },
    InvertedTier {
        rule_id: CommissionRuleId,
        min_premium: Decimal,
        max_premium: Decimal,
    },
    /// Premiums strictly between `from` and `to` resolve to no tier
    Gap {
        rule_id: CommissionRuleId,
        from: Decimal,
        to: Decimal,
    },
    Overlap {
        rule_id: CommissionRuleId,
        lower_min: Decimal,
        upper_min: Decimal,
    },
    /// Two active rules for the same insurer and category share dates
    OverlappingRules {
        first: CommissionRuleId,
        second: CommissionRuleId,
    },
}

impl std::fmt::Display for TierIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TierIssue::NoTiers { rule_id } => write!(f, "{}: rule has no tiers", rule_id),
            TierIssue::InvertedTier {
                rule_id,
                min_premium,
                max_premium,
            } => write!(f, "{}: tier max {} is below min {}", rule_id, max_premium, min_premium),
            TierIssue::Gap { rule_id, from, to } => {
                write!(f, "{}: no tier covers premiums between {} and {}", rule_id, from, to)
            }
            TierIssue::Overlap {
                rule_id,
                lower_min,
                upper_min,
            } => write!(
                f,
                "{}: tier starting at {} overlaps tier starting at {}",
                rule_id, lower_min, upper_min
            ),
            TierIssue::OverlappingRules { first, second } => {
                write!(f, "{} and {} are both in force over shared dates", first, second)
            }
        }
    }
}

/// A set of commission rules
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rules: Vec<CommissionRule>,
}

impl RateTable {
    pub fn new(rules: Vec<CommissionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CommissionRule] {
        &self.rules
    }

    /// Resolves the tier for a premium amount
    ///
    /// # Errors
    ///
    /// - `RuleNotFound` when no active rule for the insurer and category is
    ///   in force on `as_of`
    /// - `NoTierForAmount` when rules are in force but none has a tier
    ///   covering `amount`; the most recent of them is reported
    pub fn resolve(
        &self,
        insurer: InsurerId,
        category: PolicyCategory,
        as_of: NaiveDate,
        amount: Decimal,
    ) -> Result<ResolvedTier, CommissionError> {
        let candidates: Vec<&CommissionRule> = self
            .rules
            .iter()
            .filter(|r| r.applies_to(insurer, category, as_of))
            .collect();

        let latest = candidates
            .iter()
            .max_by_key(|r| r.precedence())
            .ok_or(CommissionError::RuleNotFound {
                insurer,
                category,
                as_of,
            })?;

        candidates
            .iter()
            .filter_map(|r| r.tier_for(amount).map(|tier| (*r, *tier)))
            .max_by_key(|(r, _)| r.precedence())
            .map(|(rule, tier)| ResolvedTier {
                rule_id: rule.id,
                effective_from: rule.period.from,
                tier,
            })
            .ok_or(CommissionError::NoTierForAmount {
                rule_id: latest.id,
                amount,
            })
    }

    /// Reports tier gaps, overlaps and rules sharing effective dates
    pub fn lint(&self) -> Vec<TierIssue> {
        let mut issues: Vec<TierIssue> = self.rules.iter().flat_map(CommissionRule::lint).collect();

        let active: Vec<&CommissionRule> = self.rules.iter().filter(|r| r.is_active).collect();
        for (i, first) in active.iter().enumerate() {
            for second in &active[i + 1..] {
                if first.insurer_id == second.insurer_id
                    && first.category == second.category
                    && first.period.overlaps(&second.period)
                {
                    issues.push(TierIssue::OverlappingRules {
                        first: first.id,
                        second: second.id,
                    });
                }
            }
        }

        issues
    }
}
