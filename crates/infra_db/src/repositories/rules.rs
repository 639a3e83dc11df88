//! Commission rule repository
//!
//! A rule is one row in `commission_rules` plus its rows in
//! `commission_rule_tiers`. Saving a rule replaces its tiers wholesale.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{CommissionRuleId, EffectivePeriod, InsurerId, Rate};
use domain_commission::{CommissionRule, PolicyCategory, RuleTier};

use crate::error::DatabaseError;
use crate::pool::DatabasePool;
use crate::repositories::types::DbPolicyCategory;

#[derive(Debug, Clone, FromRow)]
pub struct RuleRow {
    pub rule_id: Uuid,
    pub insurer_id: Uuid,
    pub category: DbPolicyCategory,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TierRow {
    pub rule_id: Uuid,
    pub min_premium: Decimal,
    pub max_premium: Option<Decimal>,
    pub rate_percent: Decimal,
}

const RULE_COLUMNS: &str =
    "rule_id, insurer_id, category, effective_from, effective_to, is_active, created_at";

#[derive(Debug, Clone)]
pub struct RuleRepository {
    pool: DatabasePool,
}

impl RuleRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Upserts the rule and replaces its tiers in one transaction
    #[instrument(skip_all, fields(rule_id = %rule.id))]
    pub async fn save(&self, rule: &CommissionRule) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO commission_rules
                (rule_id, insurer_id, category, effective_from, effective_to, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (rule_id) DO UPDATE SET
                insurer_id = EXCLUDED.insurer_id,
                category = EXCLUDED.category,
                effective_from = EXCLUDED.effective_from,
                effective_to = EXCLUDED.effective_to,
                is_active = EXCLUDED.is_active
            "#,
        )
        .bind(rule.id.as_uuid())
        .bind(rule.insurer_id.as_uuid())
        .bind(DbPolicyCategory::from(rule.category))
        .bind(rule.period.from)
        .bind(rule.period.to)
        .bind(rule.is_active)
        .bind(rule.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM commission_rule_tiers WHERE rule_id = $1")
            .bind(rule.id.as_uuid())
            .execute(&mut *tx)
            .await?;

        for tier in rule.tiers() {
            sqlx::query(
                r#"
                INSERT INTO commission_rule_tiers (rule_id, min_premium, max_premium, rate_percent)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(rule.id.as_uuid())
            .bind(tier.min_premium)
            .bind(tier.max_premium)
            .bind(tier.rate.as_percentage())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(tiers = rule.tiers().len(), "Commission rule saved");
        Ok(())
    }

    /// Active rules in force on `as_of`
    pub async fn find_in_force(
        &self,
        insurer: InsurerId,
        category: PolicyCategory,
        as_of: NaiveDate,
    ) -> Result<Vec<CommissionRule>, DatabaseError> {
        let sql = format!(
            r#"
            SELECT {RULE_COLUMNS}
            FROM commission_rules
            WHERE insurer_id = $1
              AND category = $2
              AND is_active
              AND effective_from <= $3
              AND (effective_to IS NULL OR effective_to >= $3)
            ORDER BY effective_from, created_at, rule_id
            "#
        );
        let rows = sqlx::query_as::<_, RuleRow>(&sql)
            .bind(insurer.as_uuid())
            .bind(DbPolicyCategory::from(category))
            .bind(as_of)
            .fetch_all(&self.pool)
            .await?;

        self.with_tiers(rows).await
    }

    pub async fn all(&self) -> Result<Vec<CommissionRule>, DatabaseError> {
        let sql = format!(
            "SELECT {RULE_COLUMNS} FROM commission_rules ORDER BY effective_from, created_at, rule_id"
        );
        let rows = sqlx::query_as::<_, RuleRow>(&sql).fetch_all(&self.pool).await?;
        self.with_tiers(rows).await
    }

    pub async fn set_active(&self, id: CommissionRuleId, active: bool) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE commission_rules SET is_active = $2 WHERE rule_id = $1")
            .bind(id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("CommissionRule", id));
        }
        Ok(())
    }

    async fn with_tiers(&self, rows: Vec<RuleRow>) -> Result<Vec<CommissionRule>, DatabaseError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.rule_id).collect();
        let tiers = sqlx::query_as::<_, TierRow>(
            r#"
            SELECT rule_id, min_premium, max_premium, rate_percent
            FROM commission_rule_tiers
            WHERE rule_id = ANY($1)
            ORDER BY rule_id, min_premium
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        assemble(rows, tiers)
    }
}

/// Joins rule rows with their tier rows
fn assemble(rows: Vec<RuleRow>, tiers: Vec<TierRow>) -> Result<Vec<CommissionRule>, DatabaseError> {
    let mut by_rule: HashMap<Uuid, Vec<RuleTier>> = HashMap::new();
    for tier in tiers {
        by_rule.entry(tier.rule_id).or_default().push(RuleTier::new(
            tier.min_premium,
            tier.max_premium,
            Rate::from_percentage(tier.rate_percent),
        ));
    }

    rows.into_iter()
        .map(|row| {
            let period = EffectivePeriod::new(row.effective_from, row.effective_to)
                .map_err(|e| DatabaseError::corrupt(format!("rule {}: {}", row.rule_id, e)))?;
            Ok(CommissionRule::restore(
                CommissionRuleId::from_uuid(row.rule_id),
                InsurerId::from_uuid(row.insurer_id),
                row.category.into(),
                by_rule.remove(&row.rule_id).unwrap_or_default(),
                period,
                row.is_active,
                row.created_at,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(id: Uuid) -> RuleRow {
        RuleRow {
            rule_id: id,
            insurer_id: Uuid::new_v4(),
            category: DbPolicyCategory::Health,
            effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            effective_to: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_assemble_attaches_tiers_to_their_rule() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let tiers = vec![
            TierRow { rule_id: a, min_premium: dec!(10000), max_premium: None, rate_percent: dec!(17.5) },
            TierRow { rule_id: a, min_premium: dec!(0), max_premium: Some(dec!(10000)), rate_percent: dec!(15) },
        ];

        let rules = assemble(vec![row(a), row(b)], tiers).unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].tiers().len(), 2);
        assert_eq!(rules[0].tiers()[0].min_premium, dec!(0));
        assert!(rules[1].tiers().is_empty());
        assert_eq!(rules[0].category, PolicyCategory::Health);
    }

    #[test]
    fn test_assemble_rejects_inverted_period() {
        let mut bad = row(Uuid::new_v4());
        bad.effective_to = NaiveDate::from_ymd_opt(2023, 1, 1);
        assert!(matches!(assemble(vec![bad], Vec::new()), Err(DatabaseError::CorruptRow(_))));
    }
}
