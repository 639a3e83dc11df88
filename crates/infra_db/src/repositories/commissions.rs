//! Policy and commission record repository
//!
//! The receipt and payout flags only ever move from `FALSE` to `TRUE`, through
//! an `UPDATE ... WHERE flag = FALSE RETURNING ...`. PostgreSQL re-checks the
//! predicate after waiting on a concurrent writer, so of several racing calls
//! exactly one gets the row back.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AgentId, ClientId, CommissionId, CommissionRuleId, InsurerId, Money, PolicyId, Rate, SubAgentId,
};
use domain_commission::{
    CommissionQuery, CommissionRecord, ManualRates, MotorPremium, PolicyPremium, PolicyTerms,
    RateOrigin, StandardPremium, SubAgentRateSpec, TransitionOutcome,
};

use crate::error::DatabaseError;
use crate::pool::DatabasePool;
use crate::repositories::types::{
    currency, percent, rate, DbMotorCover, DbPolicyCategory, DbPremiumKind, DbRateOrigin,
};

#[derive(Debug, Clone, FromRow)]
pub struct PolicyRow {
    pub policy_id: Uuid,
    pub client_id: Uuid,
    pub insurer_id: Uuid,
    pub agent_id: Uuid,
    pub sub_agent_id: Option<Uuid>,
    pub category: DbPolicyCategory,
    pub effective_date: NaiveDate,
    pub currency: String,
    pub premium_kind: DbPremiumKind,
    pub motor_cover: Option<DbMotorCover>,
    pub total_premium: Decimal,
    pub od_premium: Option<Decimal>,
    pub tp_premium: Option<Decimal>,
    pub net_premium: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
    pub od_rate: Option<Decimal>,
    pub tp_rate: Option<Decimal>,
    pub net_rate: Option<Decimal>,
    pub sub_agent_od_rate: Option<Decimal>,
    pub sub_agent_tp_rate: Option<Decimal>,
    pub sub_agent_net_rate: Option<Decimal>,
    pub broker_override: Option<Decimal>,
}

impl PolicyRow {
    fn into_terms(self) -> Result<PolicyTerms, DatabaseError> {
        let premium = match self.premium_kind {
            DbPremiumKind::Motor => {
                let cover = self.motor_cover.ok_or_else(|| {
                    DatabaseError::corrupt(format!("motor policy {} has no cover", self.policy_id))
                })?;
                PolicyPremium::Motor(MotorPremium {
                    cover: cover.into(),
                    total: self.total_premium,
                    od: self.od_premium,
                    tp: self.tp_premium,
                    net: self.net_premium,
                })
            }
            DbPremiumKind::Standard => PolicyPremium::Standard(StandardPremium {
                total: self.total_premium,
                net: self.net_premium,
            }),
        };

        Ok(PolicyTerms {
            policy_id: PolicyId::from_uuid(self.policy_id),
            client_id: ClientId::from_uuid(self.client_id),
            insurer_id: InsurerId::from_uuid(self.insurer_id),
            category: self.category.into(),
            effective_date: self.effective_date,
            currency: currency(&self.currency)?,
            premium,
            agent_id: AgentId::from_uuid(self.agent_id),
            sub_agent_id: self.sub_agent_id.map(SubAgentId::from_uuid),
            sub_agent_rates: SubAgentRateSpec {
                od_rate: rate(self.sub_agent_od_rate),
                tp_rate: rate(self.sub_agent_tp_rate),
                net_rate: rate(self.sub_agent_net_rate),
            },
            manual_rates: ManualRates {
                commission_rate: rate(self.commission_rate),
                od_rate: rate(self.od_rate),
                tp_rate: rate(self.tp_rate),
                net_rate: rate(self.net_rate),
            },
            broker_override: self.broker_override,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CommissionRow {
    pub commission_id: Uuid,
    pub policy_id: Uuid,
    pub agent_id: Uuid,
    pub sub_agent_id: Option<Uuid>,
    pub currency: String,
    pub total_commission: Decimal,
    pub agent_commission: Decimal,
    pub sub_agent_commission: Option<Decimal>,
    pub broker_override: Option<Decimal>,
    pub rate_origin: DbRateOrigin,
    pub rule_id: Option<Uuid>,
    pub tier_rate_percent: Option<Decimal>,
    pub received_from_insurer: bool,
    pub received_at: Option<DateTime<Utc>>,
    pub paid_to_sub_agent: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CommissionRow {
    fn into_record(self) -> Result<CommissionRecord, DatabaseError> {
        let currency = currency(&self.currency)?;
        let origin = match self.rate_origin {
            DbRateOrigin::BrokerOverride => RateOrigin::BrokerOverride,
            DbRateOrigin::Manual => RateOrigin::Manual,
            DbRateOrigin::RateTable => match (self.rule_id, self.tier_rate_percent) {
                (Some(rule_id), Some(percent)) => RateOrigin::RateTable {
                    rule_id: CommissionRuleId::from_uuid(rule_id),
                    rate: Rate::from_percentage(percent),
                },
                _ => {
                    return Err(DatabaseError::corrupt(format!(
                        "commission {} came from the rate table without a rule",
                        self.commission_id
                    )))
                }
            },
        };

        Ok(CommissionRecord {
            id: CommissionId::from_uuid(self.commission_id),
            policy_id: PolicyId::from_uuid(self.policy_id),
            agent_id: AgentId::from_uuid(self.agent_id),
            sub_agent_id: self.sub_agent_id.map(SubAgentId::from_uuid),
            total_commission: Money::new(self.total_commission, currency),
            agent_commission: Money::new(self.agent_commission, currency),
            sub_agent_commission: self.sub_agent_commission.map(|a| Money::new(a, currency)),
            broker_override: self.broker_override,
            origin,
            received_from_insurer: self.received_from_insurer,
            received_at: self.received_at,
            paid_to_sub_agent: self.paid_to_sub_agent,
            paid_at: self.paid_at,
            created_at: self.created_at,
        })
    }
}

fn origin_columns(origin: &RateOrigin) -> (DbRateOrigin, Option<Uuid>, Option<Decimal>) {
    match origin {
        RateOrigin::BrokerOverride => (DbRateOrigin::BrokerOverride, None, None),
        RateOrigin::Manual => (DbRateOrigin::Manual, None, None),
        RateOrigin::RateTable { rule_id, rate } => {
            (DbRateOrigin::RateTable, Some(*rule_id.as_uuid()), Some(rate.as_percentage()))
        }
    }
}

const POLICY_COLUMNS: &str = "policy_id, client_id, insurer_id, agent_id, sub_agent_id, category, \
     effective_date, currency, premium_kind, motor_cover, total_premium, od_premium, tp_premium, \
     net_premium, commission_rate, od_rate, tp_rate, net_rate, sub_agent_od_rate, \
     sub_agent_tp_rate, sub_agent_net_rate, broker_override";

const COMMISSION_COLUMNS: &str = "commission_id, policy_id, agent_id, sub_agent_id, currency, \
     total_commission, agent_commission, sub_agent_commission, broker_override, rate_origin, \
     rule_id, tier_rate_percent, received_from_insurer, received_at, paid_to_sub_agent, paid_at, \
     created_at";

/// Result of a conditional flag update
#[derive(Debug, Clone)]
pub enum FlagUpdate {
    Moved(CommissionRecord, TransitionOutcome),
    /// The record exists but has no sub-agent to pay
    NoSubAgent(CommissionRecord),
}

#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: DatabasePool,
}

impl CommissionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Inserts the policy and its commission record in one transaction
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` when the policy is already stored.
    #[instrument(skip_all, fields(policy_id = %terms.policy_id, commission_id = %record.id))]
    pub async fn insert_policy_with_commission(
        &self,
        terms: &PolicyTerms,
        record: &CommissionRecord,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let (kind, cover) = match &terms.premium {
            PolicyPremium::Motor(motor) => (DbPremiumKind::Motor, Some(DbMotorCover::from(motor.cover))),
            PolicyPremium::Standard(_) => (DbPremiumKind::Standard, None),
        };

        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO policies ({POLICY_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22)
            ON CONFLICT (policy_id) DO NOTHING
            "#
        ))
        .bind(terms.policy_id.as_uuid())
        .bind(terms.client_id.as_uuid())
        .bind(terms.insurer_id.as_uuid())
        .bind(terms.agent_id.as_uuid())
        .bind(terms.sub_agent_id.map(Uuid::from))
        .bind(DbPolicyCategory::from(terms.category))
        .bind(terms.effective_date)
        .bind(terms.currency.code())
        .bind(kind)
        .bind(cover)
        .bind(terms.premium.total())
        .bind(terms.premium.od())
        .bind(terms.premium.tp())
        .bind(terms.premium.net())
        .bind(percent(terms.manual_rates.commission_rate))
        .bind(percent(terms.manual_rates.od_rate))
        .bind(percent(terms.manual_rates.tp_rate))
        .bind(percent(terms.manual_rates.net_rate))
        .bind(percent(terms.sub_agent_rates.od_rate))
        .bind(percent(terms.sub_agent_rates.tp_rate))
        .bind(percent(terms.sub_agent_rates.net_rate))
        .bind(terms.broker_override)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(DatabaseError::duplicate("Policy", "policy_id", terms.policy_id));
        }

        let (origin, rule_id, tier_rate) = origin_columns(&record.origin);
        let currency = record.total_commission.currency();

        sqlx::query(&format!(
            r#"
            INSERT INTO commission_records ({COMMISSION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#
        ))
        .bind(record.id.as_uuid())
        .bind(record.policy_id.as_uuid())
        .bind(record.agent_id.as_uuid())
        .bind(record.sub_agent_id.map(Uuid::from))
        .bind(currency.code())
        .bind(record.total_commission.amount())
        .bind(record.agent_commission.amount())
        .bind(record.sub_agent_commission.map(|m| m.amount()))
        .bind(record.broker_override)
        .bind(origin)
        .bind(rule_id)
        .bind(tier_rate)
        .bind(record.received_from_insurer)
        .bind(record.received_at)
        .bind(record.paid_to_sub_agent)
        .bind(record.paid_at)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!("Policy and commission record stored");
        Ok(())
    }

    pub async fn get_policy(&self, id: PolicyId) -> Result<PolicyTerms, DatabaseError> {
        let row = sqlx::query_as::<_, PolicyRow>(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies WHERE policy_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Policy", id))?;

        row.into_terms()
    }

    pub async fn get_commission(&self, id: CommissionId) -> Result<CommissionRecord, DatabaseError> {
        self.fetch_commission(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("CommissionRecord", id))
    }

    pub async fn find_by_policy(&self, policy_id: PolicyId) -> Result<Option<CommissionRecord>, DatabaseError> {
        sqlx::query_as::<_, CommissionRow>(&format!(
            "SELECT {COMMISSION_COLUMNS} FROM commission_records WHERE policy_id = $1"
        ))
        .bind(policy_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(CommissionRow::into_record)
        .transpose()
    }

    async fn fetch_commission(&self, id: CommissionId) -> Result<Option<CommissionRecord>, DatabaseError> {
        sqlx::query_as::<_, CommissionRow>(&format!(
            "SELECT {COMMISSION_COLUMNS} FROM commission_records WHERE commission_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(CommissionRow::into_record)
        .transpose()
    }

    /// Sets `received_from_insurer` unless already set
    #[instrument(skip(self), fields(commission_id = %id))]
    pub async fn mark_received(
        &self,
        id: CommissionId,
        at: DateTime<Utc>,
    ) -> Result<(CommissionRecord, TransitionOutcome), DatabaseError> {
        let updated = sqlx::query_as::<_, CommissionRow>(&format!(
            r#"
            UPDATE commission_records
            SET received_from_insurer = TRUE, received_at = $2
            WHERE commission_id = $1 AND NOT received_from_insurer
            RETURNING {COMMISSION_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => Ok((row.into_record()?, TransitionOutcome::Applied)),
            None => Ok((self.get_commission(id).await?, TransitionOutcome::AlreadyProcessed)),
        }
    }

    /// Sets `paid_to_sub_agent` unless already set or there is no sub-agent
    #[instrument(skip(self), fields(commission_id = %id))]
    pub async fn mark_paid_to_sub_agent(
        &self,
        id: CommissionId,
        at: DateTime<Utc>,
    ) -> Result<FlagUpdate, DatabaseError> {
        let updated = sqlx::query_as::<_, CommissionRow>(&format!(
            r#"
            UPDATE commission_records
            SET paid_to_sub_agent = TRUE, paid_at = $2
            WHERE commission_id = $1 AND sub_agent_id IS NOT NULL AND NOT paid_to_sub_agent
            RETURNING {COMMISSION_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(FlagUpdate::Moved(row.into_record()?, TransitionOutcome::Applied));
        }

        let current = self.get_commission(id).await?;
        if current.has_sub_agent() {
            Ok(FlagUpdate::Moved(current, TransitionOutcome::AlreadyProcessed))
        } else {
            Ok(FlagUpdate::NoSubAgent(current))
        }
    }

    /// Records matching every set filter, oldest first
    pub async fn find(&self, query: &CommissionQuery) -> Result<Vec<CommissionRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, CommissionRow>(&format!(
            r#"
            SELECT {COMMISSION_COLUMNS}
            FROM commission_records
            WHERE ($1::uuid IS NULL OR agent_id = $1)
              AND ($2::uuid IS NULL OR sub_agent_id = $2)
              AND ($3::boolean IS NULL OR received_from_insurer = $3)
              AND ($4::boolean IS NULL OR paid_to_sub_agent = $4)
              AND ($5::boolean IS NULL OR (sub_agent_id IS NOT NULL) = $5)
            ORDER BY created_at, commission_id
            LIMIT $6
            "#
        ))
        .bind(query.agent_id.map(Uuid::from))
        .bind(query.sub_agent_id.map(Uuid::from))
        .bind(query.received_from_insurer)
        .bind(query.paid_to_sub_agent)
        .bind(query.has_sub_agent)
        .bind(query.limit.map(i64::from))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CommissionRow::into_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn commission_row(origin: DbRateOrigin, rule_id: Option<Uuid>, rate: Option<Decimal>) -> CommissionRow {
        CommissionRow {
            commission_id: Uuid::new_v4(),
            policy_id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
            sub_agent_id: None,
            currency: "INR".to_string(),
            total_commission: dec!(1500),
            agent_commission: dec!(1500),
            sub_agent_commission: None,
            broker_override: None,
            rate_origin: origin,
            rule_id,
            tier_rate_percent: rate,
            received_from_insurer: false,
            received_at: None,
            paid_to_sub_agent: false,
            paid_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rate_table_origin_restored() {
        let rule = Uuid::new_v4();
        let record = commission_row(DbRateOrigin::RateTable, Some(rule), Some(dec!(15)))
            .into_record()
            .unwrap();

        assert_eq!(
            record.origin,
            RateOrigin::RateTable {
                rule_id: CommissionRuleId::from_uuid(rule),
                rate: Rate::from_percentage(dec!(15)),
            }
        );
        assert_eq!(record.total_commission, Money::new(dec!(1500), Currency::INR));
    }

    #[test]
    fn test_rate_table_origin_without_rule_is_corrupt() {
        let row = commission_row(DbRateOrigin::RateTable, None, Some(dec!(15)));
        assert!(matches!(row.into_record(), Err(DatabaseError::CorruptRow(_))));
    }

    #[test]
    fn test_origin_columns_round_trip() {
        let origin = RateOrigin::RateTable {
            rule_id: CommissionRuleId::new(),
            rate: Rate::from_percentage(dec!(17.5)),
        };
        let (kind, rule_id, rate) = origin_columns(&origin);
        let mut row = commission_row(kind, rule_id, rate);
        row.currency = "USD".to_string();

        assert_eq!(row.into_record().unwrap().origin, origin);
        assert_eq!(origin_columns(&RateOrigin::Manual), (DbRateOrigin::Manual, None, None));
    }

    #[test]
    fn test_motor_policy_without_cover_is_corrupt() {
        let row = PolicyRow {
            policy_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            insurer_id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
            sub_agent_id: None,
            category: DbPolicyCategory::Motor,
            effective_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            currency: "INR".to_string(),
            premium_kind: DbPremiumKind::Motor,
            motor_cover: None,
            total_premium: dec!(12000),
            od_premium: Some(dec!(8000)),
            tp_premium: Some(dec!(4000)),
            net_premium: None,
            commission_rate: None,
            od_rate: None,
            tp_rate: None,
            net_rate: None,
            sub_agent_od_rate: None,
            sub_agent_tp_rate: None,
            sub_agent_net_rate: None,
            broker_override: None,
        };
        assert!(matches!(row.into_terms(), Err(DatabaseError::CorruptRow(_))));
    }
}
