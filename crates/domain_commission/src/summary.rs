//! Read-side commission summaries
//!
//! Projections over commission records for the reminder job and operator
//! reports. Nothing here is persisted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use core_kernel::{AgentId, Currency, Money};

use crate::error::CommissionError;
use crate::record::CommissionRecord;

/// Totals over a set of commission records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSummary {
    pub record_count: usize,
    pub total_commission: Money,
    pub received: Money,
    pub pending_receipt: Money,
    pub sub_agent_total: Money,
    pub sub_agent_paid: Money,
    pub sub_agent_pending: Money,
}

impl CommissionSummary {
    pub fn empty(currency: Currency) -> Self {
        Self {
            record_count: 0,
            total_commission: Money::zero(currency),
            received: Money::zero(currency),
            pending_receipt: Money::zero(currency),
            sub_agent_total: Money::zero(currency),
            sub_agent_paid: Money::zero(currency),
            sub_agent_pending: Money::zero(currency),
        }
    }

    fn add(&mut self, record: &CommissionRecord) -> Result<(), CommissionError> {
        let total = &record.total_commission;
        self.record_count += 1;
        self.total_commission = self.total_commission.checked_add(total)?;
        if record.received_from_insurer {
            self.received = self.received.checked_add(total)?;
        } else {
            self.pending_receipt = self.pending_receipt.checked_add(total)?;
        }

        if let Some(sub) = &record.sub_agent_commission {
            self.sub_agent_total = self.sub_agent_total.checked_add(sub)?;
            if record.paid_to_sub_agent {
                self.sub_agent_paid = self.sub_agent_paid.checked_add(sub)?;
            } else {
                self.sub_agent_pending = self.sub_agent_pending.checked_add(sub)?;
            }
        }
        Ok(())
    }
}

/// Summarises records that all carry `currency`
pub fn summarize<'a, I>(currency: Currency, records: I) -> Result<CommissionSummary, CommissionError>
where
    I: IntoIterator<Item = &'a CommissionRecord>,
{
    let mut summary = CommissionSummary::empty(currency);
    for record in records {
        summary.add(record)?;
    }
    Ok(summary)
}

/// One summary per agent
pub fn summarize_by_agent<'a, I>(
    currency: Currency,
    records: I,
) -> Result<BTreeMap<AgentId, CommissionSummary>, CommissionError>
where
    I: IntoIterator<Item = &'a CommissionRecord>,
{
    let mut by_agent: BTreeMap<AgentId, CommissionSummary> = BTreeMap::new();
    for record in records {
        by_agent
            .entry(record.agent_id)
            .or_insert_with(|| CommissionSummary::empty(currency))
            .add(record)?;
    }
    Ok(by_agent)
}
