//! `commission-ops` commands
//!
//! Parsing lives here rather than in the binary so the commands can be run
//! against an in-memory engine and their output inspected.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;

use core_kernel::{ClientId, CommissionId, LedgerEntryId, PolicyId};
use domain_commission::{
    CommissionPreview, CommissionRecord, CommissionRule, PolicyTerms, Transition, TransitionOutcome,
};
use domain_khata::{BalanceStatus, EntryType, LedgerEntry};

use crate::engine::Engine;
use crate::error::OpsError;

#[derive(Debug, Parser)]
#[command(name = "commission-ops", version, about = "Commission and client ledger operations")]
pub struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Apply pending schema migrations
    Migrate,
    /// Outstanding balance of a client
    Balance { client: ClientId },
    /// Every entry of a client with running balances
    Statement { client: ClientId },
    /// Clients who owe money, largest balance first
    PendingCollections,
    /// Post a debit or credit to a client's ledger
    PostEntry {
        client: ClientId,
        /// debit or credit
        #[arg(long = "type", value_name = "TYPE")]
        entry_type: EntryType,
        #[arg(long)]
        amount: Decimal,
        /// Entry date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        policy: Option<PolicyId>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Cancel a posted entry with an opposite one
    Offset {
        entry: LedgerEntryId,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Compute the commission for a policy file without storing anything
    Preview {
        /// JSON policy terms
        file: PathBuf,
    },
    /// Store a policy file together with its commission record
    CreatePolicy { file: PathBuf },
    /// Store a commission rule read from a JSON file
    AddRule { file: PathBuf },
    /// Show a commission record
    Commission {
        id: CommissionId,
        /// Recompute the total from the stored policy
        #[arg(long)]
        verify: bool,
    },
    /// Record receipt of the commission from the insurer
    MarkReceived {
        id: CommissionId,
        /// RFC 3339 timestamp, defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Record payout of the sub-agent share
    MarkPaid {
        id: CommissionId,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Report tier gaps and overlaps in the rate table
    RulesLint,
}

#[derive(Serialize)]
struct TransitionView<'a> {
    outcome: TransitionOutcome,
    record: &'a CommissionRecord,
}

/// Runs one command, writing its result to `out`
pub async fn execute<W: Write>(command: Command, engine: &Engine, json: bool, out: &mut W) -> Result<(), OpsError> {
    match command {
        Command::Migrate => {
            engine.migrate().await?;
            writeln!(out, "migrations applied")?;
        }
        Command::Balance { client } => {
            let balance = engine.khata.balance(client).await?;
            if json {
                emit_json(out, &balance)?;
            } else {
                let status = BalanceStatus::of(balance.amount());
                writeln!(out, "{}  {}  {:?}", client, balance, status)?;
            }
        }
        Command::Statement { client } => {
            let statement = engine.khata.statement(client).await?;
            if json {
                emit_json(out, &statement)?;
            } else {
                for line in &statement.lines {
                    let entry = &line.entry;
                    writeln!(
                        out,
                        "{}  {:<6}  {:>14}  {:>14}  {}",
                        entry.entry_date,
                        entry.entry_type,
                        entry.amount.amount(),
                        line.running_balance.amount(),
                        entry.description
                    )?;
                }
                writeln!(
                    out,
                    "debits {}  credits {}  closing {}",
                    statement.total_debits, statement.total_credits, statement.closing_balance
                )?;
            }
        }
        Command::PendingCollections => {
            let pending = engine.khata.pending_collections().await?;
            if json {
                emit_json(out, &pending)?;
            } else {
                for p in &pending {
                    writeln!(out, "{}  {}  {} entries", p.client_id, p.total_pending, p.entry_count)?;
                }
            }
        }
        Command::PostEntry {
            client,
            entry_type,
            amount,
            date,
            policy,
            description,
        } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let entry = engine
                .khata
                .append_entry(client, entry_type, amount, description, date, policy)
                .await?;
            write_entry(out, &entry, json)?;
        }
        Command::Offset { entry, date, reason } => {
            let date = date.unwrap_or_else(|| Utc::now().date_naive());
            let offset = engine.khata.offset_entry(entry, date, &reason).await?;
            write_entry(out, &offset, json)?;
        }
        Command::Preview { file } => {
            let terms: PolicyTerms = read_json(&file)?;
            let preview = engine.commissions.preview(&terms).await?;
            if json {
                emit_json(out, &preview)?;
            } else {
                write_preview(out, &preview)?;
            }
        }
        Command::CreatePolicy { file } => {
            let terms: PolicyTerms = read_json(&file)?;
            let record = engine.commissions.create_policy_commission(&terms).await?;
            if json {
                emit_json(out, &record)?;
            } else {
                write_record(out, &record)?;
            }
        }
        Command::AddRule { file } => {
            let rule: CommissionRule = read_json(&file)?;
            let saved = engine.commissions.save_rule(rule).await?;
            if json {
                emit_json(out, &saved)?;
            } else {
                writeln!(
                    out,
                    "{}  insurer {}  {}  {} tiers from {}",
                    saved.id,
                    saved.insurer_id,
                    saved.category,
                    saved.tiers().len(),
                    saved.period.from
                )?;
                for issue in saved.lint() {
                    writeln!(out, "  warning: {}", issue)?;
                }
            }
        }
        Command::Commission { id, verify } => {
            let record = engine.commissions.get_commission(id).await?;
            let verification = if verify {
                Some(engine.commissions.verify_record(id).await?)
            } else {
                None
            };
            if json {
                emit_json(out, &record)?;
                if let Some(v) = &verification {
                    emit_json(out, v)?;
                }
            } else {
                write_record(out, &record)?;
                if let Some(v) = &verification {
                    if v.matches() {
                        writeln!(out, "verified: stored total matches recomputation")?;
                    } else {
                        writeln!(
                            out,
                            "drift: stored {} recomputed {}",
                            v.stored_total, v.recomputed_total
                        )?;
                    }
                }
            }
        }
        Command::MarkReceived { id, at } => {
            let transition = engine.commissions.mark_received(id, at).await?;
            write_transition(out, &transition, json)?;
        }
        Command::MarkPaid { id, at } => {
            let transition = engine.commissions.mark_paid_to_sub_agent(id, at).await?;
            write_transition(out, &transition, json)?;
        }
        Command::RulesLint => {
            let issues = engine.commissions.lint_rules().await?;
            if json {
                emit_json(out, &issues)?;
            } else if issues.is_empty() {
                writeln!(out, "rate table is consistent")?;
            } else {
                for issue in &issues {
                    writeln!(out, "{}", issue)?;
                }
            }
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, OpsError> {
    let input = |source| OpsError::Input {
        path: path.to_path_buf(),
        source,
    };
    let text = std::fs::read_to_string(path).map_err(input)?;
    Ok(serde_json::from_str(&text)?)
}

fn emit_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), OpsError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_record<W: Write>(out: &mut W, record: &CommissionRecord) -> Result<(), OpsError> {
    writeln!(out, "{}  policy {}", record.id, record.policy_id)?;
    writeln!(out, "  total      {}", record.total_commission)?;
    writeln!(out, "  agent      {}", record.agent_commission)?;
    match (&record.sub_agent_id, &record.sub_agent_commission) {
        (Some(sub), Some(amount)) => writeln!(out, "  sub-agent  {}  {}", amount, sub)?,
        _ => writeln!(out, "  sub-agent  none")?,
    }
    writeln!(out, "  receipt    {:?}", record.receipt_state())?;
    if record.has_sub_agent() {
        writeln!(out, "  payout     {:?}", record.payout_state())?;
    }
    Ok(())
}

fn write_entry<W: Write>(out: &mut W, entry: &LedgerEntry, json: bool) -> Result<(), OpsError> {
    if json {
        return emit_json(out, entry);
    }
    writeln!(
        out,
        "{}  {}  {}  {}  {}",
        entry.id, entry.entry_date, entry.entry_type, entry.amount, entry.description
    )?;
    Ok(())
}

fn write_preview<W: Write>(out: &mut W, preview: &CommissionPreview) -> Result<(), OpsError> {
    writeln!(out, "  total      {}", preview.total())?;
    writeln!(out, "  method     {:?}", preview.computation.method)?;
    writeln!(out, "  agent      {}", preview.settlement.agent_amount)?;
    match preview.settlement.sub_agent_amount {
        Some(amount) if preview.settlement.sub_agent_capped => writeln!(out, "  sub-agent  {} (capped)", amount)?,
        Some(amount) => writeln!(out, "  sub-agent  {}", amount)?,
        None => writeln!(out, "  sub-agent  none")?,
    }
    if let Some(resolved) = &preview.resolved {
        writeln!(out, "  rule       {} at {}", resolved.rule_id, resolved.tier.rate)?;
    }
    Ok(())
}

fn write_transition<W: Write>(out: &mut W, transition: &Transition, json: bool) -> Result<(), OpsError> {
    if json {
        return emit_json(
            out,
            &TransitionView {
                outcome: transition.outcome,
                record: &transition.record,
            },
        );
    }
    let verb = match transition.outcome {
        TransitionOutcome::Applied => "updated",
        TransitionOutcome::AlreadyProcessed => "already processed",
    };
    writeln!(out, "{}: {}", transition.record.id, verb)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_balance_with_prefixed_id() {
        let client = ClientId::new();
        let cli = Cli::try_parse_from(["commission-ops", "balance", &client.to_string()]).unwrap();

        assert!(!cli.json);
        assert!(matches!(cli.command, Command::Balance { client: c } if c == client));
    }

    #[test]
    fn test_parses_mark_received_with_timestamp() {
        let id = CommissionId::new();
        let cli = Cli::try_parse_from([
            "commission-ops",
            "--json",
            "mark-received",
            &id.to_string(),
            "--at",
            "2024-06-15T10:00:00Z",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Command::MarkReceived { id: parsed, at } => {
                assert_eq!(parsed, id);
                assert_eq!(at.unwrap().to_rfc3339(), "2024-06-15T10:00:00+00:00");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_id() {
        assert!(Cli::try_parse_from(["commission-ops", "commission", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_command_names_are_kebab_case() {
        assert!(Cli::try_parse_from(["commission-ops", "pending-collections"]).is_ok());
        assert!(Cli::try_parse_from(["commission-ops", "rules-lint"]).is_ok());
        assert!(Cli::try_parse_from(["commission-ops", "create-policy", "policy.json"]).is_ok());
        assert!(Cli::try_parse_from(["commission-ops", "add-rule", "rule.json"]).is_ok());
    }

    #[test]
    fn test_parses_post_entry() {
        let client = ClientId::new();
        let policy = PolicyId::new();
        let cli = Cli::try_parse_from([
            "commission-ops",
            "post-entry",
            &client.to_string(),
            "--type",
            "credit",
            "--amount",
            "10000.50",
            "--date",
            "2024-06-05",
            "--policy",
            &policy.to_string(),
        ])
        .unwrap();

        match cli.command {
            Command::PostEntry {
                client: c,
                entry_type,
                amount,
                date,
                policy: p,
                description,
            } => {
                assert_eq!(c, client);
                assert_eq!(entry_type, EntryType::Credit);
                assert_eq!(amount.to_string(), "10000.50");
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 6, 5));
                assert_eq!(p, Some(policy));
                assert!(description.is_empty());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_entry_type() {
        let client = ClientId::new().to_string();
        let parsed = Cli::try_parse_from(["commission-ops", "post-entry", &client, "--type", "refund", "--amount", "10"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parses_offset_with_reason() {
        let entry = LedgerEntryId::new();
        let cli = Cli::try_parse_from(["commission-ops", "offset", &entry.to_string(), "--reason", "duplicate"]).unwrap();

        match cli.command {
            Command::Offset { entry: e, date, reason } => {
                assert_eq!(e, entry);
                assert!(date.is_none());
                assert_eq!(reason, "duplicate");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_preview_needs_a_file() {
        assert!(Cli::try_parse_from(["commission-ops", "preview"]).is_err());
        let cli = Cli::try_parse_from(["commission-ops", "preview", "policy.json"]).unwrap();
        assert!(matches!(cli.command, Command::Preview { file } if file == PathBuf::from("policy.json")));
    }
}
