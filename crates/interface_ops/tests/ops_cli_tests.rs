//! commission-ops commands against in-memory stores

use std::path::PathBuf;
use std::sync::Arc;

use rust_decimal_macros::dec;
use serde::Serialize;

use core_kernel::{CommissionId, Currency, EffectivePeriod, LedgerEntryId};
use domain_commission::adapters::{InMemoryCommissionStore, InMemoryRuleStore};
use domain_commission::{CommissionError, CommissionRule, CommissionService, PolicyCategory, RuleStore};
use domain_khata::adapters::InMemoryKhataStore;
use domain_khata::{EntryType, KhataError, KhataService};
use interface_ops::{execute, Command, Engine, OpsError};
use test_utils::*;

async fn run(engine: &Engine, command: Command, json: bool) -> Result<String, OpsError> {
    let mut out = Vec::new();
    execute(command, engine, json, &mut out).await?;
    Ok(String::from_utf8(out).unwrap())
}

async fn engine_with_rules(rules: Vec<CommissionRule>) -> Engine {
    let rule_store = Arc::new(InMemoryRuleStore::new());
    for rule in rules {
        rule_store.save_rule(rule).await.unwrap();
    }
    let commissions = CommissionService::new(rule_store, Arc::new(InMemoryCommissionStore::new()));
    let khata = KhataService::new(Arc::new(InMemoryKhataStore::new()));
    Engine::new(commissions, khata)
}

fn json_file<T: Serialize>(value: &T) -> PathBuf {
    text_file(&serde_json::to_string_pretty(value).unwrap())
}

fn text_file(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("commission-ops-{}.json", CommissionId::new()));
    std::fs::write(&path, contents).unwrap();
    path
}

// ============= Khata Commands =============

mod khata {
    use super::*;

    #[tokio::test]
    async fn test_balance_reports_amount_owed() {
        let engine = Engine::in_memory(Currency::INR);
        let client = IdFixtures::client();
        for entry in LedgerFixtures::outstanding(client) {
            engine.khata.post(entry).await.unwrap();
        }

        let text = run(&engine, Command::Balance { client }, false).await.unwrap();

        assert!(text.contains("20000.00"), "{}", text);
        assert!(text.contains("Owes"), "{}", text);
    }

    #[tokio::test]
    async fn test_statement_as_json() {
        let engine = Engine::in_memory(Currency::INR);
        let client = IdFixtures::client();
        for entry in LedgerFixtures::outstanding(client) {
            engine.khata.post(entry).await.unwrap();
        }

        let json = run(&engine, Command::Statement { client }, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["lines"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_pending_collections_skip_settled_clients() {
        let engine = Engine::in_memory(Currency::INR);
        let owing = IdFixtures::client();
        let settled = core_kernel::ClientId::new();
        for entry in LedgerFixtures::outstanding(owing) {
            engine.khata.post(entry).await.unwrap();
        }
        engine
            .khata
            .post(LedgerFixtures::entry(settled, EntryType::Debit, dec!(500), DateFixtures::day(2)))
            .await
            .unwrap();
        engine
            .khata
            .post(LedgerFixtures::entry(settled, EntryType::Credit, dec!(500), DateFixtures::day(3)))
            .await
            .unwrap();

        let text = run(&engine, Command::PendingCollections, false).await.unwrap();

        assert_eq!(text.lines().count(), 1);
        assert!(text.contains(&owing.to_string()));
        assert!(text.contains("3 entries"));
    }

    #[tokio::test]
    async fn test_post_entry_then_offset_settles_client() {
        let engine = Engine::in_memory(Currency::INR);
        let client = IdFixtures::client();

        let posted = run(
            &engine,
            Command::PostEntry {
                client,
                entry_type: EntryType::Debit,
                amount: dec!(25000),
                date: Some(DateFixtures::day(1)),
                policy: None,
                description: "Premium fronted".to_string(),
            },
            true,
        )
        .await
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&posted).unwrap();
        let entry: LedgerEntryId = value["id"].as_str().unwrap().parse().unwrap();
        assert_eq!(value["entry_type"], "DEBIT");
        assert_eq!(engine.khata.balance(client).await.unwrap().amount(), dec!(25000));

        let text = run(
            &engine,
            Command::Offset {
                entry,
                date: Some(DateFixtures::day(2)),
                reason: "posted to the wrong client".to_string(),
            },
            false,
        )
        .await
        .unwrap();

        assert!(text.contains("CREDIT"), "{}", text);
        assert!(text.contains("wrong client"), "{}", text);
        assert!(engine.khata.balance(client).await.unwrap().is_zero());
        assert_eq!(engine.khata.ledger(client).await.unwrap().entries().len(), 2);
    }

    #[tokio::test]
    async fn test_post_entry_rejects_zero_amount() {
        let engine = Engine::in_memory(Currency::INR);

        let result = run(
            &engine,
            Command::PostEntry {
                client: IdFixtures::client(),
                entry_type: EntryType::Credit,
                amount: dec!(0),
                date: None,
                policy: None,
                description: String::new(),
            },
            false,
        )
        .await;

        assert!(matches!(result, Err(OpsError::Khata(KhataError::InvalidAmount(_)))));
    }

    #[tokio::test]
    async fn test_offset_unknown_entry() {
        let engine = Engine::in_memory(Currency::INR);

        let result = run(
            &engine,
            Command::Offset {
                entry: LedgerEntryId::new(),
                date: None,
                reason: String::new(),
            },
            false,
        )
        .await;

        assert!(matches!(result, Err(OpsError::Khata(KhataError::EntryNotFound(_)))));
    }
}

// ============= Commission Commands =============

mod commission {
    use super::*;

    #[tokio::test]
    async fn test_show_and_verify_commission() {
        let engine = Engine::in_memory(Currency::INR);
        let record = engine
            .commissions
            .create_policy_commission(&PolicyFixtures::motor_with_sub_agent(IdFixtures::insurer()))
            .await
            .unwrap();

        let text = run(&engine, Command::Commission { id: record.id, verify: true }, false)
            .await
            .unwrap();

        assert!(text.contains("1300.00"), "{}", text);
        assert!(text.contains("860.00"), "{}", text);
        assert!(text.contains("verified"), "{}", text);
    }

    #[tokio::test]
    async fn test_mark_received_twice_reports_already_processed() {
        let engine = Engine::in_memory(Currency::INR);
        let record = engine
            .commissions
            .create_policy_commission(&PolicyFixtures::motor_components(IdFixtures::insurer()))
            .await
            .unwrap();

        let first = run(&engine, Command::MarkReceived { id: record.id, at: None }, false)
            .await
            .unwrap();
        let second = run(&engine, Command::MarkReceived { id: record.id, at: None }, true)
            .await
            .unwrap();

        assert!(first.contains("updated"));
        let value: serde_json::Value = serde_json::from_str(&second).unwrap();
        assert_eq!(value["outcome"], "already_processed");
        assert_eq!(value["record"]["received_from_insurer"], true);
    }

    #[tokio::test]
    async fn test_mark_paid_without_sub_agent_fails() {
        let engine = Engine::in_memory(Currency::INR);
        let record = engine
            .commissions
            .create_policy_commission(&PolicyFixtures::motor_components(IdFixtures::insurer()))
            .await
            .unwrap();

        let result = run(&engine, Command::MarkPaid { id: record.id, at: None }, false).await;

        assert!(matches!(
            result,
            Err(OpsError::Commission(CommissionError::NoSubAgentAssigned(_)))
        ));
    }

    #[tokio::test]
    async fn test_preview_from_file_stores_nothing() {
        let engine = Engine::in_memory(Currency::INR);
        let file = json_file(&PolicyFixtures::motor_with_sub_agent(IdFixtures::insurer()));

        let text = run(&engine, Command::Preview { file }, false).await.unwrap();

        assert!(text.contains("1300.00"), "{}", text);
        assert!(text.contains("440.00"), "{}", text);
        assert!(text.contains("860.00"), "{}", text);
        assert!(engine.commissions.pending_receipts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_policy_from_file() {
        let engine = Engine::in_memory(Currency::INR);
        let terms = PolicyFixtures::motor_with_sub_agent(IdFixtures::insurer());
        let file = json_file(&terms);

        let json = run(&engine, Command::CreatePolicy { file: file.clone() }, true)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let id: CommissionId = value["id"].as_str().unwrap().parse().unwrap();

        let record = engine.commissions.get_commission(id).await.unwrap();
        assert_eq!(record.policy_id, terms.policy_id);
        assert_eq!(record.total_commission.amount(), dec!(1300.00));
        assert_eq!(engine.commissions.pending_sub_agent_payouts().await.unwrap().len(), 1);

        let again = run(&engine, Command::CreatePolicy { file }, false).await;
        assert!(matches!(again, Err(OpsError::Commission(CommissionError::Port(_)))));
    }

    #[tokio::test]
    async fn test_create_policy_missing_file() {
        let engine = Engine::in_memory(Currency::INR);
        let file = std::env::temp_dir().join(format!("missing-{}.json", CommissionId::new()));

        let result = run(&engine, Command::CreatePolicy { file }, false).await;

        assert!(matches!(result, Err(OpsError::Input { .. })));
    }

    #[tokio::test]
    async fn test_payout_workflow_end_to_end() {
        let engine = Engine::in_memory(Currency::INR);
        let file = json_file(&PolicyFixtures::motor_with_sub_agent(IdFixtures::insurer()));
        let json = run(&engine, Command::CreatePolicy { file }, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let id: CommissionId = value["id"].as_str().unwrap().parse().unwrap();

        run(&engine, Command::MarkReceived { id, at: None }, false).await.unwrap();
        let paid = run(&engine, Command::MarkPaid { id, at: None }, true).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&paid).unwrap();
        assert_eq!(value["outcome"], "applied");
        assert!(engine.commissions.pending_receipts().await.unwrap().is_empty());
        assert!(engine.commissions.pending_sub_agent_payouts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_commission() {
        let engine = Engine::in_memory(Currency::INR);

        let result = run(
            &engine,
            Command::Commission {
                id: CommissionId::new(),
                verify: false,
            },
            false,
        )
        .await;

        assert!(matches!(
            result,
            Err(OpsError::Commission(CommissionError::CommissionNotFound(_)))
        ));
    }
}

// ============= Maintenance Commands =============

mod maintenance {
    use super::*;

    #[tokio::test]
    async fn test_rules_lint_clean_table() {
        let engine = engine_with_rules(vec![RuleFixtures::health_brackets(IdFixtures::insurer())]).await;

        let text = run(&engine, Command::RulesLint, false).await.unwrap();

        assert!(text.contains("consistent"), "{}", text);
    }

    #[tokio::test]
    async fn test_rules_lint_reports_gap() {
        let rule = CommissionRule::new(
            IdFixtures::insurer(),
            PolicyCategory::Health,
            EffectivePeriod::starting(DateFixtures::rules_from()),
        )
        .with_tier(dec!(0), Some(dec!(50000)), pct(dec!(5)))
        .with_tier(dec!(60000), None, pct(dec!(7)));
        let engine = engine_with_rules(vec![rule]).await;

        let text = run(&engine, Command::RulesLint, false).await.unwrap();

        assert!(text.contains("no tier covers premiums between 50000 and 60000"), "{}", text);
    }

    #[tokio::test]
    async fn test_add_rule_from_file_rates_new_policies() {
        let engine = Engine::in_memory(Currency::INR);
        let insurer = IdFixtures::insurer();
        let file = json_file(&RuleFixtures::health_brackets(insurer));

        let text = run(&engine, Command::AddRule { file }, false).await.unwrap();
        assert!(text.contains("3 tiers"), "{}", text);
        assert!(!text.contains("warning"), "{}", text);

        let record = engine
            .commissions
            .create_policy_commission(&PolicyFixtures::health(insurer, dec!(50000)))
            .await
            .unwrap();
        assert_eq!(record.total_commission.amount(), dec!(3500.00));
    }

    #[tokio::test]
    async fn test_add_rule_warns_about_gaps() {
        let engine = Engine::in_memory(Currency::INR);
        let rule = CommissionRule::new(
            IdFixtures::insurer(),
            PolicyCategory::Health,
            EffectivePeriod::starting(DateFixtures::rules_from()),
        )
        .with_tier(dec!(0), Some(dec!(50000)), pct(dec!(5)))
        .with_tier(dec!(60000), None, pct(dec!(7)));

        let text = run(&engine, Command::AddRule { file: json_file(&rule) }, false)
            .await
            .unwrap();

        assert!(text.contains("warning"), "{}", text);
        assert_eq!(engine.commissions.lint_rules().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_rule_malformed_file() {
        let engine = Engine::in_memory(Currency::INR);

        let result = run(&engine, Command::AddRule { file: text_file("{\"insurer_id\":") }, false).await;

        assert!(matches!(result, Err(OpsError::Json(_))));
    }

    #[tokio::test]
    async fn test_migrate_needs_database() {
        let engine = Engine::in_memory(Currency::INR);

        let result = run(&engine, Command::Migrate, false).await;

        assert!(matches!(result, Err(OpsError::NoDatabase)));
    }
}
