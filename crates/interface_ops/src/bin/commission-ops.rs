//! Commission engine operator CLI
//!
//! # Usage
//!
//! ```bash
//! commission-ops migrate
//! commission-ops balance CLI-<uuid>
//! commission-ops --json statement CLI-<uuid>
//! commission-ops post-entry CLI-<uuid> --type debit --amount 25000 --date 2024-06-01
//! commission-ops offset KHE-<uuid> --reason "posted twice"
//! commission-ops add-rule rule.json
//! commission-ops preview policy.json
//! commission-ops create-policy policy.json
//! commission-ops mark-received COM-<uuid> --at 2024-06-15T10:00:00Z
//! ```
//!
//! # Environment Variables
//!
//! * `COMMISSION_DATABASE_URL` - PostgreSQL connection string
//! * `COMMISSION_CURRENCY` - ledger and commission currency (default: INR)
//! * `COMMISSION_LOG_LEVEL` - used when `RUST_LOG` is unset (default: info)
//! * `COMMISSION_LOG_FORMAT` - `pretty` or `json` (default: pretty)
//! * `COMMISSION_MAX_CONNECTIONS` - pool size (default: 10)

use anyhow::Context;
use clap::Parser;

use interface_ops::{execute, init_tracing, Cli, Engine, OpsConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = OpsConfig::from_env().context("loading configuration")?;
    init_tracing(&config.log_level, config.log_format)?;

    tracing::debug!(command = ?cli.command, "Running command");

    let engine = Engine::connect(&config)
        .await
        .context("connecting to the database")?;

    let mut stdout = std::io::stdout().lock();
    execute(cli.command, &engine, cli.json, &mut stdout).await?;
    Ok(())
}
