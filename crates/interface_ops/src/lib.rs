//! Operator surface for the commission engine
//!
//! - **Config**: `COMMISSION_*` environment variables over defaults
//! - **Telemetry**: tracing subscriber with pretty or JSON output
//! - **Engine**: services wired to PostgreSQL or in-memory stores
//! - **CLI**: the `commission-ops` commands

pub mod config;
pub mod telemetry;
pub mod engine;
pub mod cli;
pub mod error;

pub use config::{LogFormat, OpsConfig};
pub use telemetry::init_tracing;
pub use engine::Engine;
pub use cli::{execute, Cli, Command};
pub use error::OpsError;
