//! Infrastructure Database Layer
//!
//! PostgreSQL storage for the commission engine and the client ledger,
//! built on SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL and map rows to domain types. Adapters wrap a
//! repository and implement the domain port traits, translating
//! [`DatabaseError`] into `PortError`.
//!
//! # Concurrency
//!
//! - A policy and its commission record are inserted in one transaction.
//! - Receipt and payout flags move through a conditional
//!   `UPDATE ... WHERE flag = FALSE`, so concurrent calls apply once.
//! - Ledger entries are append-only; a trigger rejects updates and deletes.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresCommissionStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/commission")).await?;
//! run_migrations(&pool).await?;
//! let commissions = PostgresCommissionStore::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use repositories::{CommissionRepository, KhataRepository, RuleRepository};
pub use adapters::{PostgresCommissionStore, PostgresKhataStore, PostgresRuleStore};
