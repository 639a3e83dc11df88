//! Test Utilities Crate
//!
//! Shared test infrastructure for the commission engine and client ledger.
//!
//! # Modules
//!
//! - `fixtures`: the worked scenarios as ready-made rules, policies and entries
//! - `builders`: builders for policy terms and ledger entries
//! - `database`: PostgreSQL test containers with the schema migrated
//! - `assertions`: assertion helpers for money, settlements and transitions
//! - `generators`: proptest strategies for premiums, rates and entries

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
