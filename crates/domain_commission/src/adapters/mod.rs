//! Adapters for the commission ports
//!
//! The in-memory stores back the unit and service tests and can be used to
//! embed the engine without a database. PostgreSQL adapters live in
//! `infra_db`.

pub mod memory;

pub use memory::{InMemoryCommissionStore, InMemoryRuleStore};
