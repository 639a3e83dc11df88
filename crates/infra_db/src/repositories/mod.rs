//! Repository implementations
//!
//! Repositories own the SQL and map between database rows and domain types.
//! Queries are built at runtime so the crate compiles without a live
//! database; the row structs derive `FromRow`.

pub mod types;
pub mod rules;
pub mod commissions;
pub mod khata;

pub use rules::RuleRepository;
pub use commissions::{CommissionRepository, FlagUpdate};
pub use khata::KhataRepository;
