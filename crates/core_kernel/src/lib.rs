//! Core Kernel - Foundational types for the commission engine
//!
//! Shared by every domain crate:
//! - Money and percentage rates with exact decimal arithmetic
//! - Effective-date periods for rule validity
//! - Strongly typed identifiers
//! - Port plumbing for the hexagonal adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate, round_half_up};
pub use temporal::{EffectivePeriod, TemporalError};
pub use identifiers::{
    PolicyId, ClientId, InsurerId, AgentId, SubAgentId,
    CommissionRuleId, CommissionId, LedgerEntryId,
};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
