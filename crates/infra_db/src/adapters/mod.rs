//! Domain Adapters
//!
//! PostgreSQL implementations of the domain port traits. Each adapter wraps
//! a repository, and a clone of the pool for health checks.
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresCommissionStore, PostgresRuleStore};
//! use domain_commission::CommissionService;
//!
//! let service = CommissionService::new(
//!     Arc::new(PostgresRuleStore::new(pool.clone())),
//!     Arc::new(PostgresCommissionStore::new(pool)),
//! );
//! ```

pub mod commission;
pub mod khata;

pub use commission::{PostgresCommissionStore, PostgresRuleStore};
pub use khata::PostgresKhataStore;

use chrono::Utc;

use core_kernel::{AdapterHealth, HealthCheckResult};

use crate::pool::DatabasePool;

/// Round-trips `SELECT 1` and reports the latency
pub(crate) async fn ping(pool: &DatabasePool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();

    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;

    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: Utc::now(),
        },
        Err(e) => HealthCheckResult {
            adapter_id: adapter_id.to_string(),
            status: AdapterHealth::Unhealthy,
            latency_ms,
            message: Some(format!("Database error: {}", e)),
            checked_at: Utc::now(),
        },
    }
}
