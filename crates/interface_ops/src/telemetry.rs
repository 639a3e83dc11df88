//! Tracing subscriber setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogFormat;
use crate::error::OpsError;

/// `RUST_LOG` when set, otherwise `log_level`, otherwise `info`
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing(log_level: &str, format: LogFormat) -> Result<(), OpsError> {
    let registry = tracing_subscriber::registry().with(env_filter(log_level));
    let result = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|e| OpsError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        let _ = init_tracing("warn", LogFormat::Pretty);
        assert!(matches!(
            init_tracing("warn", LogFormat::Json),
            Err(OpsError::Telemetry(_))
        ));
    }
}
