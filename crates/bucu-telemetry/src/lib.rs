//! # Bucu Telemetry
//!
//! Logging and metrics setup shared by the runtime binary and tests.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an `EnvFilter` and either
//!   a human-readable or a JSON `fmt` layer
//! - **Metrics**: Prometheus gauges in a process registry, refreshed from
//!   service snapshots and rendered in text exposition format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bucu_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BUCU_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter directives |
//! | `BUCU_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `BUCU_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |
//! | `BUCU_SERVICE_NAME` | `bucu-core` | `service` field on startup logs |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{encode_metrics, record_snapshot, register_metrics, MetricsSnapshot};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global subscriber.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry...");
    }
}
