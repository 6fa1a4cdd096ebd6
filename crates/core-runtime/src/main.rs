//! # Bucu Core
//!
//! Runs the core until Ctrl-C.
//!
//! ## Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `BUCU_CONFIG` | JSON config file merged over the defaults |
//! | `BUCU__SECTION__KEY` | override one config value |
//! | `BUCU_LOG_LEVEL` / `RUST_LOG` | log filter |
//! | `BUCU_JSON_LOGS` | JSON log output |

use anyhow::{Context, Result};
use bucu_telemetry::{init_telemetry, TelemetryConfig};
use core_runtime::container::load_config;
use core_runtime::CoreRuntime;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("failed to initialize telemetry")?;

    let config = load_config().context("failed to load configuration")?;
    let mut runtime = CoreRuntime::new(config);
    let summary = runtime.start();

    for (name, reason) in runtime.container().loader.failed_modules() {
        error!("[Core] Module '{}' failed: {}", name, reason);
    }
    let status = serde_json::to_string(&runtime.container().status())
        .context("failed to encode status")?;
    info!(status = %status, loaded = summary.loaded, "[Core] Status");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    runtime.shutdown().await;
    info!("[Core] Goodbye");
    Ok(())
}
