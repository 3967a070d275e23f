//! Tracing subscriber, metrics recorder and OpenTelemetry export setup shared
//! by outbound gateway binaries.

use anyhow::Result;

mod config;
mod recorder;
mod tracing_init;

pub use config::{TelemetryConfig, TelemetryProtocol};
pub use recorder::install_metrics_recorder;
pub use metrics_exporter_prometheus::PrometheusHandle;
pub use tracing_init::init_tracing;

/// Installs the subscriber configured from the process environment
/// (`RUST_LOG`, `LOG_FORMAT`, `ENABLE_OTEL`, `OTEL_*`) and the global
/// `metrics` recorder.
pub fn install(service_name: &str) -> Result<PrometheusHandle> {
    init_tracing(TelemetryConfig::from_env(
        service_name,
        env!("CARGO_PKG_VERSION"),
    ))?;
    install_metrics_recorder()
}
