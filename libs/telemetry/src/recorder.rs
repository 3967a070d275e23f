use std::sync::OnceLock;

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the process-wide `metrics` recorder and returns a handle that
/// renders the Prometheus text exposition. Later calls return the same handle.
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    if let Some(handle) = HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    HANDLE.set(handle.clone()).ok();
    Ok(handle)
}
