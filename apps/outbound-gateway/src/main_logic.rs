use std::sync::Arc;

use anyhow::{Context, Result};
use axum::serve;
use ogw_core::{Dispatcher, LoggingDispatcher};
use ogw_telemetry::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::GatewayConfig;
use crate::http::build_router;
use crate::{NatsBusClient, build_service, bus_dispatcher};

/// Starts the gateway HTTP server using the provided configuration.
/// `metrics` backs `GET /metrics` when set.
pub async fn run(config: GatewayConfig, metrics: Option<PrometheusHandle>) -> Result<()> {
    let dispatcher: Arc<dyn Dispatcher> = match &config.nats_url {
        Some(url) => {
            let nats = async_nats::connect(url.as_str())
                .await
                .with_context(|| format!("failed to connect to NATS at {url}"))?;
            info!(%url, prefix = %config.subject_prefix, "dispatching outbound envelopes over NATS");
            Arc::new(bus_dispatcher(&config, Arc::new(NatsBusClient::new(nats))))
        }
        None => {
            warn!("no nats_url configured; accepted envelopes are only logged");
            Arc::new(LoggingDispatcher)
        }
    };

    let service = build_service(&config, dispatcher)?;
    let router = build_router(service, metrics);
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("ogw-gateway listening on {}", config.bind_addr);

    serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
