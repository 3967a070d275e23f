pub mod config;
pub mod dispatch;
pub mod http;
mod main_logic;

use std::sync::Arc;

use anyhow::Result;
use ogw_core::{Dispatcher, OutboundService};

use crate::config::GatewayConfig;
pub use dispatch::BusDispatcher;
pub use main_logic::run;
pub use ogw_bus::{BusClient, BusError, InMemoryBusClient, NatsBusClient};

/// Builds the request pipeline from configuration and a dispatcher.
pub fn build_service(
    config: &GatewayConfig,
    dispatcher: Arc<dyn Dispatcher>,
) -> Result<OutboundService> {
    let resolver = config.build_resolver()?;
    Ok(OutboundService::new(resolver, dispatcher).with_builder(config.envelope_builder()))
}

/// Dispatcher publishing on the given bus with the configured subject layout.
pub fn bus_dispatcher(config: &GatewayConfig, bus: Arc<dyn BusClient>) -> BusDispatcher {
    BusDispatcher::new(bus, config.subject_prefix.clone(), config.env.clone())
}
