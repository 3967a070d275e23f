use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use ogw_gateway::config::GatewayConfig;
use ogw_telemetry::install as init_telemetry;

#[derive(Parser, Debug)]
#[command(name = "ogw-gateway", version, about = "Outbound message gateway")]
struct Args {
    /// Path to the gateway YAML config; built-in defaults apply when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let metrics = init_telemetry("ogw-gateway")?;

    let args = Args::parse();
    let config = match args.config {
        Some(path) => GatewayConfig::load(&path)?,
        None => GatewayConfig::default(),
    };
    ogw_gateway::run(config, Some(metrics)).await
}
