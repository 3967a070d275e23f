use std::collections::BTreeMap;
use std::fs;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ogw_core::{
    AdapterInfo, AdapterResolver, DEFAULT_APP_NAME, DEFAULT_SENDER_ID, EnvelopeBuilder,
    HttpAdapterResolver, StaticAdapterResolver,
};
use serde::Deserialize;

const DEFAULT_RESOLVER_TIMEOUT_MS: u64 = 5_000;

/// Gateway settings, read from a YAML file. Every field has a default so an
/// empty file (or no file) yields a runnable local setup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    pub env: String,
    pub bind_addr: SocketAddr,
    /// When unset, accepted envelopes are only logged.
    pub nats_url: Option<String>,
    pub subject_prefix: String,
    pub sender: String,
    pub app_name: String,
    pub resolver: ResolverConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            env: "dev".into(),
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080)),
            nats_url: None,
            subject_prefix: ogw_bus::OUTBOUND_SUBJECT_PREFIX.to_string(),
            sender: DEFAULT_SENDER_ID.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            resolver: ResolverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", deny_unknown_fields)]
pub enum ResolverConfig {
    /// Adapter table kept in the config file, keyed by adapter id.
    Static {
        #[serde(default)]
        adapters: BTreeMap<String, AdapterInfo>,
    },
    /// Adapter administration service.
    Http {
        base_url: String,
        #[serde(default = "default_resolver_timeout_ms")]
        timeout_ms: u64,
    },
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig::Static {
            adapters: BTreeMap::new(),
        }
    }
}

fn default_resolver_timeout_ms() -> u64 {
    DEFAULT_RESOLVER_TIMEOUT_MS
}

impl GatewayConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read gateway config {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("{} is not a valid gateway config", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml_bw::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.env.trim().is_empty() {
            bail!("env must not be empty");
        }
        if self.sender.trim().is_empty() {
            bail!("sender must not be empty");
        }
        match &self.resolver {
            ResolverConfig::Http { base_url, .. } if base_url.trim().is_empty() => {
                bail!("resolver.base_url must not be empty")
            }
            _ => Ok(()),
        }
    }

    pub fn build_resolver(&self) -> Result<Arc<dyn AdapterResolver>> {
        match &self.resolver {
            ResolverConfig::Static { adapters } => Ok(Arc::new(
                adapters
                    .iter()
                    .map(|(id, adapter)| (id.clone(), adapter.clone()))
                    .collect::<StaticAdapterResolver>(),
            )),
            ResolverConfig::Http {
                base_url,
                timeout_ms,
            } => Ok(Arc::new(
                HttpAdapterResolver::new(base_url.clone(), Duration::from_millis(*timeout_ms))
                    .context("failed to build adapter service client")?,
            )),
        }
    }

    pub fn envelope_builder(&self) -> EnvelopeBuilder {
        EnvelopeBuilder::new(self.sender.clone(), self.app_name.clone())
    }
}
