use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::{AdapterInfo, ResolveError};

/// Looks up adapter metadata by adapter id.
///
/// Implementations own their transport and storage; the pipeline neither
/// retries nor caches lookups.
#[async_trait]
pub trait AdapterResolver: Send + Sync {
    async fn resolve(&self, adapter_id: &str) -> Result<AdapterInfo, ResolveError>;
}

/// Resolver backed by a fixed table, used for configuration-driven deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAdapterResolver {
    adapters: HashMap<String, AdapterInfo>,
}

impl StaticAdapterResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_adapter(mut self, adapter_id: impl Into<String>, adapter: AdapterInfo) -> Self {
        self.insert(adapter_id, adapter);
        self
    }

    pub fn insert(&mut self, adapter_id: impl Into<String>, mut adapter: AdapterInfo) {
        let adapter_id = adapter_id.into();
        adapter.id.get_or_insert_with(|| adapter_id.clone());
        self.adapters.insert(adapter_id, adapter);
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, AdapterInfo)> for StaticAdapterResolver {
    fn from_iter<I: IntoIterator<Item = (K, AdapterInfo)>>(iter: I) -> Self {
        let mut resolver = Self::new();
        for (id, adapter) in iter {
            resolver.insert(id, adapter);
        }
        resolver
    }
}

#[async_trait]
impl AdapterResolver for StaticAdapterResolver {
    async fn resolve(&self, adapter_id: &str) -> Result<AdapterInfo, ResolveError> {
        self.adapters
            .get(adapter_id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(adapter_id.to_string()))
    }
}

/// Resolver calling an adapter administration service over HTTP
/// (`GET {base_url}/admin/adapter/{id}`).
#[derive(Clone)]
pub struct HttpAdapterResolver {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AdapterDocument {
    Wrapped { result: AdapterInfo },
    Bare(AdapterInfo),
}

impl HttpAdapterResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn adapter_url(&self, adapter_id: &str) -> String {
        format!(
            "{}/admin/adapter/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(adapter_id)
        )
    }
}

#[async_trait]
impl AdapterResolver for HttpAdapterResolver {
    async fn resolve(&self, adapter_id: &str) -> Result<AdapterInfo, ResolveError> {
        let url = self.adapter_url(adapter_id);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| ResolveError::Unavailable(err.into()))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ResolveError::NotFound(adapter_id.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ResolveError::Unavailable(anyhow!(
                "adapter service returned {status} body={body}"
            )));
        }
        let document: AdapterDocument = resp.json().await.map_err(|err| {
            ResolveError::Unavailable(anyhow!(err).context("malformed adapter document"))
        })?;
        let mut adapter = match document {
            AdapterDocument::Wrapped { result } => result,
            AdapterDocument::Bare(adapter) => adapter,
        };
        adapter.id.get_or_insert_with(|| adapter_id.to_string());
        debug!(
            adapter_id,
            channel = %adapter.channel,
            provider = %adapter.provider,
            "resolved adapter"
        );
        Ok(adapter)
    }
}
