use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default prefix for subjects carrying accepted outbound envelopes.
pub const OUTBOUND_SUBJECT_PREFIX: &str = "ogw.outbound";

#[derive(thiserror::Error, Debug)]
pub enum BusError {
    #[error(transparent)]
    Publish(#[from] anyhow::Error),
}

#[async_trait]
pub trait BusClient: Send + Sync {
    async fn publish_value(&self, subject: &str, payload: Value) -> Result<(), BusError>;
}

pub struct NatsBusClient {
    client: async_nats::Client,
}

impl NatsBusClient {
    pub fn new(client: async_nats::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BusClient for NatsBusClient {
    async fn publish_value(&self, subject: &str, payload: Value) -> Result<(), BusError> {
        let bytes =
            serde_json::to_vec(&payload).map_err(|e| BusError::Publish(anyhow::Error::new(e)))?;
        self.client
            .publish(subject.to_string(), bytes.into())
            .await
            .map_err(|err| BusError::Publish(anyhow::Error::new(err)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBusClient {
    published: Arc<Mutex<Vec<(String, Value)>>>,
}

impl InMemoryBusClient {
    pub async fn take_published(&self) -> Vec<(String, Value)> {
        let mut guard = self.published.lock().await;
        std::mem::take(&mut *guard)
    }
}

#[async_trait]
impl BusClient for InMemoryBusClient {
    async fn publish_value(&self, subject: &str, payload: Value) -> Result<(), BusError> {
        let mut guard = self.published.lock().await;
        guard.push((subject.to_string(), payload));
        Ok(())
    }
}

/// Builds `{prefix}.{env}.{channel}.{provider}`, lowercasing the routing tokens
/// and replacing characters NATS treats as separators or wildcards.
pub fn outbound_subject(prefix: &str, env: &str, channel: &str, provider: &str) -> String {
    format!(
        "{}.{}.{}.{}",
        prefix.trim_end_matches('.'),
        subject_token(env),
        subject_token(channel),
        subject_token(provider)
    )
}

fn subject_token(raw: &str) -> String {
    let token: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            '.' | '*' | '>' => '_',
            c if c.is_whitespace() => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect();
    if token.is_empty() {
        "unknown".into()
    } else {
        token
    }
}
