use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::{DispatchError, OutboundEnvelope};

/// Hands accepted envelopes to the delivery subsystem.
///
/// A successful return means the envelope was accepted for delivery, not
/// that it reached the recipient.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, envelope: &OutboundEnvelope) -> Result<(), DispatchError>;
}

/// Dispatcher that only logs. Useful for local runs without a bus.
#[derive(Default)]
pub struct LoggingDispatcher;

#[async_trait]
impl Dispatcher for LoggingDispatcher {
    async fn dispatch(&self, envelope: &OutboundEnvelope) -> Result<(), DispatchError> {
        info!(
            message_id = %envelope.id(),
            adapter_id = %envelope.adapter_id,
            channel = %envelope.channel_uri,
            provider = %envelope.provider_uri,
            transformers = envelope.transformers.len(),
            "LoggingDispatcher accepted envelope"
        );
        Ok(())
    }
}

/// In-memory dispatcher used in tests.
#[derive(Clone, Default)]
pub struct InMemoryDispatcher {
    dispatched: Arc<Mutex<Vec<OutboundEnvelope>>>,
}

impl InMemoryDispatcher {
    pub async fn take_dispatched(&self) -> Vec<OutboundEnvelope> {
        let mut guard = self.dispatched.lock().await;
        std::mem::take(&mut *guard)
    }
}

#[async_trait]
impl Dispatcher for InMemoryDispatcher {
    async fn dispatch(&self, envelope: &OutboundEnvelope) -> Result<(), DispatchError> {
        self.dispatched.lock().await.push(envelope.clone());
        Ok(())
    }
}
