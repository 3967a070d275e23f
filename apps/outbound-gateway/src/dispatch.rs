use std::sync::Arc;

use async_trait::async_trait;
use ogw_bus::{BusClient, BusError, outbound_subject};
use ogw_core::{DispatchError, Dispatcher, OutboundEnvelope};
use tracing::debug;

/// Publishes accepted envelopes as JSON on `{prefix}.{env}.{channel}.{provider}`.
pub struct BusDispatcher {
    bus: Arc<dyn BusClient>,
    subject_prefix: String,
    env: String,
}

impl BusDispatcher {
    pub fn new(
        bus: Arc<dyn BusClient>,
        subject_prefix: impl Into<String>,
        env: impl Into<String>,
    ) -> Self {
        Self {
            bus,
            subject_prefix: subject_prefix.into(),
            env: env.into(),
        }
    }

    pub fn subject_for(&self, envelope: &OutboundEnvelope) -> String {
        outbound_subject(
            &self.subject_prefix,
            &self.env,
            &envelope.channel_uri,
            &envelope.provider_uri,
        )
    }
}

#[async_trait]
impl Dispatcher for BusDispatcher {
    async fn dispatch(&self, envelope: &OutboundEnvelope) -> Result<(), DispatchError> {
        let subject = self.subject_for(envelope);
        let value = serde_json::to_value(envelope).map_err(DispatchError::Serialize)?;
        self.bus
            .publish_value(&subject, value)
            .await
            .map_err(|err| match err {
                BusError::Publish(e) => DispatchError::Transport(e),
            })?;
        debug!(%subject, message_id = %envelope.id(), "published outbound envelope");
        Ok(())
    }
}
