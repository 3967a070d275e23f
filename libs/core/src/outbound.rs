use crate::{Address, AdapterInfo, MessagePayload, Transformer, ValidatedRequest};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Sender identity stamped on every envelope unless configured otherwise.
pub const DEFAULT_SENDER_ID: &str = "admin";
/// Application name stamped on every envelope unless configured otherwise.
pub const DEFAULT_APP_NAME: &str = "Global Outbound Bot";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageState {
    /// Outbound sends always answer an existing conversation context.
    Replied,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Media travels inside the payload; the type stays `TEXT`.
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageId {
    pub channel_message_id: String,
    pub reply_id: String,
}

/// Canonical, provider-agnostic outbound message handed to the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEnvelope {
    pub app: String,
    pub adapter_id: String,
    pub session_id: String,
    pub from: Address,
    pub to: Address,
    pub message_id: MessageId,
    pub message_state: MessageState,
    pub message_type: MessageType,
    pub payload: MessagePayload,
    #[serde(rename = "providerURI")]
    pub provider_uri: String,
    #[serde(rename = "channelURI")]
    pub channel_uri: String,
    #[serde(default)]
    pub transformers: Vec<Transformer>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl OutboundEnvelope {
    pub fn id(&self) -> &str {
        &self.message_id.channel_message_id
    }
}

/// Builds [`OutboundEnvelope`]s with a fixed sender identity.
///
/// ```
/// use ogw_core::{Address, AdapterInfo, EnvelopeBuilder, MessagePayload, ValidatedRequest};
///
/// let builder = EnvelopeBuilder::default();
/// let request = ValidatedRequest {
///     adapter_id: "a1".into(),
///     to: Address::system("u1"),
///     payload: MessagePayload { text: Some("hi".into()), media: None },
/// };
/// let env = builder.build(request, &AdapterInfo::new("whatsapp", "gupshup"), Vec::new());
/// assert_eq!(env.message_id.reply_id, "u1");
/// assert_eq!(env.from.user_id, "admin");
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    sender: Address,
    app: String,
}

impl Default for EnvelopeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SENDER_ID, DEFAULT_APP_NAME)
    }
}

impl EnvelopeBuilder {
    pub fn new(sender_id: impl Into<String>, app: impl Into<String>) -> Self {
        Self {
            sender: Address::system(sender_id),
            app: app.into(),
        }
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn build(
        &self,
        request: ValidatedRequest,
        adapter: &AdapterInfo,
        transformers: Vec<Transformer>,
    ) -> OutboundEnvelope {
        self.build_at(request, adapter, transformers, OffsetDateTime::now_utc())
    }

    /// Same as [`EnvelopeBuilder::build`] with an explicit creation time.
    pub fn build_at(
        &self,
        request: ValidatedRequest,
        adapter: &AdapterInfo,
        transformers: Vec<Transformer>,
        now: OffsetDateTime,
    ) -> OutboundEnvelope {
        let ValidatedRequest {
            adapter_id,
            to,
            payload,
        } = request;
        let message_id = MessageId {
            channel_message_id: Uuid::new_v4().to_string(),
            reply_id: to.user_id.clone(),
        };
        OutboundEnvelope {
            app: self.app.clone(),
            adapter_id,
            session_id: Uuid::new_v4().to_string(),
            from: self.sender.clone(),
            to,
            message_id,
            message_state: MessageState::Replied,
            message_type: MessageType::Text,
            payload,
            provider_uri: adapter.provider.clone(),
            channel_uri: adapter.channel.clone(),
            transformers,
            timestamp: (now.unix_timestamp_nanos() / 1_000_000) as i64,
        }
    }
}
