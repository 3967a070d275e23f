use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Send request as received from a caller.
///
/// Every field is optional on the wire so that the validator, not the JSON
/// decoder, decides which error the caller sees.
///
/// ```
/// use ogw_core::SendRequest;
///
/// let req: SendRequest = serde_json::from_str(
///     r#"{"adapterId":"a1","to":{"userId":"u1","deviceType":"mobile"},"payload":{"text":"hi"}}"#,
/// )
/// .unwrap();
/// assert_eq!(req.adapter_id.as_deref(), Some("a1"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    pub adapter_id: Option<String>,
    #[serde(default)]
    pub to: Option<Recipient>,
    #[serde(default)]
    pub payload: Option<Payload>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(default, alias = "userID")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    /// Channel-specific side data (`templateId`, `fcmToken`, ...). Values are
    /// kept as raw JSON here; the validator drops nulls and flattens scalars.
    #[serde(default)]
    pub meta: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<Media>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Media {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// A sender or receiver identity as carried on the outbound envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl Address {
    /// Identity without device or metadata, used for the system sender.
    pub fn system(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            device_type: None,
            meta: BTreeMap::new(),
        }
    }

    /// Returns a metadata value, treating empty strings as absent.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaRef>,
}

impl MessagePayload {
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }
}

/// A [`SendRequest`] that passed structural validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub adapter_id: String,
    pub to: Address,
    pub payload: MessagePayload,
}

/// Adapter metadata returned by an [`crate::AdapterResolver`].
///
/// ```
/// use ogw_core::AdapterInfo;
///
/// let adapter = AdapterInfo::new("WhatsApp", "Gupshup");
/// assert!(adapter.is_channel("whatsapp"));
/// assert!(adapter.is_provider("GUPSHUP"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdapterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub channel: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

impl AdapterInfo {
    pub fn new(channel: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: None,
            name: None,
            channel: channel.into(),
            provider: provider.into(),
            config: Value::Null,
        }
    }

    pub fn is_channel(&self, channel: &str) -> bool {
        self.channel.eq_ignore_ascii_case(channel)
    }

    pub fn is_provider(&self, provider: &str) -> bool {
        self.provider.eq_ignore_ascii_case(provider)
    }
}

/// Policy annotation consumed by provider-specific dispatch logic downstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transformer {
    pub name: String,
    #[serde(default)]
    pub meta_data: BTreeMap<String, String>,
}

impl Transformer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meta_data: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta_data.insert(key.into(), value.into());
        self
    }
}
