//! Channel/provider policy rules applied after an adapter has been resolved.
//!
//! Rules are looked up by the adapter's `(channel, provider)` pair. Rules
//! registered as global run first for every adapter, then the rules keyed to
//! the pair run in registration order. The first rule to fail ends
//! evaluation; transformers from the passing rules are concatenated in order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{AdapterInfo, Transformer, ValidatedRequest, ValidationError};

/// Metadata key carrying the DLT template id for sms/cdac.
pub const TEMPLATE_ID_KEY: &str = "templateId";
/// Metadata key carrying the Firebase Cloud Messaging token for web/firebase.
pub const FCM_TOKEN_KEY: &str = "fcmToken";

/// A single business rule evaluated against a validated request.
pub trait PolicyRule: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(
        &self,
        request: &ValidatedRequest,
        adapter: &AdapterInfo,
    ) -> Result<Vec<Transformer>, ValidationError>;
}

/// Case-insensitive `(channel, provider)` lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    channel: String,
    provider: String,
}

impl RouteKey {
    pub fn new(channel: &str, provider: &str) -> Self {
        Self {
            channel: channel.to_ascii_lowercase(),
            provider: provider.to_ascii_lowercase(),
        }
    }

    pub fn for_adapter(adapter: &AdapterInfo) -> Self {
        Self::new(&adapter.channel, &adapter.provider)
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel, self.provider)
    }
}

/// Rejects media unless the adapter's channel is one of `allowed_channels`.
pub struct MediaChannelRule {
    allowed_channels: Vec<String>,
}

impl MediaChannelRule {
    pub fn new<I, S>(allowed_channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_channels: allowed_channels.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for MediaChannelRule {
    fn default() -> Self {
        Self::new(["whatsapp"])
    }
}

impl PolicyRule for MediaChannelRule {
    fn name(&self) -> &str {
        "media-channel"
    }

    fn evaluate(
        &self,
        request: &ValidatedRequest,
        adapter: &AdapterInfo,
    ) -> Result<Vec<Transformer>, ValidationError> {
        if request.payload.has_media()
            && !self
                .allowed_channels
                .iter()
                .any(|channel| adapter.is_channel(channel))
        {
            return Err(ValidationError::MediaNotAllowed);
        }
        Ok(Vec::new())
    }
}

/// Requires a non-empty recipient metadata entry, optionally forwarding it
/// downstream as a single-entry transformer.
pub struct RequireMeta {
    name: String,
    key: String,
    missing: ValidationError,
    transformer: Option<String>,
}

impl RequireMeta {
    pub fn new(name: impl Into<String>, key: impl Into<String>, missing: ValidationError) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            missing,
            transformer: None,
        }
    }

    /// Emits a transformer with the given name carrying `{key: value}`.
    pub fn emitting(mut self, transformer: impl Into<String>) -> Self {
        self.transformer = Some(transformer.into());
        self
    }

    /// sms/cdac: DLT template id, forwarded to the provider.
    pub fn template_id() -> Self {
        Self::new(
            "sms-template-id",
            TEMPLATE_ID_KEY,
            ValidationError::TemplateRequired,
        )
        .emitting("sms-template")
    }

    /// web/firebase: push token gate, nothing forwarded.
    pub fn fcm_token() -> Self {
        Self::new(
            "web-fcm-token",
            FCM_TOKEN_KEY,
            ValidationError::FcmTokenRequired,
        )
    }
}

impl PolicyRule for RequireMeta {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        request: &ValidatedRequest,
        _adapter: &AdapterInfo,
    ) -> Result<Vec<Transformer>, ValidationError> {
        let value = request
            .to
            .meta_value(&self.key)
            .ok_or_else(|| self.missing.clone())?;
        Ok(self
            .transformer
            .iter()
            .map(|name| Transformer::new(name.as_str()).with_meta(self.key.as_str(), value))
            .collect())
    }
}

type RuleFn =
    dyn Fn(&ValidatedRequest, &AdapterInfo) -> Result<Vec<Transformer>, ValidationError>
        + Send
        + Sync;

/// Adapts a plain function or closure into a [`PolicyRule`].
pub struct FnRule {
    name: String,
    rule: Box<RuleFn>,
}

impl FnRule {
    pub fn new<F>(name: impl Into<String>, rule: F) -> Self
    where
        F: Fn(&ValidatedRequest, &AdapterInfo) -> Result<Vec<Transformer>, ValidationError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            rule: Box::new(rule),
        }
    }
}

impl PolicyRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        request: &ValidatedRequest,
        adapter: &AdapterInfo,
    ) -> Result<Vec<Transformer>, ValidationError> {
        (self.rule)(request, adapter)
    }
}

/// Registry of policy rules.
///
/// ```
/// use ogw_core::{AdapterInfo, MessagePayload, Address, PolicyEngine, ValidatedRequest};
///
/// let engine = PolicyEngine::with_default_rules();
/// let request = ValidatedRequest {
///     adapter_id: "a1".into(),
///     to: Address::system("u1"),
///     payload: MessagePayload { text: Some("hi".into()), media: None },
/// };
/// let transformers = engine
///     .evaluate(&request, &AdapterInfo::new("whatsapp", "gupshup"))
///     .unwrap();
/// assert!(transformers.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct PolicyEngine {
    global: Vec<Arc<dyn PolicyRule>>,
    routes: HashMap<RouteKey, Vec<Arc<dyn PolicyRule>>>,
}

impl PolicyEngine {
    /// Engine with no rules; every resolved adapter passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Media restriction for all adapters, template id for sms/cdac and push
    /// token for web/firebase.
    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        engine
            .add_global_rule(MediaChannelRule::default())
            .register("sms", "cdac", RequireMeta::template_id())
            .register("web", "firebase", RequireMeta::fcm_token());
        engine
    }

    pub fn add_global_rule(&mut self, rule: impl PolicyRule + 'static) -> &mut Self {
        self.global.push(Arc::new(rule));
        self
    }

    /// Appends `rule` to the rules of the `(channel, provider)` pair.
    pub fn register(
        &mut self,
        channel: &str,
        provider: &str,
        rule: impl PolicyRule + 'static,
    ) -> &mut Self {
        self.routes
            .entry(RouteKey::new(channel, provider))
            .or_default()
            .push(Arc::new(rule));
        self
    }

    /// Names of the rules that apply to `adapter`, in evaluation order.
    pub fn rule_names(&self, adapter: &AdapterInfo) -> Vec<&str> {
        self.rules_for(adapter).map(|rule| rule.name()).collect()
    }

    pub fn evaluate(
        &self,
        request: &ValidatedRequest,
        adapter: &AdapterInfo,
    ) -> Result<Vec<Transformer>, ValidationError> {
        let mut transformers = Vec::new();
        for rule in self.rules_for(adapter) {
            match rule.evaluate(request, adapter) {
                Ok(emitted) => transformers.extend(emitted),
                Err(err) => {
                    tracing::debug!(
                        rule = rule.name(),
                        route = %RouteKey::for_adapter(adapter),
                        error = %err,
                        "policy rule rejected request"
                    );
                    return Err(err);
                }
            }
        }
        Ok(transformers)
    }

    fn rules_for<'a>(
        &'a self,
        adapter: &AdapterInfo,
    ) -> impl Iterator<Item = &'a Arc<dyn PolicyRule>> + 'a {
        let keyed = self
            .routes
            .get(&RouteKey::for_adapter(adapter))
            .map(Vec::as_slice)
            .unwrap_or_default();
        self.global.iter().chain(keyed.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Address, MediaRef, MessagePayload};

    fn request(meta: &[(&str, &str)], media: bool) -> ValidatedRequest {
        let mut to = Address::system("u1");
        to.device_type = Some("mobile".into());
        for (k, v) in meta {
            to.meta.insert((*k).into(), (*v).into());
        }
        ValidatedRequest {
            adapter_id: "a1".into(),
            to,
            payload: MessagePayload {
                text: Some("hi".into()),
                media: media.then(|| MediaRef {
                    url: "http://x".into(),
                    category: "image".into(),
                }),
            },
        }
    }

    #[test]
    fn text_on_plain_adapter_has_no_transformers() {
        let engine = PolicyEngine::with_default_rules();
        let out = engine
            .evaluate(&request(&[], false), &AdapterInfo::new("whatsapp", "gupshup"))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn media_is_rejected_outside_whatsapp_in_any_case() {
        let engine = PolicyEngine::with_default_rules();
        for channel in ["sms", "web", "telegram", "WHATSAPP-business"] {
            let err = engine
                .evaluate(&request(&[], true), &AdapterInfo::new(channel, "netcore"))
                .unwrap_err();
            assert_eq!(err, ValidationError::MediaNotAllowed, "channel {channel}");
        }
        for channel in ["whatsapp", "WhatsApp", "WHATSAPP"] {
            assert!(
                engine
                    .evaluate(&request(&[], true), &AdapterInfo::new(channel, "netcore"))
                    .is_ok(),
                "channel {channel}"
            );
        }
    }

    #[test]
    fn routing_tokens_are_compared_without_trimming() {
        let engine = PolicyEngine::with_default_rules();
        let err = engine
            .evaluate(&request(&[], true), &AdapterInfo::new(" whatsapp ", "gupshup"))
            .unwrap_err();
        assert_eq!(err, ValidationError::MediaNotAllowed);
        // A padded pair does not pick up the cdac template rule either.
        assert!(
            engine
                .evaluate(&request(&[], false), &AdapterInfo::new("sms ", "cdac"))
                .is_ok()
        );
    }

    #[test]
    fn media_check_runs_before_pair_rules() {
        let engine = PolicyEngine::with_default_rules();
        let err = engine
            .evaluate(&request(&[], true), &AdapterInfo::new("sms", "cdac"))
            .unwrap_err();
        assert_eq!(err, ValidationError::MediaNotAllowed);
    }

    #[test]
    fn sms_cdac_requires_template_id() {
        let engine = PolicyEngine::with_default_rules();
        let adapter = AdapterInfo::new("SMS", "CDAC");
        assert_eq!(
            engine.evaluate(&request(&[], false), &adapter),
            Err(ValidationError::TemplateRequired)
        );
        assert_eq!(
            engine.evaluate(&request(&[("templateId", "")], false), &adapter),
            Err(ValidationError::TemplateRequired)
        );

        let out = engine
            .evaluate(&request(&[("templateId", "t-42")], false), &adapter)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].meta_data.get("templateId").map(String::as_str), Some("t-42"));
        assert_eq!(out[0].meta_data.len(), 1);
    }

    #[test]
    fn template_rule_only_applies_to_cdac() {
        let engine = PolicyEngine::with_default_rules();
        let out = engine
            .evaluate(&request(&[], false), &AdapterInfo::new("sms", "gupshup"))
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn web_firebase_requires_fcm_token_without_transformer() {
        let engine = PolicyEngine::with_default_rules();
        let adapter = AdapterInfo::new("Web", "Firebase");
        assert_eq!(
            engine.evaluate(&request(&[("fcmToken", "")], false), &adapter),
            Err(ValidationError::FcmTokenRequired)
        );
        let out = engine
            .evaluate(&request(&[("fcmToken", "tok")], false), &adapter)
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn new_pairs_register_without_touching_existing_rules() {
        let mut engine = PolicyEngine::with_default_rules();
        engine.register(
            "email",
            "sendgrid",
            FnRule::new("email-subject", |req, _| {
                let subject = req.to.meta_value("subject").unwrap_or("(no subject)");
                Ok(vec![Transformer::new("email").with_meta("subject", subject)])
            }),
        );

        let email = AdapterInfo::new("email", "sendgrid");
        assert_eq!(
            engine.rule_names(&email),
            vec!["media-channel", "email-subject"]
        );
        let out = engine.evaluate(&request(&[], false), &email).unwrap();
        assert_eq!(out[0].meta_data["subject"], "(no subject)");

        assert_eq!(
            engine.rule_names(&AdapterInfo::new("sms", "cdac")),
            vec!["media-channel", "sms-template-id"]
        );
    }

    #[test]
    fn transformers_keep_registration_order() {
        let mut engine = PolicyEngine::new();
        engine
            .register("sms", "cdac", RequireMeta::template_id())
            .register(
                "sms",
                "cdac",
                RequireMeta::new("sender", "senderId", ValidationError::TemplateRequired)
                    .emitting("sms-sender"),
            );
        let out = engine
            .evaluate(
                &request(&[("templateId", "t-1"), ("senderId", "S1")], false),
                &AdapterInfo::new("sms", "cdac"),
            )
            .unwrap();
        let names: Vec<_> = out.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["sms-template", "sms-sender"]);
    }

    #[test]
    fn empty_engine_accepts_everything() {
        let engine = PolicyEngine::new();
        assert!(
            engine
                .evaluate(&request(&[], true), &AdapterInfo::new("sms", "cdac"))
                .unwrap()
                .is_empty()
        );
    }
}
