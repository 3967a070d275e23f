use std::sync::Arc;

use metrics::counter;
use tracing::{Instrument, Span, error, field, info, warn};

use crate::{
    AdapterInfo, AdapterResolver, Dispatcher, EnvelopeBuilder, OutboundEnvelope, PolicyEngine,
    ProcessError, SendRequest, ValidatedRequest, ValidationError, validate_request,
};

/// What happened to an accepted envelope on its way to the dispatcher.
///
/// Acceptance and delivery are separate guarantees: a request that passed
/// validation and policy is reported as processed even when the hand-off to
/// the dispatcher fails. The failure is logged, counted in
/// `outbound_dispatch_failed_total` and carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Dispatched,
    Failed { reason: String },
}

impl Delivery {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Delivery::Dispatched)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub message_id: String,
    pub adapter_id: String,
    pub channel: String,
    pub provider: String,
    pub delivery: Delivery,
}

/// Validation, adapter resolution, policy and envelope construction for one
/// send request at a time. Holds no per-request state; share it behind an
/// `Arc` between concurrent requests.
#[derive(Clone)]
pub struct OutboundService {
    resolver: Arc<dyn AdapterResolver>,
    dispatcher: Arc<dyn Dispatcher>,
    policy: PolicyEngine,
    builder: EnvelopeBuilder,
}

impl OutboundService {
    pub fn new(resolver: Arc<dyn AdapterResolver>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            resolver,
            dispatcher,
            policy: PolicyEngine::with_default_rules(),
            builder: EnvelopeBuilder::default(),
        }
    }

    pub fn with_policy(mut self, policy: PolicyEngine) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_builder(mut self, builder: EnvelopeBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// Applies policy and builds the envelope for an already resolved adapter.
    pub fn prepare(
        &self,
        request: ValidatedRequest,
        adapter: &AdapterInfo,
    ) -> Result<OutboundEnvelope, ValidationError> {
        let transformers = self.policy.evaluate(&request, adapter)?;
        Ok(self.builder.build(request, adapter, transformers))
    }

    pub async fn process(&self, request: SendRequest) -> Result<Accepted, ProcessError> {
        let span = tracing::info_span!(
            "outbound_send",
            adapter_id = field::Empty,
            user_id = field::Empty,
            message_id = field::Empty
        );
        async move {
            let result = self.run(request).await;
            record_outcome(&result);
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: SendRequest) -> Result<Accepted, ProcessError> {
        let request = validate_request(request)?;
        let span = Span::current();
        span.record("adapter_id", request.adapter_id.as_str());
        span.record("user_id", request.to.user_id.as_str());

        let adapter = self.resolver.resolve(&request.adapter_id).await?;
        let envelope = self.prepare(request, &adapter)?;
        span.record("message_id", envelope.id());

        let delivery = match self.dispatcher.dispatch(&envelope).await {
            Ok(()) => {
                info!(
                    channel = %envelope.channel_uri,
                    provider = %envelope.provider_uri,
                    transformers = envelope.transformers.len(),
                    "outbound envelope dispatched"
                );
                Delivery::Dispatched
            }
            Err(err) => {
                error!(
                    error = %err,
                    channel = %envelope.channel_uri,
                    provider = %envelope.provider_uri,
                    "failed to dispatch outbound envelope; request stays accepted"
                );
                counter!(
                    "outbound_dispatch_failed_total",
                    "channel" => envelope.channel_uri.to_ascii_lowercase(),
                    "provider" => envelope.provider_uri.to_ascii_lowercase()
                )
                .increment(1);
                Delivery::Failed {
                    reason: err.to_string(),
                }
            }
        };

        Ok(Accepted {
            message_id: envelope.id().to_string(),
            adapter_id: envelope.adapter_id,
            channel: envelope.channel_uri,
            provider: envelope.provider_uri,
            delivery,
        })
    }
}

fn record_outcome(result: &Result<Accepted, ProcessError>) {
    match result {
        Ok(_) => {
            counter!("outbound_requests_total", "outcome" => "accepted").increment(1);
        }
        Err(err @ ProcessError::Validation(_)) => {
            warn!(kind = err.kind().as_str(), error = %err, "outbound request rejected");
            counter!("outbound_requests_total", "outcome" => "rejected").increment(1);
            counter!("outbound_rejected_total", "kind" => err.kind().as_str()).increment(1);
        }
        Err(err) => {
            error!(kind = err.kind().as_str(), error = %err, "adapter resolution failed");
            counter!("outbound_requests_total", "outcome" => "resolver_error").increment(1);
        }
    }
}
