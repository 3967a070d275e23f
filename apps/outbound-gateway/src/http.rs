use std::sync::Arc;

use axum::{
    Router, debug_handler,
    extract::{Extension, Json, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use ogw_core::{Accepted, OutboundService, ProcessError, SendRequest};
use ogw_telemetry::PrometheusHandle;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SEND_PATH: &str = "/message/send";
pub const METRICS_PATH: &str = "/metrics";
pub const PROCESSED_MESSAGE: &str = "Message processed.";
/// Error name used when the body is not a decodable send request.
pub const INVALID_BODY: &str = "InvalidBody";

#[derive(Clone)]
pub struct GatewayState {
    pub service: OutboundService,
    /// `None` when no recorder is installed; `/metrics` then answers 404.
    pub metrics: Option<PrometheusHandle>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub message_id: String,
    /// False when the envelope was accepted but the hand-off to the
    /// dispatcher failed.
    pub dispatched: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SendResult>,
}

impl ApiResponse {
    pub fn processed(accepted: &Accepted) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            path: SEND_PATH.into(),
            error: None,
            message: PROCESSED_MESSAGE.into(),
            result: Some(SendResult {
                message_id: accepted.message_id.clone(),
                dispatched: accepted.delivery.is_dispatched(),
            }),
        }
    }

    pub fn failed(err: &ProcessError) -> Self {
        Self {
            status: err.status().as_u16(),
            path: SEND_PATH.into(),
            error: Some(err.kind().as_str().into()),
            message: err.client_message(),
            result: None,
        }
    }

    fn invalid_body(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST.as_u16(),
            path: SEND_PATH.into(),
            error: Some(INVALID_BODY.into()),
            message,
            result: None,
        }
    }
}

pub fn build_router(service: OutboundService, metrics: Option<PrometheusHandle>) -> Router {
    let state = Arc::new(GatewayState { service, metrics });
    Router::new()
        .route(SEND_PATH, post(send_message))
        .route(METRICS_PATH, get(render_metrics))
        .layer(Extension(state))
}

async fn render_metrics(
    Extension(state): Extension<Arc<GatewayState>>,
) -> Result<String, StatusCode> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or(StatusCode::NOT_FOUND)
}

#[debug_handler]
async fn send_message(
    Extension(state): Extension<Arc<GatewayState>>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection, "rejected undecodable send request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::invalid_body(rejection.body_text())),
            );
        }
    };
    handle_send(state.as_ref(), request).await
}

/// Runs the pipeline and maps the outcome onto the response contract.
pub async fn handle_send(
    state: &GatewayState,
    request: SendRequest,
) -> (StatusCode, Json<ApiResponse>) {
    match state.service.process(request).await {
        Ok(accepted) => (StatusCode::OK, Json(ApiResponse::processed(&accepted))),
        Err(err) => (err.status(), Json(ApiResponse::failed(&err))),
    }
}
