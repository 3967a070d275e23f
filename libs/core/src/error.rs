use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Closed set of failure kinds surfaced to callers and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MissingField,
    PayloadEmpty,
    MediaIncomplete,
    MediaNotAllowed,
    TemplateRequired,
    FcmTokenRequired,
    AdapterNotFound,
    AdapterUnavailable,
    DispatchFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "MissingField",
            ErrorKind::PayloadEmpty => "PayloadEmpty",
            ErrorKind::MediaIncomplete => "MediaIncomplete",
            ErrorKind::MediaNotAllowed => "MediaNotAllowed",
            ErrorKind::TemplateRequired => "TemplateRequired",
            ErrorKind::FcmTokenRequired => "FcmTokenRequired",
            ErrorKind::AdapterNotFound => "AdapterNotFound",
            ErrorKind::AdapterUnavailable => "AdapterUnavailable",
            ErrorKind::DispatchFailed => "DispatchFailed",
        }
    }
}

/// Structural field whose absence yields [`ValidationError::MissingField`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    AdapterId,
    Recipient,
    UserId,
    DeviceType,
    Payload,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequiredField::AdapterId => "adapterId",
            RequiredField::Recipient => "to",
            RequiredField::UserId => "to.userId",
            RequiredField::DeviceType => "to.deviceType",
            RequiredField::Payload => "payload",
        }
    }
}

/// Terminal rejection of a request by the validator or the policy engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Adapter id, to with userID, deviceType & payload are required.")]
    MissingField(RequiredField),
    #[error("Payload should have either text or media.")]
    PayloadEmpty,
    #[error("Payload media should have category and url.")]
    MediaIncomplete,
    #[error("Media is allowed only for whatsapp adapters.")]
    MediaNotAllowed,
    #[error("Template id in meta of to is required for cdac sms adapter messaging.")]
    TemplateRequired,
    #[error("FCM token in meta of to is required for firebase adapter messaging.")]
    FcmTokenRequired,
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::MissingField(_) => ErrorKind::MissingField,
            ValidationError::PayloadEmpty => ErrorKind::PayloadEmpty,
            ValidationError::MediaIncomplete => ErrorKind::MediaIncomplete,
            ValidationError::MediaNotAllowed => ErrorKind::MediaNotAllowed,
            ValidationError::TemplateRequired => ErrorKind::TemplateRequired,
            ValidationError::FcmTokenRequired => ErrorKind::FcmTokenRequired,
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("adapter {0} not found")]
    NotFound(String),
    #[error("adapter service unavailable: {0}")]
    Unavailable(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to serialize outbound envelope: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("dispatch transport failed: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Terminal failure of [`crate::OutboundService::process`].
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl ProcessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessError::Validation(err) => err.kind(),
            ProcessError::Resolve(ResolveError::NotFound(_)) => ErrorKind::AdapterNotFound,
            ProcessError::Resolve(ResolveError::Unavailable(_)) => ErrorKind::AdapterUnavailable,
        }
    }

    /// Validation and policy failures are the caller's fault; resolver
    /// failures are reported as upstream errors.
    pub fn status(&self) -> StatusCode {
        match self {
            ProcessError::Validation(_) => StatusCode::BAD_REQUEST,
            ProcessError::Resolve(ResolveError::NotFound(_)) => StatusCode::BAD_GATEWAY,
            ProcessError::Resolve(ResolveError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-facing message. Resolver internals are not echoed back.
    pub fn client_message(&self) -> String {
        match self {
            ProcessError::Validation(err) => err.to_string(),
            ProcessError::Resolve(ResolveError::NotFound(id)) => {
                format!("Adapter {id} could not be resolved.")
            }
            ProcessError::Resolve(ResolveError::Unavailable(_)) => {
                "Adapter service is unavailable.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = ProcessError::from(ValidationError::TemplateRequired);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind().as_str(), "TemplateRequired");
        assert_eq!(
            err.client_message(),
            "Template id in meta of to is required for cdac sms adapter messaging."
        );
    }

    #[test]
    fn missing_field_shares_one_message() {
        let a = ValidationError::MissingField(RequiredField::AdapterId).to_string();
        let b = ValidationError::MissingField(RequiredField::DeviceType).to_string();
        assert_eq!(a, b);
        assert_eq!(RequiredField::DeviceType.as_str(), "to.deviceType");
    }

    #[test]
    fn resolver_failures_are_server_side() {
        let not_found = ProcessError::from(ResolveError::NotFound("a9".into()));
        assert_eq!(not_found.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(not_found.kind(), ErrorKind::AdapterNotFound);
        assert_eq!(not_found.client_message(), "Adapter a9 could not be resolved.");

        let unavailable =
            ProcessError::from(ResolveError::Unavailable(anyhow::anyhow!("connection refused")));
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(unavailable.kind(), ErrorKind::AdapterUnavailable);
        assert!(!unavailable.client_message().contains("refused"));
    }
}
