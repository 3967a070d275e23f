use std::collections::BTreeMap;

use serde_json::Value;

use crate::{
    Address, MediaRef, MessagePayload, RequiredField, SendRequest, ValidatedRequest,
    ValidationError,
};

/// Runs the structural checks on a [`SendRequest`], first failure wins.
///
/// ```
/// use ogw_core::{validate_request, Payload, Recipient, SendRequest, ValidationError};
///
/// let mut req = SendRequest {
///     adapter_id: Some("a1".into()),
///     to: Some(Recipient {
///         user_id: Some("u1".into()),
///         device_type: Some("mobile".into()),
///         meta: None,
///     }),
///     payload: Some(Payload { text: Some("hi".into()), media: None }),
/// };
/// let validated = validate_request(req.clone()).unwrap();
/// assert_eq!(validated.to.user_id, "u1");
///
/// req.payload = Some(Payload::default());
/// assert_eq!(validate_request(req), Err(ValidationError::PayloadEmpty));
/// ```
pub fn validate_request(request: SendRequest) -> Result<ValidatedRequest, ValidationError> {
    let adapter_id = request
        .adapter_id
        .filter(|id| !id.is_empty())
        .ok_or(ValidationError::MissingField(RequiredField::AdapterId))?;

    let to = request
        .to
        .ok_or(ValidationError::MissingField(RequiredField::Recipient))?;
    let user_id = to
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or(ValidationError::MissingField(RequiredField::UserId))?;
    let device_type = to
        .device_type
        .ok_or(ValidationError::MissingField(RequiredField::DeviceType))?;

    let payload = request
        .payload
        .ok_or(ValidationError::MissingField(RequiredField::Payload))?;
    if payload.text.is_none() && payload.media.is_none() {
        return Err(ValidationError::PayloadEmpty);
    }
    let media = match payload.media {
        Some(media) => match (media.url, media.category) {
            (Some(url), Some(category)) => Some(MediaRef { url, category }),
            _ => return Err(ValidationError::MediaIncomplete),
        },
        None => None,
    };

    Ok(ValidatedRequest {
        adapter_id,
        to: Address {
            user_id,
            device_type: Some(device_type),
            meta: to.meta.map(flatten_meta).unwrap_or_default(),
        },
        payload: MessagePayload {
            text: payload.text,
            media,
        },
    })
}

/// Drops `null` entries and renders other non-string values as JSON text.
fn flatten_meta(meta: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    meta.into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Media, Payload, Recipient};
    use serde_json::json;

    fn sample_request() -> SendRequest {
        SendRequest {
            adapter_id: Some("a1".into()),
            to: Some(Recipient {
                user_id: Some("u1".into()),
                device_type: Some("mobile".into()),
                meta: None,
            }),
            payload: Some(Payload {
                text: Some("hi".into()),
                media: None,
            }),
        }
    }

    fn media(url: Option<&str>, category: Option<&str>) -> Media {
        Media {
            url: url.map(str::to_string),
            category: category.map(str::to_string),
        }
    }

    fn missing(field: RequiredField) -> Result<ValidatedRequest, ValidationError> {
        Err(ValidationError::MissingField(field))
    }

    #[test]
    fn accepts_text_request() {
        let validated = validate_request(sample_request()).unwrap();
        assert_eq!(validated.adapter_id, "a1");
        assert_eq!(validated.to.user_id, "u1");
        assert_eq!(validated.to.device_type.as_deref(), Some("mobile"));
        assert!(validated.to.meta.is_empty());
        assert_eq!(validated.payload.text.as_deref(), Some("hi"));
    }

    #[test]
    fn rejects_missing_or_empty_adapter_id() {
        let mut req = sample_request();
        req.adapter_id = None;
        assert_eq!(validate_request(req), missing(RequiredField::AdapterId));

        let mut req = sample_request();
        req.adapter_id = Some(String::new());
        assert_eq!(validate_request(req), missing(RequiredField::AdapterId));
    }

    #[test]
    fn rejects_missing_recipient_fields() {
        let mut req = sample_request();
        req.to = None;
        assert_eq!(validate_request(req), missing(RequiredField::Recipient));

        let mut req = sample_request();
        req.to.as_mut().unwrap().user_id = Some(String::new());
        assert_eq!(validate_request(req), missing(RequiredField::UserId));

        let mut req = sample_request();
        req.to.as_mut().unwrap().device_type = None;
        assert_eq!(validate_request(req), missing(RequiredField::DeviceType));
    }

    #[test]
    fn rejects_missing_payload() {
        let mut req = sample_request();
        req.payload = None;
        assert_eq!(validate_request(req), missing(RequiredField::Payload));
    }

    #[test]
    fn first_failing_check_wins() {
        let req = SendRequest {
            adapter_id: Some("a1".into()),
            to: None,
            payload: Some(Payload::default()),
        };
        assert_eq!(validate_request(req), missing(RequiredField::Recipient));
    }

    #[test]
    fn rejects_empty_payload() {
        let mut req = sample_request();
        req.payload = Some(Payload::default());
        assert_eq!(validate_request(req), Err(ValidationError::PayloadEmpty));
    }

    #[test]
    fn empty_text_still_counts_as_present() {
        let mut req = sample_request();
        req.payload.as_mut().unwrap().text = Some(String::new());
        assert!(validate_request(req).is_ok());
    }

    #[test]
    fn rejects_incomplete_media() {
        for incomplete in [
            media(None, Some("image")),
            media(Some("http://x"), None),
            media(None, None),
        ] {
            let mut req = sample_request();
            req.payload = Some(Payload {
                text: Some("caption".into()),
                media: Some(incomplete),
            });
            assert_eq!(validate_request(req), Err(ValidationError::MediaIncomplete));
        }
    }

    #[test]
    fn accepts_media_only_payload() {
        let mut req = sample_request();
        req.payload = Some(Payload {
            text: None,
            media: Some(media(Some("http://x"), Some("image"))),
        });
        let validated = validate_request(req).unwrap();
        assert_eq!(
            validated.payload.media,
            Some(MediaRef {
                url: "http://x".into(),
                category: "image".into()
            })
        );
    }

    #[test]
    fn keeps_recipient_meta() {
        let mut req = sample_request();
        let mut meta = BTreeMap::new();
        meta.insert("templateId".to_string(), json!("t-7"));
        req.to.as_mut().unwrap().meta = Some(meta);
        let validated = validate_request(req).unwrap();
        assert_eq!(validated.to.meta_value("templateId"), Some("t-7"));
    }

    #[test]
    fn null_meta_values_are_dropped_and_scalars_flattened() {
        let mut req = sample_request();
        let meta: BTreeMap<String, Value> = [
            ("templateId", Value::Null),
            ("retries", json!(3)),
            ("silent", json!(true)),
            ("fcmToken", json!("tok")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        req.to.as_mut().unwrap().meta = Some(meta);

        let validated = validate_request(req).unwrap();
        assert!(!validated.to.meta.contains_key("templateId"));
        assert_eq!(validated.to.meta_value("templateId"), None);
        assert_eq!(validated.to.meta_value("retries"), Some("3"));
        assert_eq!(validated.to.meta_value("silent"), Some("true"));
        assert_eq!(validated.to.meta_value("fcmToken"), Some("tok"));
    }
}
