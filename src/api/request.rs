//! Request envelope parsing
//!
//! The loose `{action, fileName, imageData}` envelope is validated into a
//! closed [`ImageAction`] before anything touches the store.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use bytes::Bytes;
use serde::Deserialize;

use super::ApiError;
use crate::images::FileName;

/// Largest accepted POST body (1 MiB)
pub const MAX_PAYLOAD_BYTES: usize = 1_048_576;

/// Standard alphabet, padding optional
const IMAGE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Request as it arrives on the wire, body or query string
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    pub action: Option<String>,
    pub file_name: Option<String>,
    pub image_data: Option<String>,
}

/// Action tag of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Upload,
    List,
}

impl ActionKind {
    /// Exactly `UPLOAD` or `LIST`; any other spelling is rejected
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "UPLOAD" => Some(ActionKind::Upload),
            "LIST" => Some(ActionKind::List),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Upload => "UPLOAD",
            ActionKind::List => "LIST",
        }
    }
}

/// A validated request, ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageAction {
    Upload { file_name: FileName, image: Bytes },
    List,
}

impl ImageAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            ImageAction::Upload { .. } => ActionKind::Upload,
            ImageAction::List => ActionKind::List,
        }
    }
}

impl TryFrom<RequestEnvelope> for ImageAction {
    type Error = ApiError;

    fn try_from(envelope: RequestEnvelope) -> Result<Self, Self::Error> {
        let action = envelope.action.as_deref().ok_or(ApiError::InvalidInput)?;

        match ActionKind::parse(action).ok_or(ApiError::InvalidAction)? {
            ActionKind::List => Ok(ImageAction::List),
            ActionKind::Upload => {
                let file_name = envelope
                    .file_name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .ok_or(ApiError::InvalidInput)?;
                let image_data = envelope
                    .image_data
                    .as_deref()
                    .filter(|data| !data.is_empty())
                    .ok_or(ApiError::InvalidInput)?;

                let file_name = FileName::parse(file_name)?;
                let image = decode_image(image_data)?;

                Ok(ImageAction::Upload { file_name, image })
            }
        }
    }
}

/// Reject bodies above `limit` bytes before any parsing happens
pub fn guard_payload(body: &[u8], limit: usize) -> Result<&[u8], ApiError> {
    if body.len() > limit {
        tracing::warn!("Payload of {} bytes exceeds limit of {} bytes", body.len(), limit);
        return Err(ApiError::InvalidInput);
    }
    Ok(body)
}

/// Guard then parse a JSON POST body
pub fn parse_body(body: &[u8], limit: usize) -> Result<RequestEnvelope, ApiError> {
    let body = guard_payload(body, limit)?;
    if body.is_empty() {
        return Err(ApiError::InvalidInput);
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Unparseable request body: {}", e);
        ApiError::InvalidInput
    })
}

/// Decode base64 image data, tolerating a `data:<mime>;base64,` prefix
pub fn decode_image(data: &str) -> Result<Bytes, ApiError> {
    let payload = match data.split_once(";base64,") {
        Some((scheme, rest)) if scheme.starts_with("data:") => rest,
        _ => data,
    };

    let bytes = IMAGE_BASE64.decode(payload.trim()).map_err(|e| {
        tracing::debug!("Invalid base64 image data: {}", e);
        ApiError::InvalidInput
    })?;

    if bytes.is_empty() {
        return Err(ApiError::InvalidInput);
    }
    Ok(Bytes::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::FileNameError;

    fn envelope(action: Option<&str>, file_name: Option<&str>, image_data: Option<&str>) -> RequestEnvelope {
        RequestEnvelope {
            action: action.map(String::from),
            file_name: file_name.map(String::from),
            image_data: image_data.map(String::from),
        }
    }

    #[test]
    fn test_list_needs_only_action() {
        let action = ImageAction::try_from(envelope(Some("LIST"), None, None)).unwrap();
        assert_eq!(action, ImageAction::List);
    }

    #[test]
    fn test_upload_decodes_image() {
        let action = ImageAction::try_from(envelope(Some("UPLOAD"), Some("a.jpg"), Some("aGVsbG8="))).unwrap();
        match action {
            ImageAction::Upload { file_name, image } => {
                assert_eq!(file_name.as_str(), "a.jpg");
                assert_eq!(image, Bytes::from_static(b"hello"));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_lowercase_action_rejected() {
        for raw in ["upload", "list", "Upload", "List"] {
            let err = ImageAction::try_from(envelope(Some(raw), Some("a.jpg"), Some("aGk"))).unwrap_err();
            assert!(matches!(err, ApiError::InvalidAction), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_missing_action_is_invalid_input() {
        let err = ImageAction::try_from(RequestEnvelope::default()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput));
    }

    #[test]
    fn test_unknown_action() {
        for action in ["DELETE", "", "List", "GET"] {
            let err = ImageAction::try_from(envelope(Some(action), None, None)).unwrap_err();
            assert!(matches!(err, ApiError::InvalidAction), "action {:?}", action);
        }
    }

    #[test]
    fn test_upload_missing_fields() {
        let err = ImageAction::try_from(envelope(Some("UPLOAD"), None, Some("aGk="))).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput));

        let err = ImageAction::try_from(envelope(Some("UPLOAD"), Some("a.jpg"), None)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput));

        let err = ImageAction::try_from(envelope(Some("UPLOAD"), Some("a.jpg"), Some(""))).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput));
    }

    #[test]
    fn test_upload_rejects_traversal_name() {
        let err = ImageAction::try_from(envelope(Some("UPLOAD"), Some("../x.jpg"), Some("aGk="))).unwrap_err();
        assert!(matches!(err, ApiError::InvalidFileName(FileNameError::LeadingDot)));
    }

    #[test]
    fn test_decode_image_variants() {
        assert_eq!(decode_image("aGk=").unwrap(), Bytes::from_static(b"hi"));
        assert_eq!(decode_image("aGk").unwrap(), Bytes::from_static(b"hi"));
        assert_eq!(decode_image("data:image/png;base64,aGk=").unwrap(), Bytes::from_static(b"hi"));
        assert!(matches!(decode_image("not base64!"), Err(ApiError::InvalidInput)));
    }

    #[test]
    fn test_guard_payload() {
        let body = vec![b' '; MAX_PAYLOAD_BYTES];
        assert!(guard_payload(&body, MAX_PAYLOAD_BYTES).is_ok());

        let body = vec![b' '; MAX_PAYLOAD_BYTES + 1];
        assert!(matches!(guard_payload(&body, MAX_PAYLOAD_BYTES), Err(ApiError::InvalidInput)));
    }

    #[test]
    fn test_parse_body() {
        let parsed = parse_body(br#"{"action":"LIST"}"#, MAX_PAYLOAD_BYTES).unwrap();
        assert_eq!(parsed.action.as_deref(), Some("LIST"));

        assert!(matches!(parse_body(b"", MAX_PAYLOAD_BYTES), Err(ApiError::InvalidInput)));
        assert!(matches!(parse_body(b"{not json", MAX_PAYLOAD_BYTES), Err(ApiError::InvalidInput)));
        assert!(matches!(parse_body(b"[1,2]", MAX_PAYLOAD_BYTES), Err(ApiError::InvalidInput)));
    }
}
