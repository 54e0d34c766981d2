//! Self-contained image payloads.
//!
//! Both the camera and the upload path store photos as `data:` URLs so a
//! frontend can hand the value straight to an image element.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media type used when neither the caller nor the content says otherwise.
pub const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Errors parsing a serialized payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload is not a data URL")]
    NotDataUrl,
    #[error("payload is not base64 encoded")]
    NotBase64,
    #[error("payload body is not valid base64: {0}")]
    InvalidBody(String),
}

/// Encoded image payload (`data:<media-type>;base64,<body>`).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImagePayload {
    url: String,
    media_len: usize,
}

impl ImagePayload {
    /// Encode raw bytes under an explicit media type.
    pub fn encode(media_type: &str, bytes: &[u8]) -> Self {
        let media_type = if media_type.trim().is_empty() {
            FALLBACK_MEDIA_TYPE
        } else {
            media_type.trim()
        };
        let body = STANDARD.encode(bytes);
        let mut url = String::with_capacity(
            DATA_PREFIX.len() + media_type.len() + BASE64_MARKER.len() + body.len(),
        );
        url.push_str(DATA_PREFIX);
        url.push_str(media_type);
        url.push_str(BASE64_MARKER);
        url.push_str(&body);
        Self {
            url,
            media_len: media_type.len(),
        }
    }

    /// Encode file content, preferring the declared type, then the sniffed
    /// type, then [`FALLBACK_MEDIA_TYPE`]. No validation beyond that.
    pub fn from_file_bytes(bytes: &[u8], declared: Option<&str>) -> Self {
        let media_type = declared
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| sniff_media_type(bytes))
            .unwrap_or(FALLBACK_MEDIA_TYPE);
        Self::encode(media_type, bytes)
    }

    /// Parse a previously serialized data URL.
    pub fn parse(url: impl Into<String>) -> Result<Self, PayloadError> {
        let url = url.into();
        let rest = url.strip_prefix(DATA_PREFIX).ok_or(PayloadError::NotDataUrl)?;
        let media_len = rest.find(BASE64_MARKER).ok_or(PayloadError::NotBase64)?;
        let body = &rest[media_len + BASE64_MARKER.len()..];
        STANDARD
            .decode(body)
            .map_err(|e| PayloadError::InvalidBody(e.to_string()))?;
        Ok(Self { url, media_len })
    }

    /// Media type portion of the payload
    pub fn media_type(&self) -> &str {
        &self.url[DATA_PREFIX.len()..DATA_PREFIX.len() + self.media_len]
    }

    /// Decode the body back to bytes.
    pub fn decode(&self) -> Vec<u8> {
        let start = DATA_PREFIX.len() + self.media_len + BASE64_MARKER.len();
        // Constructed by `encode` or validated by `parse`.
        STANDARD.decode(&self.url[start..]).unwrap_or_default()
    }

    /// The full data URL
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("media_type", &self.media_type())
            .field("len", &self.url.len())
            .finish()
    }
}

impl fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl TryFrom<String> for ImagePayload {
    type Error = PayloadError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ImagePayload> for String {
    fn from(payload: ImagePayload) -> Self {
        payload.url
    }
}

/// Guess an image media type from magic bytes.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}
