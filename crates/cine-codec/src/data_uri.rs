//! `data:` URI parsing and base64 helpers.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{CodecError, CodecResult};

/// Media type assumed when a data URI does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// A parsed `data:<mime>;base64,<payload>` URI.
///
/// The payload is kept base64-encoded; providers accept it as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: String,
}

impl DataUri {
    /// Build a data URI from a media type and an already-encoded payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Build a data URI by encoding raw bytes.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, encode_base64(bytes))
    }

    /// Split a data URI into its declared media type and payload.
    pub fn parse(uri: &str) -> CodecResult<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| CodecError::NotDataUri(truncate(uri)))?;

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| CodecError::MalformedDataUri("missing ',' separator".to_string()))?;

        let mime_type = header
            .split(';')
            .next()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();

        Ok(Self {
            mime_type,
            data: data.to_string(),
        })
    }

    /// Decode the payload to raw bytes.
    pub fn decode(&self) -> CodecResult<Vec<u8>> {
        decode_base64(&self.data)
    }

    /// Render back to `data:<mime>;base64,<payload>`.
    pub fn to_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Encode bytes with the standard base64 alphabet.
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard base64, ignoring surrounding whitespace.
pub fn decode_base64(data: &str) -> CodecResult<Vec<u8>> {
    Ok(STANDARD.decode(data.trim())?)
}

fn truncate(s: &str) -> String {
    s.chars().take(32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_header_and_payload() {
        let uri = DataUri::parse("data:image/jpeg;base64,AAEC").unwrap();
        assert_eq!(uri.mime_type, "image/jpeg");
        assert_eq!(uri.data, "AAEC");
        assert_eq!(uri.decode().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_parse_defaults_missing_mime_type() {
        let uri = DataUri::parse("data:;base64,AAEC").unwrap();
        assert_eq!(uri.mime_type, DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_parse_rejects_non_data_uri() {
        assert!(matches!(
            DataUri::parse("https://example.com/x.png"),
            Err(CodecError::NotDataUri(_))
        ));
        assert!(matches!(
            DataUri::parse("data:image/png;base64"),
            Err(CodecError::MalformedDataUri(_))
        ));
    }

    #[test]
    fn test_from_bytes_renders_uri() {
        let uri = DataUri::from_bytes("image/png", &[0xff, 0x00]);
        assert_eq!(uri.to_uri(), "data:image/png;base64,/wA=");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_base64("not base64 !!").is_err());
    }
}
