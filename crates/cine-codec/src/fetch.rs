//! Image resolution for provider references and video export.
//!
//! Both entry points accept either a self-contained `data:` URI or a remote
//! URL, and both degrade instead of failing: a reference that cannot be
//! fetched becomes an empty payload, an export image becomes a 1x1
//! placeholder.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};

use crate::data_uri::{encode_base64, DataUri, DEFAULT_MIME_TYPE};
use crate::error::{CodecError, CodecResult};

/// A 1x1 black PNG substituted when an export image cannot be resolved.
pub const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x3a, 0x7e, 0x9b,
    0x55, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x08, 0xd7, 0x63, 0x60, 0x00, 0x00, 0x00,
    0x02, 0x00, 0x01, 0xe2, 0x21, 0xbc, 0x33, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

/// Base64 payload plus declared media type, ready to attach to a provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePayload {
    pub data: String,
    pub mime_type: String,
}

impl InlinePayload {
    /// The "no reference available" payload.
    pub fn empty() -> Self {
        Self {
            data: String::new(),
            mime_type: DEFAULT_MIME_TYPE.to_string(),
        }
    }

    /// True when there is nothing to attach.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<DataUri> for InlinePayload {
    fn from(uri: DataUri) -> Self {
        Self {
            data: uri.data,
            mime_type: uri.mime_type,
        }
    }
}

/// Resolve an image source to a base64 payload.
///
/// Data URIs are split directly. Remote URLs are fetched and re-encoded,
/// reporting the fetched `Content-Type`. Any failure yields
/// [`InlinePayload::empty`], which callers must treat as "no reference".
pub async fn to_base64(client: &Client, source: &str) -> InlinePayload {
    if source.starts_with("data:") {
        return match DataUri::parse(source) {
            Ok(uri) => uri.into(),
            Err(e) => {
                warn!("Failed to parse reference data URI: {}", e);
                InlinePayload::empty()
            }
        };
    }

    match fetch_remote(client, source).await {
        Ok((bytes, mime_type)) => InlinePayload {
            data: encode_base64(&bytes),
            mime_type,
        },
        Err(e) => {
            warn!("Failed to convert image to base64: {}: {}", source, e);
            InlinePayload::empty()
        }
    }
}

/// Resolve a display URL to raw image bytes for embedding in a video.
///
/// Never fails: an empty URL, an undecodable data URI, or a failed fetch
/// all return [`PLACEHOLDER_PNG`].
pub async fn get_image_bytes(client: &Client, url: &str) -> Vec<u8> {
    if url.trim().is_empty() {
        return PLACEHOLDER_PNG.to_vec();
    }

    if url.starts_with("data:") {
        return match DataUri::parse(url).and_then(|uri| uri.decode()) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to parse image data URL: {}", e);
                PLACEHOLDER_PNG.to_vec()
            }
        };
    }

    match fetch_remote(client, url).await {
        Ok((bytes, _)) => bytes,
        Err(e) => {
            warn!("Failed to fetch image: {}. Error: {}. Using fallback.", url, e);
            PLACEHOLDER_PNG.to_vec()
        }
    }
}

async fn fetch_remote(client: &Client, url: &str) -> CodecResult<(Vec<u8>, String)> {
    let parsed = url::Url::parse(url)?;

    debug!("Fetching remote image {}", parsed);

    let response = client.get(parsed).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(CodecError::HttpStatus(status.as_u16()));
    }

    let mime_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

    let bytes = response.bytes().await?;
    Ok((bytes.to_vec(), mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_to_base64_splits_data_uri_without_network() {
        let client = Client::new();
        let payload = to_base64(&client, "data:image/webp;base64,UklGRg==").await;
        assert_eq!(payload.mime_type, "image/webp");
        assert_eq!(payload.data, "UklGRg==");
    }

    #[tokio::test]
    async fn test_to_base64_fetches_remote_and_reports_mime() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/plate.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let payload = to_base64(&client, &format!("{}/plate.jpg", server.uri())).await;
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(payload.data, "AQID");
    }

    #[tokio::test]
    async fn test_to_base64_returns_empty_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = Client::new();
        let payload = to_base64(&client, &format!("{}/missing.png", server.uri())).await;
        assert!(payload.is_empty());

        let payload = to_base64(&client, "not a url").await;
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_remote_reports_typed_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = Client::new();
        let err = fetch_remote(&client, &format!("{}/denied.png", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::HttpStatus(403)));

        let err = fetch_remote(&client, "not a url").await.unwrap_err();
        assert!(matches!(err, CodecError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_get_image_bytes_decodes_data_uri() {
        let client = Client::new();
        let bytes = get_image_bytes(&client, "data:image/png;base64,AQID").await;
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_image_bytes_falls_back_to_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Client::new();
        assert_eq!(get_image_bytes(&client, "").await, PLACEHOLDER_PNG);
        assert_eq!(get_image_bytes(&client, "data:image/png;base64,@@@").await, PLACEHOLDER_PNG);
        assert_eq!(
            get_image_bytes(&client, &format!("{}/x.png", server.uri())).await,
            PLACEHOLDER_PNG
        );
    }
}
