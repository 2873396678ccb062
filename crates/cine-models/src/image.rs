//! Image references held by manifest entries and frames.

use serde::{Deserialize, Serialize};

/// Sentinel prefix marking an image that has not resolved yet.
pub const PENDING_PREFIX: &str = "loading://";

/// Where an entity's image currently lives.
///
/// Serialized as a plain string so the scene document keeps its flat JSON
/// shape: `loading://…` for pending, `data:…` for inline plates, anything
/// else is a remote URL.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageSource {
    /// Generation is outstanding or produced nothing usable yet.
    #[default]
    Pending,
    /// A remote URL.
    Remote(String),
    /// A self-contained `data:` URI holding generated bytes.
    Inline(String),
}

impl ImageSource {
    /// True once the image points at real bytes (remote or inline).
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ImageSource::Pending)
    }

    /// True if this is a self-contained data URI.
    pub fn is_inline(&self) -> bool {
        matches!(self, ImageSource::Inline(_))
    }

    /// The URL or data URI, if resolved.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            ImageSource::Pending => None,
            ImageSource::Remote(url) | ImageSource::Inline(url) => Some(url),
        }
    }
}

impl From<String> for ImageSource {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.starts_with(PENDING_PREFIX) {
            ImageSource::Pending
        } else if trimmed.starts_with("data:") {
            ImageSource::Inline(value)
        } else {
            ImageSource::Remote(value)
        }
    }
}

impl From<&str> for ImageSource {
    fn from(value: &str) -> Self {
        ImageSource::from(value.to_string())
    }
}

impl From<ImageSource> for String {
    fn from(value: ImageSource) -> Self {
        match value {
            ImageSource::Pending => format!("{PENDING_PREFIX}pending"),
            ImageSource::Remote(url) | ImageSource::Inline(url) => url,
        }
    }
}
