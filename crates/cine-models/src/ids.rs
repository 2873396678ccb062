//! Typed identifiers for scene document entities.
//!
//! Ids are opaque strings. Fresh ids carry a short kind prefix so that log
//! lines stay readable (`c-…`, `e-…`, `m-…`, `f-…`).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a new random id.
            pub fn new() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4().simple()))
            }

            /// Create from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a character in the manifest.
    CharacterId,
    "c"
);
entity_id!(
    /// Unique identifier for an environment in the manifest.
    EnvironmentId,
    "e"
);
entity_id!(
    /// Unique identifier for a motif in the manifest.
    MotifId,
    "m"
);
entity_id!(
    /// Unique identifier for a storyboard frame.
    FrameId,
    "f"
);
