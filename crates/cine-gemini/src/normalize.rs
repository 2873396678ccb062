//! Lenient JSON extraction from model text output.
//!
//! Models asked for JSON still wrap it in code fences or surround it with
//! prose. [`normalize_json`] recovers the first JSON object it can find and
//! falls back to an empty object instead of failing.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Strip markdown code fence markers around a payload.
fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the optional language tag on the opening fence line.
        text = match rest.find('\n') {
            Some(idx) if rest[..idx].trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[idx + 1..]
            }
            _ => rest.trim_start_matches("json"),
        };
    }

    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Find the end (exclusive byte index) of the balanced object starting at `start`.
fn balanced_object_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse the first well-formed JSON object embedded in `text`.
fn first_embedded_object(text: &str) -> Option<Map<String, Value>> {
    for (start, _) in text.match_indices('{') {
        let Some(end) = balanced_object_end(text, start) else {
            continue;
        };
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..end]) {
            return Some(map);
        }
    }
    None
}

/// Extract a JSON object from loosely formatted model output.
///
/// Tries, in order: the fence-stripped text as a whole, then the first
/// balanced `{...}` span that parses as an object. Returns an empty object
/// when neither succeeds; this function never fails.
pub fn normalize_json(raw: &str) -> Value {
    let text = strip_code_fences(raw);

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Value::Object(map);
    }

    if let Some(map) = first_embedded_object(text) {
        debug!("Recovered JSON object embedded in model output");
        return Value::Object(map);
    }

    warn!(
        len = raw.len(),
        "Model output contained no parseable JSON object, using empty object"
    );
    Value::Object(Map::new())
}

/// Normalize `raw` and deserialize it into `T`.
///
/// Schema drift degrades to `T::default()`; missing fields should be covered
/// by `#[serde(default)]` on the target type.
pub fn parse_structured<T>(raw: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let value = normalize_json(raw);
    match serde_json::from_value(value) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Structured output did not match expected shape: {}", e);
            T::default()
        }
    }
}
