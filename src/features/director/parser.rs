//! Two-stage JSON extraction from LLM output
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use log::{debug, warn};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// A parsed JSON object
pub type JsonObject = Map<String, Value>;

/// Greedy match from the first `{` to the last `}`
static OBJECT_PATTERN: OnceLock<Regex> = OnceLock::new();

fn object_pattern() -> &'static Regex {
    OBJECT_PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is a valid regex"))
}

/// Extract a JSON object from a possibly decorated response.
///
/// Stage one parses the trimmed text strictly. Stage two parses the span from
/// the first `{` to the last `}`. `None` when neither yields an object.
pub fn parse(raw: &str) -> Option<JsonObject> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(map);
    }

    let candidate = object_pattern().find(raw)?;
    debug!("Strict parse failed, trying extracted object ({} bytes)", candidate.len());

    match serde_json::from_str::<Value>(candidate.as_str()) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!("JSON regex extraction failed: {e}");
            None
        }
    }
}

/// First `max_chars` characters of `text`, for diagnostics
pub fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
