//! Best-effort JSON recovery from free-form model output.
//!
//! The model is asked for a bare JSON array but may wrap it in prose or
//! markdown fences. Recovery tries, in order: the whole text, the outermost
//! `[...]` span, the outermost `{...}` span, and the text with code fences
//! removed.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static ARRAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid array span regex"));

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid object span regex"));

static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?").expect("valid fence regex"));

/// Error text used when nothing parseable is found.
pub const INVALID_JSON_OUTPUT: &str = "Invalid JSON output";

/// Single-element list standing in for unparseable output.
#[must_use]
pub fn invalid_output_placeholder() -> Vec<Value> {
    vec![serde_json::json!({ "error": INVALID_JSON_OUTPUT })]
}

/// Runs the recovery cascade; `None` when every step fails.
#[must_use]
pub fn parse_lenient(text: &str) -> Option<Value> {
    let text = text.trim();
    if let Ok(v) = serde_json::from_str(text) {
        return Some(v);
    }
    for span in [&ARRAY_SPAN, &OBJECT_SPAN] {
        if let Some(m) = span.find(text) {
            if let Ok(v) = serde_json::from_str(m.as_str()) {
                return Some(v);
            }
        }
    }
    let unfenced = FENCE.replace_all(text, "");
    serde_json::from_str(unfenced.trim()).ok()
}

/// Parsed value, or the placeholder list when the text is not JSON.
#[must_use]
pub fn salvage_json(text: &str) -> Value {
    parse_lenient(text).unwrap_or_else(|| Value::Array(invalid_output_placeholder()))
}

/// Array entries of the model output. A parsed value that is not an array
/// counts as a failure.
#[must_use]
pub fn salvage_entries(text: &str) -> Option<Vec<Value>> {
    match parse_lenient(text)? {
        Value::Array(entries) => Some(entries),
        other => {
            tracing::warn!(kind = json_kind(&other), "model output parsed but is not an array");
            None
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
