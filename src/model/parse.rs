//! Recovery parsing for free-form model output.
//!
//! Models are asked for pure JSON but routinely wrap it in prose or code
//! fences. The fallback chain is explicit and testable in isolation:
//! strict parse → fenced ```json block → outermost embedded object/array →
//! `None`. Callers decide what the failure sentinel is for their schema.

use regex::Regex;
use serde_json::Value;

/// Parse a model response into a JSON value, recovering from code fences
/// and surrounding prose. Returns `None` when nothing parseable is found.
pub fn recover_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // 1) strict parse
    if let Ok(v) = serde_json::from_str::<Value>(trimmed) {
        return Some(v);
    }

    // 2) fenced ```json ... ``` or plain ``` ... ``` block
    if let Some(inner) = fenced_block(trimmed) {
        if let Ok(v) = serde_json::from_str::<Value>(&inner) {
            return Some(v);
        }
    }

    // 3) outermost embedded array-of-objects, then bare object
    let array_re = Regex::new(r"(?s)(\[\s*\{.*\}\s*\])").expect("valid regex");
    if let Some(cap) = array_re.captures(trimmed) {
        if let Ok(v) = serde_json::from_str::<Value>(&cap[1]) {
            return Some(v);
        }
    }
    let object_re = Regex::new(r"(?s)(\{.*\})").expect("valid regex");
    if let Some(cap) = object_re.captures(trimmed) {
        if let Ok(v) = serde_json::from_str::<Value>(&cap[1]) {
            return Some(v);
        }
    }

    None
}

/// Extract the contents of the first fenced code block, preferring a
/// ```json fence over an unlabeled one.
fn fenced_block(raw: &str) -> Option<String> {
    let json_fence =
        Regex::new(r"(?s)```json\s*(\[.*?\]|\{.*?\})\s*```").expect("valid regex");
    if let Some(cap) = json_fence.captures(raw) {
        return Some(cap[1].trim().to_string());
    }
    let any_fence = Regex::new(r"(?s)```\s*(\[.*?\]|\{.*?\})\s*```").expect("valid regex");
    any_fence.captures(raw).map(|cap| cap[1].trim().to_string())
}

/// Coerce a recovered value into the first JSON object it contains:
/// an object is returned as-is, an array yields its first object element.
pub fn first_object(value: Value) -> Option<Value> {
    match value {
        Value::Object(_) => Some(value),
        Value::Array(items) => items.into_iter().find(|v| v.is_object()),
        _ => None,
    }
}
