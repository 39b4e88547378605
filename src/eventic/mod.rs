//! Eventic extraction: document text → Agent/Deontic/Action event records.
//!
//! One model round-trip, no retry. The model is only held to the output
//! shape (a JSON array of objects with the three keys); agent and deontic
//! values are kept verbatim, and incomplete records are silently dropped.

use crate::error::Result;
use crate::graph::collapse_ws;
use crate::model::{parse, ChatModel};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A regulatory event extracted from text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "Agent")]
    pub agent: String,
    #[serde(rename = "Deontic")]
    pub deontic: String,
    #[serde(rename = "Action")]
    pub action: String,
}

const SYSTEM_PROMPT: &str = r#"Your task is to extract regulatory events from the given document text and convert them into an Eventic Graph representation.

Each event must include exactly three fields: Agent, Deontic, Action.
- Agent: the actor (e.g., organization, person, authority, controller, processor, etc.)
- Deontic: the modality (e.g., must, must_not, should, should_not, may, can, will, shall, etc.)
- Action: a short phrase describing the regulated behavior

Output must be ONLY a valid JSON array of objects, each with keys:
["Agent", "Deontic", "Action"].
No extra text. No explanations. Keep actions concise.

### Examples ###

Input: "To this end, subject to any confidentiality agreements Solectron may have, Solectron will both inform and provide a commercially reasonable opportunity for acquisition of new and emerging Solectron and industry technology."
Output:
[
  {"Agent": "Solectron", "Deontic": "will", "Action": "inform acquisition of new and emerging Solectron and industry technology subject to confidentiality agreements Solectron may have"},
  {"Agent": "Solectron", "Deontic": "will", "Action": "provide opportunity acquisition of new and emerging Solectron and industry technology subject to confidentiality agreements Solectron may have"}
]

Input: "Company can choose not to inform the customers about data usage."
Output:
[
  {"Agent": "Company", "Deontic": "can", "Action": "choose not to inform the customers about data usage"}
]

Input: "According to GDPR, Tesla must delete personal data when consent is withdrawn. The Processor must_not share personal data with unauthorized parties. Supervisory Authorities may impose fines on Controllers who fail to comply."
Output:
[
  {"Agent": "Tesla", "Deontic": "must", "Action": "delete personal data when consent is withdrawn"},
  {"Agent": "Processor", "Deontic": "must_not", "Action": "share personal data with unauthorized parties"},
  {"Agent": "Authority", "Deontic": "may", "Action": "impose fines on Controllers who fail to comply"}
]

### End of Examples ###
Extract regulatory events from the following document text."#;

const MAX_TOKENS: u32 = 1200;

/// Extract regulatory events from a document via one model call.
///
/// Transport failures propagate; an unparsable response yields an empty
/// event list, the same as a document with no regulatory content.
pub async fn extract_events(model: &dyn ChatModel, document: &str) -> Result<Vec<EventRecord>> {
    let user = format!("Document:\n{}\n\nReturn JSON Eventic Graph:", document.trim());
    let raw = model.complete(SYSTEM_PROMPT, &user, MAX_TOKENS).await?;
    let events = coerce_events(&raw);
    if events.is_empty() {
        log::warn!("No events extracted from document ({} chars)", document.len());
    }
    Ok(events)
}

/// Coerce model output into event records. Accepts a bare array or an
/// `{"events": [...]}` wrapper; keeps only records with all three fields
/// present and non-empty.
fn coerce_events(raw: &str) -> Vec<EventRecord> {
    let Some(value) = parse::recover_json(raw) else {
        return Vec::new();
    };
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut out = Vec::new();
    for item in items {
        let Value::Object(obj) = item else { continue };
        let field = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(collapse_ws)
                .unwrap_or_default()
        };
        let record = EventRecord {
            agent: field("Agent"),
            deontic: field("Deontic"),
            action: field("Action"),
        };
        if !record.agent.is_empty() && !record.deontic.is_empty() && !record.action.is_empty() {
            out.push(record);
        }
    }
    out
}
