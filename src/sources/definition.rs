//! Term-definition adapter: one generated "IsA" definition per keyword.
//!
//! The relation is hard-pinned to "IsA" and the source to the exact input
//! term no matter what the model emits, so the definition always stitches
//! onto the node it was asked about. Irrecoverable parse failures yield a
//! triple with an empty target rather than nothing — the
//! one-definition-per-keyword invariant needs a record to exist.

use super::DefinitionSource;
use crate::graph::{collapse_ws, Triple};
use crate::model::{parse, ChatModel};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Relation used for every definition edge.
pub const DEFINITION_RELATION: &str = "IsA";

const SYSTEM_PROMPT: &str = r#"You are a precise definition generator.
Given one keyword, return exactly ONE JSON object with keys: source, relation, target.

Rules:
- source: exactly the given keyword
- relation: always "IsA"
- target: one short, clear sentence (<= 25 words)
- Keep definitions concise and legally relevant when appropriate
- Output must be pure JSON only. No extra text.

Examples:
Input keyword: "GDPR"
Output: {"source": "GDPR", "relation": "IsA", "target": "An EU regulation governing personal data protection and privacy."}

Input keyword: "Contract"
Output: {"source": "Contract", "relation": "IsA", "target": "A legally binding agreement between parties enforceable by law."}"#;

const MAX_TOKENS: u32 = 400;

/// Definition source backed by a chat model.
pub struct TermDefinitionSource {
    model: Arc<dyn ChatModel>,
}

impl TermDefinitionSource {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }
}

fn user_prompt(keyword: &str) -> String {
    format!(
        "Keyword: \"{keyword}\"\n\n\
         Return JSON only:\n\
         {{\n\
           \"source\": \"{keyword}\",\n\
           \"relation\": \"IsA\",\n\
           \"target\": \"<one-sentence precise definition (<= 40 words)>\"\n\
         }}\n",
        keyword = keyword
    )
}

/// Failure sentinel: structurally valid, empty target.
fn sentinel(keyword: &str) -> Triple {
    Triple::new(collapse_ws(keyword), DEFINITION_RELATION, "")
}

/// Pull the definition target out of the model output, tolerating an
/// object, an array whose first element is the object, or a fenced block.
fn definition_target(raw: &str) -> Option<String> {
    let obj = parse::recover_json(raw).and_then(parse::first_object)?;
    let target = collapse_ws(obj.get("target").and_then(Value::as_str)?);
    if target.is_empty() {
        None
    } else {
        Some(target)
    }
}

#[async_trait]
impl DefinitionSource for TermDefinitionSource {
    async fn define(&self, term: &str) -> Triple {
        let raw = match self
            .model
            .complete(SYSTEM_PROMPT, &user_prompt(term), MAX_TOKENS)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Definition call failed for '{}': {}", term, e);
                return sentinel(term);
            }
        };

        match definition_target(&raw) {
            // Source and relation come from us, not the model.
            Some(target) => Triple::new(collapse_ws(term), DEFINITION_RELATION, target),
            None => {
                log::warn!("Unparsable definition for '{}'", term);
                sentinel(term)
            }
        }
    }
}
