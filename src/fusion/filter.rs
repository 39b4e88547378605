//! Relevance filter: model-gated selection of agents worth expanding.
//!
//! Only proper nouns, named entities, and domain-specific hard terms earn an
//! external lookup. Results are matched back against the input candidates —
//! model-invented strings never pass through. Any failure yields an empty
//! selection; the round falls back to the full candidate list.

use crate::model::{parse, ChatModel};
use serde_json::Value;
use std::collections::HashSet;

const SYSTEM_PROMPT: &str = r#"You are a selective filter. From the given list of candidate agents, return ONLY proper nouns, named entities, or domain-specific difficult terms.
Output pure JSON: {"keep": ["...", "..."]}. No extra text.

Examples:
Candidates:
- apple
- Contract
- Elon Musk
- regulation
Return:
{"keep": ["Elon Musk"]}

Candidates:
- consent
- Tesla
- obligation
- GDPR
Return:
{"keep": ["Tesla", "GDPR"]}

Candidates:
- Film producers
- Seller
- Moussa Bakayoko
- 1931 establishments in New York City
Return:
{"keep": ["Moussa Bakayoko"]}
== end of example =="#;

const MAX_TOKENS: u32 = 400;

/// Select the subset of `candidates` worth external enrichment.
///
/// Order-preserving subset of the input, matched case-insensitively against
/// the model's keep-list. Returns an empty vec on any model or parse
/// failure; the caller treats that as "keep everything".
pub(crate) async fn pick_relevant(model: &dyn ChatModel, candidates: &[String]) -> Vec<String> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let items = candidates
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");
    let user = format!(
        "Candidates:\n{}\n\nReturn:\n{{\n  \"keep\": [\"term1\", \"term2\", \"...\"]\n}}\n",
        items
    );

    let raw = match model.complete(SYSTEM_PROMPT, &user, MAX_TOKENS).await {
        Ok(raw) => raw,
        Err(e) => {
            log::warn!("Relevance filter call failed: {}", e);
            return Vec::new();
        }
    };

    let kept = intersect_keep_list(&raw, candidates);
    log::debug!("Relevance filter kept {:?} of {:?}", kept, candidates);
    kept
}

/// Parse the keep-list from model output and intersect it with the original
/// candidates (case-insensitive, input order, input casing).
fn intersect_keep_list(raw: &str, candidates: &[String]) -> Vec<String> {
    let keep: HashSet<String> = match parse::recover_json(raw) {
        Some(Value::Object(map)) => match map.get("keep") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_lowercase())
                .collect(),
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut seen: HashSet<String> = HashSet::new();
    candidates
        .iter()
        .filter(|c| {
            let key = c.trim().to_lowercase();
            keep.contains(&key) && seen.insert(key)
        })
        .cloned()
        .collect()
}
