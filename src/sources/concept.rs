//! ConceptNet adapter: one-hop commonsense associations for a keyword.
//!
//! Weight is used only to filter and rank within a single call; it is
//! stripped before triples leave this module.

use super::{ConceptSource, Fetched};
use crate::graph::Triple;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.conceptnet.io";

/// ConceptNet (English) source adapter.
pub struct ConceptNetSource {
    client: Client,
    base_url: String,
    /// API page size, clamped to 10..=1000 at request time.
    limit: usize,
    /// Optional relation allow-list (matched on the relation local name).
    allowed_relations: Option<HashSet<String>>,
}

impl ConceptNetSource {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation).
    pub fn new(base_url: Option<String>, limit: usize, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            limit,
            allowed_relations: None,
        }
    }

    /// Restrict results to the given relation names (e.g. IsA, CapableOf).
    pub fn with_allowed_relations(mut self, relations: HashSet<String>) -> Self {
        self.allowed_relations = Some(relations);
        self
    }
}

/// ConceptNet URI normalization: lowercase, spaces to underscores.
fn norm_term(term: &str) -> String {
    term.trim().to_lowercase().replace(' ', "_")
}

/// Human-readable node label, falling back to the ID's trailing segment.
fn label_of(node: &Value) -> String {
    if let Some(label) = node.get("label").and_then(Value::as_str) {
        return label.to_string();
    }
    node.get("@id")
        .and_then(Value::as_str)
        .map(|id| id.rsplit('/').next().unwrap_or("").to_string())
        .unwrap_or_default()
}

/// Relation local name: `/r/RelatedTo` → `RelatedTo`.
fn rel_of(rel: &Value) -> String {
    rel.get("@id")
        .and_then(Value::as_str)
        .map(|id| id.split('/').next_back().unwrap_or("").to_string())
        .unwrap_or_default()
}

/// Shape a raw ConceptNet response body into triples: weight filter,
/// relation allow-list, per-call dedup, weight-descending sort, truncation.
/// Pure so it can be tested against literal payloads.
fn shape_edges(
    body: &Value,
    min_weight: f64,
    allowed_relations: Option<&HashSet<String>>,
    max_edges: Option<usize>,
) -> Vec<Triple> {
    let mut weighted: Vec<(Triple, f64)> = Vec::new();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();

    let edges = body
        .get("edges")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    for edge in edges {
        let weight = edge.get("weight").and_then(Value::as_f64).unwrap_or(0.0);
        if weight < min_weight {
            continue;
        }
        let relation = edge.get("rel").map(rel_of).unwrap_or_default();
        if let Some(allowed) = allowed_relations {
            if !allowed.contains(&relation) {
                continue;
            }
        }
        let source = edge.get("start").map(label_of).unwrap_or_default();
        let target = edge.get("end").map(label_of).unwrap_or_default();

        let sig = (source.to_lowercase(), relation.clone(), target.to_lowercase());
        if seen.contains(&sig) {
            continue;
        }
        seen.insert(sig);
        weighted.push((Triple::new(source, relation, target), weight));
    }

    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some(max) = max_edges {
        weighted.truncate(max);
    }
    weighted.into_iter().map(|(t, _)| t).collect()
}

#[async_trait]
impl ConceptSource for ConceptNetSource {
    async fn fetch(&self, term: &str, min_weight: f64, max_edges: Option<usize>) -> Fetched {
        let mut url = match Url::parse(&self.base_url) {
            Ok(u) => u,
            Err(e) => return Fetched::Degraded(format!("bad base URL: {}", e)),
        };
        let normalized = norm_term(term);
        {
            let mut segments = match url.path_segments_mut() {
                Ok(s) => s,
                Err(()) => return Fetched::Degraded("base URL cannot take a path".to_string()),
            };
            segments.extend(["c", "en", normalized.as_str()]);
        }
        url.query_pairs_mut()
            .append_pair("limit", &self.limit.clamp(10, 1000).to_string());

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => return Fetched::Degraded(format!("request failed: {}", e)),
        };
        if !response.status().is_success() {
            return Fetched::Degraded(format!("HTTP {}", response.status()));
        }
        let body: Value = match response.json().await {
            Ok(b) => b,
            Err(e) => return Fetched::Degraded(format!("invalid JSON: {}", e)),
        };

        Fetched::Edges(shape_edges(
            &body,
            min_weight,
            self.allowed_relations.as_ref(),
            max_edges,
        ))
    }
}
