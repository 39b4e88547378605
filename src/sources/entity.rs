//! DBpedia adapter: resolve a keyword to an entity, then fetch its outgoing
//! relations.
//!
//! Resolution is two-phase: the Lookup API first, then a synthesized
//! `dbr:` local name verified with a SPARQL ASK. Wiki navigation/meta
//! relations (interlinks, redirects, templates, revision links, raw rdf
//! types) are excluded by default — they are artifacts of the wiki link
//! graph, not semantic facts.

use super::{EntitySource, Fetched};
use crate::graph::Triple;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

const DEFAULT_LOOKUP_URL: &str = "https://lookup.dbpedia.org/api/search";
const DEFAULT_SPARQL_URL: &str = "https://dbpedia.org/sparql";
const DBPEDIA_RESOURCE_PREFIX: &str = "http://dbpedia.org/resource";
const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Wiki navigation/meta relation local names never treated as facts.
const NAVIGATION_BLOCKLIST: &[&str] = &[
    "wikiPageWikiLink",
    "wikiPageExternalLink",
    "wikiPageRedirects",
    "wikiPageDisambiguates",
    "wikiPageInterLanguageLink",
    "wikiPageUsesTemplate",
    "wikiPageEditLink",
    "wikiPageHistoryLink",
    "wikiPageRevisionLink",
    "wikiPageWikiLinkText",
    "wikiPageID",
    "wikiPageRevisionID",
    "wikidataSplitIri",
    "22-rdf-syntax-ns#type",
    "rdf-schema#seeAlso",
];

/// DBpedia source adapter (Lookup + SPARQL).
pub struct DbpediaSource {
    client: Client,
    lookup_url: String,
    sparql_url: String,
    /// SPARQL LIMIT, clamped to 1..=2000 at query time.
    limit: usize,
    exclude_navigation: bool,
}

impl DbpediaSource {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation).
    pub fn new(
        lookup_url: Option<String>,
        sparql_url: Option<String>,
        limit: usize,
        timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            lookup_url: lookup_url.unwrap_or_else(|| DEFAULT_LOOKUP_URL.to_string()),
            sparql_url: sparql_url.unwrap_or_else(|| DEFAULT_SPARQL_URL.to_string()),
            limit,
            exclude_navigation: true,
        }
    }

    /// Include wiki navigation/meta relations in results. Off the common
    /// path; exists for diagnostics.
    pub fn with_navigation_relations(mut self) -> Self {
        self.exclude_navigation = false;
        self
    }

    /// Resolve a keyword to an entity URI via the Lookup API, falling back
    /// to a synthesized `dbr:` local name verified with an ASK query.
    async fn resolve_entity(&self, keyword: &str) -> Option<String> {
        match self.lookup_candidates(keyword).await {
            Ok(Some(uri)) => return Some(uri),
            Ok(None) => log::debug!("Lookup found no entity for '{}'", keyword),
            Err(reason) => log::warn!("Lookup degraded for '{}': {}", keyword, reason),
        }

        let local = dbr_local_name(keyword);
        if local.is_empty() {
            return None;
        }
        let candidate = match resource_uri(&local) {
            Some(uri) => uri,
            None => return None,
        };
        log::debug!("Trying fallback entity {}", candidate);
        if self.resource_exists(&candidate).await {
            Some(candidate)
        } else {
            None
        }
    }

    async fn lookup_candidates(&self, keyword: &str) -> Result<Option<String>, String> {
        let response = self
            .client
            .get(&self.lookup_url)
            .query(&[
                ("query", keyword),
                ("maxResults", "5"),
                ("format", "json"),
            ])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| format!("lookup request failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("lookup HTTP {}", response.status()));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("lookup returned invalid JSON: {}", e))?;

        let docs = body
            .get("docs")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        Ok(docs.iter().find_map(first_candidate_uri))
    }

    /// `ASK WHERE { <uri> ?p ?o }` — does the resource have any triple at all?
    async fn resource_exists(&self, uri: &str) -> bool {
        let ask = format!("ASK WHERE {{ <{}> ?p ?o }}", uri);
        let response = match self
            .client
            .get(&self.sparql_url)
            .query(&[("query", ask.as_str()), ("format", SPARQL_RESULTS_JSON)])
            .header("Accept", SPARQL_RESULTS_JSON)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                log::warn!("ASK request failed for {}: {}", uri, e);
                return false;
            }
        };
        if !response.status().is_success() {
            return false;
        }
        response
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("boolean").and_then(Value::as_bool))
            .unwrap_or(false)
    }
}

/// First well-formed URI in a lookup result document. The `resource` field
/// is usually a one-element array; `uri` is a plain string in older
/// deployments.
fn first_candidate_uri(doc: &Value) -> Option<String> {
    for key in ["resource", "uri"] {
        match doc.get(key) {
            Some(Value::Array(items)) => {
                if let Some(uri) = items.first().and_then(Value::as_str) {
                    if uri.starts_with("http") {
                        return Some(uri.to_string());
                    }
                }
            }
            Some(Value::String(uri)) if uri.starts_with("http") => {
                return Some(uri.clone());
            }
            _ => {}
        }
    }
    None
}

/// Fallback local name per DBpedia resource conventions:
/// "new york city" → "New_York_City".
fn dbr_local_name(keyword: &str) -> String {
    let token_re = Regex::new(r"[A-Za-z0-9]+").expect("valid regex");
    let tokens: Vec<String> = token_re
        .find_iter(&keyword.trim().to_lowercase())
        .map(|m| capitalize(m.as_str()))
        .collect();
    tokens.join("_")
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Percent-encoded resource URI for a local name.
fn resource_uri(local: &str) -> Option<String> {
    let mut url = Url::parse(DBPEDIA_RESOURCE_PREFIX).ok()?;
    url.path_segments_mut().ok()?.push(local);
    Some(url.to_string())
}

/// URI trailing path segment: `.../ontology/birthPlace` → `birthPlace`.
fn localname(uri: &str) -> &str {
    uri.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

fn is_navigation_relation(p_uri: &str, rel_local: &str) -> bool {
    if rel_local.is_empty() {
        return false;
    }
    if NAVIGATION_BLOCKLIST.contains(&rel_local) || rel_local.starts_with("wikiPage") {
        return true;
    }
    p_uri.contains("dbpedia.org/ontology/wikiPage")
}

/// Shape SPARQL SELECT bindings into triples: navigation filter, label
/// preference, literal/resource target handling, per-call dedup, truncation
/// in source order. Pure so it can be tested against literal payloads.
fn shape_bindings(
    source_label: &str,
    bindings: &[Value],
    exclude_navigation: bool,
    max_edges: Option<usize>,
) -> Vec<Triple> {
    let mut triples: Vec<Triple> = Vec::new();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();

    for binding in bindings {
        let p_uri = binding
            .pointer("/p/value")
            .and_then(Value::as_str)
            .unwrap_or("");
        let rel_local = localname(p_uri);
        if exclude_navigation && is_navigation_relation(p_uri, rel_local) {
            continue;
        }

        let relation = binding
            .pointer("/pLabel/value")
            .and_then(Value::as_str)
            .unwrap_or(rel_local)
            .to_string();

        let o_value = binding
            .pointer("/o/value")
            .and_then(Value::as_str)
            .unwrap_or("");
        let o_label = binding.pointer("/oLabel/value").and_then(Value::as_str);
        let target = if binding.pointer("/o/type").and_then(Value::as_str) == Some("uri") {
            o_label
                .unwrap_or(localname(o_value))
                .replace('_', " ")
        } else {
            o_label.unwrap_or(o_value).to_string()
        };

        let sig = (
            source_label.to_lowercase(),
            relation.clone(),
            target.to_lowercase(),
        );
        if seen.contains(&sig) {
            continue;
        }
        seen.insert(sig);
        triples.push(Triple::new(source_label, relation, target));

        if let Some(max) = max_edges {
            if triples.len() >= max {
                break;
            }
        }
    }

    triples
}

#[async_trait]
impl EntitySource for DbpediaSource {
    async fn fetch(&self, term: &str, max_edges: Option<usize>) -> Fetched {
        let uri = match self.resolve_entity(term).await {
            Some(uri) => uri,
            // An unknown term is a normal miss, not a degradation.
            None => return Fetched::Edges(Vec::new()),
        };
        log::debug!("Resolved '{}' to {}", term, uri);

        let sparql = format!(
            "PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
             SELECT ?p ?pLabel ?o ?oLabel WHERE {{\n\
               <{uri}> ?p ?o .\n\
               OPTIONAL {{ ?p rdfs:label ?pLabel FILTER (lang(?pLabel) = 'en') }}\n\
               OPTIONAL {{ ?o rdfs:label ?oLabel FILTER (lang(?oLabel) = 'en') }}\n\
             }} LIMIT {limit}",
            uri = uri,
            limit = self.limit.clamp(1, 2000),
        );

        let response = match self
            .client
            .get(&self.sparql_url)
            .query(&[("query", sparql.as_str()), ("format", SPARQL_RESULTS_JSON)])
            .header("Accept", SPARQL_RESULTS_JSON)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => return Fetched::Degraded(format!("SPARQL request failed: {}", e)),
        };
        if !response.status().is_success() {
            return Fetched::Degraded(format!("SPARQL HTTP {}", response.status()));
        }
        let body: Value = match response.json().await {
            Ok(b) => b,
            Err(e) => return Fetched::Degraded(format!("SPARQL returned invalid JSON: {}", e)),
        };

        let source_label = localname(&uri).replace('_', " ");
        let bindings = body
            .pointer("/results/bindings")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        Fetched::Edges(shape_bindings(
            &source_label,
            bindings,
            self.exclude_navigation,
            max_edges,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dbr_local_name() {
        assert_eq!(dbr_local_name("new york city"), "New_York_City");
        assert_eq!(dbr_local_name("  Elon   Musk "), "Elon_Musk");
        assert_eq!(dbr_local_name("GDPR"), "Gdpr");
        assert_eq!(dbr_local_name("!!"), "");
    }

    #[test]
    fn test_localname() {
        assert_eq!(localname("http://dbpedia.org/ontology/birthPlace"), "birthPlace");
        assert_eq!(localname("http://dbpedia.org/resource/Tesla,_Inc./"), "Tesla,_Inc.");
    }

    #[test]
    fn test_navigation_relation_detection() {
        assert!(is_navigation_relation("", "wikiPageWikiLink"));
        assert!(is_navigation_relation("", "wikiPageOutDegree"));
        assert!(is_navigation_relation("", "22-rdf-syntax-ns#type"));
        assert!(is_navigation_relation(
            "http://dbpedia.org/ontology/wikiPageLength",
            "other"
        ));
        assert!(!is_navigation_relation("http://dbpedia.org/ontology/birthPlace", "birthPlace"));
        assert!(!is_navigation_relation("", ""));
    }

    #[test]
    fn test_first_candidate_uri_variants() {
        let doc = json!({"resource": ["http://dbpedia.org/resource/Tesla,_Inc."]});
        assert_eq!(
            first_candidate_uri(&doc).as_deref(),
            Some("http://dbpedia.org/resource/Tesla,_Inc.")
        );
        let doc = json!({"uri": "http://dbpedia.org/resource/Tesla"});
        assert!(first_candidate_uri(&doc).is_some());
        let doc = json!({"resource": ["not-a-uri"]});
        assert!(first_candidate_uri(&doc).is_none());
    }

    fn binding(p: &str, p_label: Option<&str>, o: &str, o_type: &str, o_label: Option<&str>) -> Value {
        let mut b = json!({
            "p": {"type": "uri", "value": p},
            "o": {"type": o_type, "value": o},
        });
        if let Some(l) = p_label {
            b["pLabel"] = json!({"value": l});
        }
        if let Some(l) = o_label {
            b["oLabel"] = json!({"value": l});
        }
        b
    }

    #[test]
    fn test_shape_bindings_excludes_navigation() {
        let bindings = vec![
            binding("http://dbpedia.org/ontology/wikiPageWikiLink", None, "http://dbpedia.org/resource/X", "uri", None),
            binding("http://dbpedia.org/ontology/birthPlace", Some("birth place"), "http://dbpedia.org/resource/Pretoria", "uri", Some("Pretoria")),
        ];
        let triples = shape_bindings("Elon Musk", &bindings, true, None);
        assert_eq!(triples.len(), 1);
        assert_eq!(triples[0].relation, "birth place");
        assert_eq!(triples[0].target, "Pretoria");
    }

    #[test]
    fn test_shape_bindings_resource_target_without_label() {
        let bindings = vec![binding(
            "http://dbpedia.org/ontology/keyPerson",
            None,
            "http://dbpedia.org/resource/Elon_Musk",
            "uri",
            None,
        )];
        let triples = shape_bindings("Tesla, Inc.", &bindings, true, None);
        assert_eq!(triples[0].relation, "keyPerson");
        assert_eq!(triples[0].target, "Elon Musk");
    }

    #[test]
    fn test_shape_bindings_literal_target() {
        let bindings = vec![binding(
            "http://dbpedia.org/ontology/numberOfEmployees",
            None,
            "127855",
            "literal",
            None,
        )];
        let triples = shape_bindings("Tesla, Inc.", &bindings, true, None);
        assert_eq!(triples[0].target, "127855");
    }

    #[test]
    fn test_shape_bindings_dedup_and_truncate() {
        let b = binding(
            "http://dbpedia.org/ontology/industry",
            None,
            "http://dbpedia.org/resource/Automotive",
            "uri",
            None,
        );
        let bindings = vec![
            b.clone(),
            b,
            binding("http://dbpedia.org/ontology/founder", None, "http://dbpedia.org/resource/Martin_Eberhard", "uri", None),
            binding("http://dbpedia.org/ontology/locationCity", None, "http://dbpedia.org/resource/Austin", "uri", None),
        ];
        let triples = shape_bindings("Tesla, Inc.", &bindings, true, Some(2));
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].target, "Automotive");
        assert_eq!(triples[1].target, "Martin Eberhard");
    }

    #[test]
    fn test_resource_uri_percent_encodes() {
        let uri = resource_uri("Tesla, Inc.").unwrap();
        assert!(uri.starts_with("http://dbpedia.org/resource/"));
        assert!(!uri.contains(' '));
    }
}
