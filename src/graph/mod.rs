//! Graph data model: triples, tagged edges, and cross-source deduplication.
//!
//! Every external source produces untagged `Triple`s; the fusion layer tags
//! them with the `SourceGraph` they came from. Edge identity for dedup is
//! `(lowercase source, relation, lowercase target, source_graph)` — relation
//! stays case-sensitive, and the same (source, target) pair may appear once
//! per originating graph but never twice from the same one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Provenance tag identifying which source produced an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceGraph {
    /// Seed edges extracted from the document (Agent/Deontic/Action)
    Eventic,
    /// Commonsense associations (ConceptNet)
    Concept,
    /// Encyclopedic relations (DBpedia)
    Entity,
    /// Generated one-sentence definitions
    TermDefinition,
}

/// An untagged (source, relation, target) triple as returned by a source
/// adapter, before provenance tagging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub source: String,
    pub relation: String,
    pub target: String,
}

impl Triple {
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
        }
    }
}

/// A directed, labeled edge in the fusion graph, tagged with its provenance.
/// Immutable once created; never mutated after dedup insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub relation: String,
    pub target: String,
    pub source_graph: SourceGraph,
}

impl Edge {
    /// Tag an untagged triple with the graph it originated from.
    pub fn tagged(triple: Triple, graph: SourceGraph) -> Self {
        Self {
            source: triple.source,
            relation: triple.relation,
            target: triple.target,
            source_graph: graph,
        }
    }
}

/// The final merged, deduplicated edge set — the sole output artifact.
/// Serializes to `{"edges": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionGraph {
    pub edges: Vec<Edge>,
}

/// Collapse internal whitespace runs to single spaces and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Deduplicate edges across sources and rounds, preserving first-seen order.
///
/// Identity key is `(lowercase source, relation, lowercase target,
/// source_graph)`. Edges with any empty field after whitespace collapsing
/// are dropped (this is also what discards failure-sentinel definition
/// triples with an empty target).
pub fn dedup_edges(edges: impl IntoIterator<Item = Edge>) -> Vec<Edge> {
    let mut seen: HashSet<(String, String, String, SourceGraph)> = HashSet::new();
    let mut out = Vec::new();
    for e in edges {
        let src = collapse_ws(&e.source);
        let rel = collapse_ws(&e.relation);
        let tgt = collapse_ws(&e.target);
        if src.is_empty() || rel.is_empty() || tgt.is_empty() {
            continue;
        }
        let key = (src.to_lowercase(), rel.clone(), tgt.to_lowercase(), e.source_graph);
        if seen.contains(&key) {
            continue;
        }
        seen.insert(key);
        out.push(Edge {
            source: src,
            relation: rel,
            target: tgt,
            source_graph: e.source_graph,
        });
    }
    out
}
