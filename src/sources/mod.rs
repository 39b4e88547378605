//! External knowledge sources consumed during graph expansion.
//!
//! Each source maps one keyword to zero or more untagged triples. Failures
//! never cross the source boundary: transport and parse problems surface as
//! `Fetched::Degraded`, which callers collapse to an empty contribution.

mod concept;
mod definition;
mod entity;

pub use concept::ConceptNetSource;
pub use definition::TermDefinitionSource;
pub use entity::DbpediaSource;

use crate::graph::Triple;
use async_trait::async_trait;

/// Outcome of a single source fetch.
///
/// `Degraded` carries the reason a call produced nothing (timeout, HTTP
/// status, unparsable payload, unresolvable entity). Callers collapse it to
/// an empty edge list; tests inspect it directly.
#[derive(Debug)]
pub enum Fetched {
    Edges(Vec<Triple>),
    Degraded(String),
}

impl Fetched {
    /// Collapse to the edge list, logging the degradation reason if any.
    pub fn collapse(self, term: &str) -> Vec<Triple> {
        match self {
            Fetched::Edges(edges) => edges,
            Fetched::Degraded(reason) => {
                log::warn!("Source degraded for '{}': {}", term, reason);
                Vec::new()
            }
        }
    }

    #[cfg(test)]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded(_))
    }
}

/// Commonsense-association lookup (one-hop, weighted).
#[async_trait]
pub trait ConceptSource: Send + Sync {
    async fn fetch(&self, term: &str, min_weight: f64, max_edges: Option<usize>) -> Fetched;
}

/// Encyclopedic entity lookup (resolve-then-query, unweighted).
#[async_trait]
pub trait EntitySource: Send + Sync {
    async fn fetch(&self, term: &str, max_edges: Option<usize>) -> Fetched;
}

/// Generated term definition. Always yields exactly one triple; on
/// irrecoverable failure the triple has an empty target, never zero triples.
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    async fn define(&self, term: &str) -> Triple;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_edges() {
        let f = Fetched::Edges(vec![Triple::new("a", "r", "b")]);
        assert_eq!(f.collapse("a").len(), 1);
    }

    #[test]
    fn test_collapse_degraded_is_empty() {
        let f = Fetched::Degraded("timeout".to_string());
        assert!(f.is_degraded());
        assert!(f.collapse("a").is_empty());
    }
}
