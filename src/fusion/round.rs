//! A single expansion round: relevance filter, sequential per-agent fan-out
//! across the enabled sources, and next-frontier assembly.
//!
//! Frontier exclusion is round-local by design: a term in this round's
//! input queue is kept out of the next frontier, but a term expanded in an
//! earlier round may be rediscovered and expanded again later.

use super::{filter, FusionBuilder};
use crate::graph::{collapse_ws, dedup_edges, Edge, SourceGraph};
use std::collections::HashSet;

impl FusionBuilder {
    /// Expand one round of agents. Returns the (deduplicated) edges this
    /// round discovered and the next round's frontier.
    ///
    /// Never fails: every source degradation collapses to an empty
    /// contribution for that agent.
    pub(super) async fn expand_once(&self, agents: &[String]) -> (Vec<Edge>, Vec<String>) {
        let mut edges: Vec<Edge> = Vec::new();
        // Raw Concept/Entity targets, candidates for the next frontier.
        let mut discovered: Vec<String> = Vec::new();

        let mut targets = filter::pick_relevant(self.model.as_ref(), agents).await;
        if targets.is_empty() {
            log::debug!(
                "Filter kept nothing; falling back to all {} candidates",
                agents.len()
            );
            targets = agents.to_vec();
        }

        for agent in &targets {
            if self.config.use_concept_graph {
                if let Some(source) = &self.concept {
                    let triples = source
                        .fetch(agent, self.config.concept_min_weight, self.config.concept_max)
                        .await
                        .collapse(agent);
                    log::debug!("Concept graph: '{}' -> {} edge(s)", agent, triples.len());
                    for triple in triples {
                        discovered.push(triple.target.clone());
                        edges.push(Edge::tagged(triple, SourceGraph::Concept));
                    }
                }
            }

            if self.config.use_entity_graph {
                if let Some(source) = &self.entity {
                    let triples = source
                        .fetch(agent, self.config.entity_max)
                        .await
                        .collapse(agent);
                    log::debug!("Entity graph: '{}' -> {} edge(s)", agent, triples.len());
                    for triple in triples {
                        discovered.push(triple.target.clone());
                        edges.push(Edge::tagged(triple, SourceGraph::Entity));
                    }
                }
            }

            if self.config.use_term_definition_graph {
                if let Some(source) = &self.definition {
                    let triple = source.define(agent).await;
                    log::debug!("Definition: '{}' IsA '{}'", agent, triple.target);
                    // Definitions are terminal knowledge: counted as edges
                    // only when configured, never enqueued.
                    if self.config.include_tdg_edges {
                        edges.push(Edge::tagged(triple, SourceGraph::TermDefinition));
                    }
                }
            }
        }

        let frontier = next_frontier(agents, discovered);
        (dedup_edges(edges), frontier)
    }
}

/// Assemble the next frontier from raw discovered targets: whitespace
/// collapsed, case-insensitively distinct, and excluding anything in the
/// current round's input.
fn next_frontier(current: &[String], discovered: Vec<String>) -> Vec<String> {
    let current_keys: HashSet<String> = current.iter().map(|a| a.to_lowercase()).collect();
    let mut seen: HashSet<String> = HashSet::new();
    let mut frontier = Vec::new();
    for raw in discovered {
        let term = collapse_ws(&raw);
        if term.is_empty() {
            continue;
        }
        let key = term.to_lowercase();
        if current_keys.contains(&key) || !seen.insert(key) {
            continue;
        }
        frontier.push(term);
    }
    frontier
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_frontier_excludes_current_round_inputs() {
        let frontier = next_frontier(
            &strings(&["Tesla", "GDPR"]),
            strings(&["tesla", "Elon Musk", "GDPR", "SpaceX"]),
        );
        assert_eq!(frontier, strings(&["Elon Musk", "SpaceX"]));
    }

    #[test]
    fn test_frontier_dedup_case_insensitive() {
        let frontier = next_frontier(
            &[],
            strings(&["Elon Musk", "elon  musk", "ELON MUSK"]),
        );
        assert_eq!(frontier, strings(&["Elon Musk"]));
    }

    #[test]
    fn test_frontier_drops_empty_terms() {
        let frontier = next_frontier(&[], strings(&["", "   ", "Austin"]));
        assert_eq!(frontier, strings(&["Austin"]));
    }
}
