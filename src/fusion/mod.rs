//! Fusion graph construction: seed from eventic events, then enrich over
//! multiple expansion rounds against the external knowledge sources.
//!
//! The orchestrator owns the accumulators; rounds run strictly one after
//! another, and each round's frontier wholesale-replaces the agent queue.
//! No failure below this layer is fatal — with every external source down,
//! the output is exactly the deduplicated seed edges.

mod filter;
mod round;

use crate::config::FusionConfig;
use crate::eventic::EventRecord;
use crate::graph::{collapse_ws, dedup_edges, Edge, FusionGraph, SourceGraph};
use crate::model::ChatModel;
use crate::sources::{ConceptSource, DefinitionSource, EntitySource};
use std::collections::HashSet;
use std::sync::Arc;

/// Builds a fusion graph from extracted events.
///
/// The chat model (relevance filter) and the three sources are injected;
/// a source that is absent or disabled in the config simply contributes
/// nothing.
pub struct FusionBuilder {
    model: Arc<dyn ChatModel>,
    concept: Option<Arc<dyn ConceptSource>>,
    entity: Option<Arc<dyn EntitySource>>,
    definition: Option<Arc<dyn DefinitionSource>>,
    config: FusionConfig,
}

impl FusionBuilder {
    pub fn new(model: Arc<dyn ChatModel>, config: FusionConfig) -> Self {
        Self {
            model,
            concept: None,
            entity: None,
            definition: None,
            config,
        }
    }

    pub fn with_concept_source(mut self, source: Arc<dyn ConceptSource>) -> Self {
        self.concept = Some(source);
        self
    }

    pub fn with_entity_source(mut self, source: Arc<dyn EntitySource>) -> Self {
        self.entity = Some(source);
        self
    }

    pub fn with_definition_source(mut self, source: Arc<dyn DefinitionSource>) -> Self {
        self.definition = Some(source);
        self
    }

    /// Build the fusion graph: seed eventic edges, expand for up to
    /// `config.rounds` rounds (stopping early on an empty frontier), then
    /// deduplicate the accumulated edge set.
    pub async fn build(&self, events: &[EventRecord]) -> FusionGraph {
        let mut edges = seed_edges(events);
        let mut frontier = initial_agents(events);
        log::info!(
            "Fusion build: {} seed edges, initial frontier {:?}",
            edges.len(),
            frontier
        );

        for round in 1..=self.config.rounds {
            if frontier.is_empty() {
                log::info!("Frontier empty, stopping at round {}", round);
                break;
            }
            log::info!("--- Round {} ({} agents) ---", round, frontier.len());
            let (new_edges, next_frontier) = self.expand_once(&frontier).await;
            log::info!(
                "Round {} added {} edges, next frontier {:?}",
                round,
                new_edges.len(),
                next_frontier
            );
            edges.extend(new_edges);
            frontier = next_frontier;
        }

        let edges = dedup_edges(edges);
        log::info!("Fusion build done: {} unique edges", edges.len());
        FusionGraph { edges }
    }
}

/// Convert event records to seed edges, silently dropping records with any
/// missing field.
fn seed_edges(events: &[EventRecord]) -> Vec<Edge> {
    events
        .iter()
        .filter_map(|ev| {
            let source = collapse_ws(&ev.agent);
            let relation = collapse_ws(&ev.deontic);
            let target = collapse_ws(&ev.action);
            if source.is_empty() || relation.is_empty() || target.is_empty() {
                return None;
            }
            Some(Edge {
                source,
                relation,
                target,
                source_graph: SourceGraph::Eventic,
            })
        })
        .collect()
}

/// Distinct agent values across all events, order-preserving and
/// case-insensitively unique.
fn initial_agents(events: &[EventRecord]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut agents = Vec::new();
    for ev in events {
        let agent = collapse_ws(&ev.agent);
        if agent.is_empty() {
            continue;
        }
        let key = agent.to_lowercase();
        if seen.insert(key) {
            agents.push(agent);
        }
    }
    agents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::graph::Triple;
    use crate::sources::Fetched;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn event(agent: &str, deontic: &str, action: &str) -> EventRecord {
        EventRecord {
            agent: agent.to_string(),
            deontic: deontic.to_string(),
            action: action.to_string(),
        }
    }

    /// Filter model that keeps everything it is shown.
    struct KeepAllModel;

    #[async_trait]
    impl ChatModel for KeepAllModel {
        async fn complete(&self, _system: &str, user: &str, _max_tokens: u32) -> Result<String> {
            let keep: Vec<&str> = user
                .lines()
                .filter_map(|l| l.strip_prefix("- "))
                .collect();
            Ok(serde_json::json!({ "keep": keep }).to_string())
        }
    }

    /// Filter model that keeps nothing (exercises the fallback).
    struct KeepNoneModel;

    #[async_trait]
    impl ChatModel for KeepNoneModel {
        async fn complete(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String> {
            Ok(r#"{"keep": []}"#.to_string())
        }
    }

    /// Concept source that records queried terms and maps each term to
    /// canned targets.
    struct ScriptedConcept {
        targets: Vec<(&'static str, Vec<&'static str>)>,
        queried: Mutex<Vec<String>>,
    }

    impl ScriptedConcept {
        fn new(targets: Vec<(&'static str, Vec<&'static str>)>) -> Self {
            Self {
                targets,
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConceptSource for ScriptedConcept {
        async fn fetch(&self, term: &str, _min_weight: f64, _max: Option<usize>) -> Fetched {
            self.queried.lock().unwrap().push(term.to_string());
            let edges = self
                .targets
                .iter()
                .find(|(t, _)| t.eq_ignore_ascii_case(term))
                .map(|(_, targets)| {
                    targets
                        .iter()
                        .map(|tgt| Triple::new(term, "RelatedTo", *tgt))
                        .collect()
                })
                .unwrap_or_default();
            Fetched::Edges(edges)
        }
    }

    struct DownEntity;

    #[async_trait]
    impl EntitySource for DownEntity {
        async fn fetch(&self, _term: &str, _max: Option<usize>) -> Fetched {
            Fetched::Degraded("service unavailable".to_string())
        }
    }

    struct CannedDefinition;

    #[async_trait]
    impl DefinitionSource for CannedDefinition {
        async fn define(&self, term: &str) -> Triple {
            Triple::new(term, "IsA", format!("definition of {}", term))
        }
    }

    fn disabled_config(rounds: usize) -> FusionConfig {
        FusionConfig {
            rounds,
            use_concept_graph: false,
            use_entity_graph: false,
            use_term_definition_graph: false,
            ..FusionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_rounds_zero_yields_seed_only() {
        let builder = FusionBuilder::new(Arc::new(KeepAllModel), disabled_config(0));
        let graph = builder
            .build(&[event("Controller", "must", "delete personal data")])
            .await;
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source_graph, SourceGraph::Eventic);
    }

    #[tokio::test]
    async fn test_all_sources_disabled_scenario() {
        let builder = FusionBuilder::new(Arc::new(KeepAllModel), disabled_config(1));
        let graph = builder
            .build(&[event("Controller", "must", "delete personal data")])
            .await;
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"edges": [{
                "source": "Controller",
                "relation": "must",
                "target": "delete personal data",
                "source_graph": "eventic"
            }]})
        );
    }

    #[tokio::test]
    async fn test_empty_events_terminate_immediately() {
        let builder = FusionBuilder::new(Arc::new(KeepAllModel), disabled_config(5));
        let graph = builder.build(&[]).await;
        assert!(graph.edges.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_events_are_dropped() {
        let builder = FusionBuilder::new(Arc::new(KeepAllModel), disabled_config(0));
        let graph = builder
            .build(&[
                event("Controller", "must", "delete data"),
                event("", "must", "x"),
                event("Processor", "", "y"),
            ])
            .await;
        assert_eq!(graph.edges.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_edges_deduplicated() {
        let builder = FusionBuilder::new(Arc::new(KeepAllModel), disabled_config(0));
        let graph = builder
            .build(&[
                event("Controller", "must", "delete data"),
                event("controller", "must", "DELETE DATA"),
            ])
            .await;
        assert_eq!(graph.edges.len(), 1);
    }

    #[tokio::test]
    async fn test_expansion_accumulates_across_rounds() {
        let concept = Arc::new(ScriptedConcept::new(vec![
            ("Tesla", vec!["Elon Musk"]),
            ("Elon Musk", vec!["SpaceX"]),
        ]));
        let config = FusionConfig {
            rounds: 2,
            use_entity_graph: false,
            use_term_definition_graph: false,
            ..FusionConfig::default()
        };
        let builder = FusionBuilder::new(Arc::new(KeepAllModel), config)
            .with_concept_source(concept.clone());
        let graph = builder.build(&[event("Tesla", "must", "recall cars")]).await;

        // seed + Tesla->Elon Musk + Elon Musk->SpaceX
        assert_eq!(graph.edges.len(), 3);
        let queried = concept.queried.lock().unwrap().clone();
        assert_eq!(queried, vec!["Tesla".to_string(), "Elon Musk".to_string()]);
        // monotonic: seed edge still present
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source_graph == SourceGraph::Eventic && e.source == "Tesla"));
    }

    #[tokio::test]
    async fn test_degraded_entity_source_never_fatal() {
        let config = FusionConfig {
            rounds: 1,
            use_concept_graph: false,
            use_term_definition_graph: false,
            ..FusionConfig::default()
        };
        let builder = FusionBuilder::new(Arc::new(KeepAllModel), config)
            .with_entity_source(Arc::new(DownEntity));
        let graph = builder.build(&[event("Tesla", "must", "recall cars")]).await;
        assert_eq!(graph.edges.len(), 1); // seed only
    }

    #[tokio::test]
    async fn test_filter_fallback_expands_every_candidate() {
        let concept = Arc::new(ScriptedConcept::new(vec![]));
        let config = FusionConfig {
            rounds: 1,
            use_entity_graph: false,
            use_term_definition_graph: false,
            ..FusionConfig::default()
        };
        let builder = FusionBuilder::new(Arc::new(KeepNoneModel), config)
            .with_concept_source(concept.clone());
        builder
            .build(&[
                event("Controller", "must", "delete data"),
                event("Processor", "must_not", "transfer data"),
            ])
            .await;
        let queried = concept.queried.lock().unwrap().clone();
        assert_eq!(
            queried,
            vec!["Controller".to_string(), "Processor".to_string()]
        );
    }

    #[tokio::test]
    async fn test_definition_edges_gated_by_flag() {
        let base = FusionConfig {
            rounds: 1,
            use_concept_graph: false,
            use_entity_graph: false,
            ..FusionConfig::default()
        };
        let events = [event("GDPR", "must", "be observed")];

        let excluded = FusionBuilder::new(
            Arc::new(KeepAllModel),
            FusionConfig {
                include_tdg_edges: false,
                ..base.clone()
            },
        )
        .with_definition_source(Arc::new(CannedDefinition));
        assert_eq!(excluded.build(&events).await.edges.len(), 1);

        let included = FusionBuilder::new(
            Arc::new(KeepAllModel),
            FusionConfig {
                include_tdg_edges: true,
                ..base
            },
        )
        .with_definition_source(Arc::new(CannedDefinition));
        let graph = included.build(&events).await;
        assert_eq!(graph.edges.len(), 2);
        assert!(graph
            .edges
            .iter()
            .any(|e| e.source_graph == SourceGraph::TermDefinition
                && e.target == "definition of GDPR"));
    }

    #[tokio::test]
    async fn test_definition_targets_never_reach_frontier() {
        // Definitions enabled and included for both rounds; if their targets
        // fed the frontier, round 2 would query the definition text.
        let concept = Arc::new(ScriptedConcept::new(vec![]));
        let config = FusionConfig {
            rounds: 2,
            include_tdg_edges: true,
            use_entity_graph: false,
            ..FusionConfig::default()
        };
        let builder = FusionBuilder::new(Arc::new(KeepAllModel), config)
            .with_concept_source(concept.clone())
            .with_definition_source(Arc::new(CannedDefinition));
        builder.build(&[event("GDPR", "must", "be observed")]).await;
        let queried = concept.queried.lock().unwrap().clone();
        assert_eq!(queried, vec!["GDPR".to_string()]);
    }

    #[test]
    fn test_initial_agents_distinct_case_insensitive() {
        let agents = initial_agents(&[
            event("Controller", "must", "a"),
            event("  controller ", "may", "b"),
            event("Processor", "must", "c"),
        ]);
        assert_eq!(agents, vec!["Controller".to_string(), "Processor".to_string()]);
    }
}
