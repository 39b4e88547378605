use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub regfuse: RegfuseConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

/// General settings
#[derive(Debug, Clone, Deserialize)]
pub struct RegfuseConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RegfuseConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Model configuration: which chat models to use and where the API key lives
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Model used for eventic extraction (the heavier call)
    #[serde(default = "default_extract_model")]
    pub extract_model: String,
    /// Model used for the relevance filter and term definitions
    #[serde(default = "default_fusion_model")]
    pub fusion_model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            extract_model: default_extract_model(),
            fusion_model: default_fusion_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Fusion expansion options, threaded explicitly through the orchestrator,
/// rounds, and filter — there is no global mutable state.
#[derive(Debug, Clone, Deserialize)]
pub struct FusionConfig {
    /// Expansion round budget (0 = seed edges only)
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    /// Minimum ConceptNet edge weight to keep
    #[serde(default = "default_concept_min_weight")]
    pub concept_min_weight: f64,
    /// Cap on concept triples per agent (None = unlimited)
    #[serde(default = "default_concept_max")]
    pub concept_max: Option<usize>,
    /// Cap on entity triples per agent (None = unlimited)
    #[serde(default = "default_entity_max")]
    pub entity_max: Option<usize>,
    /// Include term-definition edges in the final graph
    #[serde(default)]
    pub include_tdg_edges: bool,
    #[serde(default = "default_true")]
    pub use_concept_graph: bool,
    #[serde(default = "default_true")]
    pub use_entity_graph: bool,
    #[serde(default = "default_true")]
    pub use_term_definition_graph: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            concept_min_weight: default_concept_min_weight(),
            concept_max: default_concept_max(),
            entity_max: default_entity_max(),
            include_tdg_edges: false,
            use_concept_graph: true,
            use_entity_graph: true,
            use_term_definition_graph: true,
        }
    }
}

/// External source endpoints and request shaping
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// Override for the ConceptNet API base URL
    pub concept_base_url: Option<String>,
    /// Override for the DBpedia Lookup endpoint
    pub lookup_url: Option<String>,
    /// Override for the DBpedia SPARQL endpoint
    pub sparql_url: Option<String>,
    /// ConceptNet API page size (clamped to 10..=1000 at request time)
    #[serde(default = "default_concept_limit")]
    pub concept_limit: usize,
    /// SPARQL LIMIT (clamped to 1..=2000 at query time)
    #[serde(default = "default_sparql_limit")]
    pub sparql_limit: usize,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional ConceptNet relation allow-list (e.g. ["IsA", "CapableOf"])
    pub concept_relations: Option<HashSet<String>>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            concept_base_url: None,
            lookup_url: None,
            sparql_url: None,
            concept_limit: default_concept_limit(),
            sparql_limit: default_sparql_limit(),
            timeout_secs: default_timeout_secs(),
            concept_relations: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_extract_model() -> String {
    "gpt-4o".to_string()
}

fn default_fusion_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_rounds() -> usize {
    2
}

fn default_concept_min_weight() -> f64 {
    4.0
}

fn default_concept_max() -> Option<usize> {
    Some(3)
}

fn default_entity_max() -> Option<usize> {
    Some(3)
}

fn default_true() -> bool {
    true
}

fn default_concept_limit() -> usize {
    100
}

fn default_sparql_limit() -> usize {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading
    /// config. Looks for the config file in this order:
    /// 1. Path specified in REGFUSE_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // Load .env file if it exists (ignore errors - file is optional)
        let _ = dotenv::dotenv();

        let config_path = std::env::var("REGFUSE_CONFIG")
            .unwrap_or_else(|_| "config.toml".to_string());

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config.toml")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        // Check both environment variable and .env file (dotenv already loaded in Config::load)
        std::env::var(&self.model.api_key_env).with_context(|| {
            format!(
                "Environment variable {} not set. Set it in your .env file or as an environment variable with your OpenAI API key.",
                self.model.api_key_env
            )
        })?;

        if self.model.extract_model.is_empty() || self.model.fusion_model.is_empty() {
            anyhow::bail!("model.extract_model and model.fusion_model must be non-empty");
        }

        if self.sources.timeout_secs == 0 {
            anyhow::bail!("sources.timeout_secs must be greater than 0");
        }

        if self.sources.concept_limit == 0 || self.sources.sparql_limit == 0 {
            anyhow::bail!("sources.concept_limit and sources.sparql_limit must be greater than 0");
        }

        Ok(())
    }

    /// Resolve the API key named by `model.api_key_env`.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.model.api_key_env).with_context(|| {
            format!("Environment variable {} not set", self.model.api_key_env)
        })
    }
}
