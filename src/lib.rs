pub mod config;
pub mod error;
pub mod eventic;
pub mod fusion;
pub mod graph;
pub mod model;
pub mod sources;

pub use config::{Config, FusionConfig};
pub use error::{RegfuseError, Result};
pub use eventic::{extract_events, EventRecord};
pub use fusion::FusionBuilder;
pub use graph::{dedup_edges, Edge, FusionGraph, SourceGraph, Triple};
