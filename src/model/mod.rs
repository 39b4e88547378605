//! Chat model seam: the trait components call, plus the OpenAI-backed
//! implementation and the model-output JSON recovery parser.
//!
//! Components never construct a client themselves — they receive a
//! `&dyn ChatModel`, so tests can substitute deterministic fakes.

mod openai;
pub mod parse;

pub use openai::OpenAiChat;

use crate::error::Result;
use async_trait::async_trait;

/// A single-round-trip chat completion capability.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one system+user exchange and return the raw assistant text.
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String>;
}
