//! Answer Generator
//!
//! - **prompt**: French prompt policy and the `Prompt` value
//! - **mistral**: hosted chat completions with retries
//! - **offline**: deterministic fallback when no API key is configured

pub mod error;
pub mod mistral;
pub mod offline;
pub mod prompt;

pub use error::{GeneratorError, GeneratorResult};
pub use mistral::MistralGenerator;
pub use offline::OfflineGenerator;
pub use prompt::{Prompt, GREETING_REPLY, SYSTEM_PROMPT};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::GeneratorConfig;

/// Produces an answer for a prompt; the output is not validated further
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Model or backend name for logs
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &Prompt) -> GeneratorResult<String>;
}

/// Mistral when a usable key is configured, the offline generator otherwise
pub fn from_config(config: &GeneratorConfig) -> GeneratorResult<Arc<dyn AnswerGenerator>> {
    match config.usable_api_key() {
        Some(key) => Ok(Arc::new(MistralGenerator::new(config, key)?)),
        None => {
            tracing::warn!("No Mistral API key configured, answers will be generated offline");
            Ok(Arc::new(OfflineGenerator::new()))
        }
    }
}
