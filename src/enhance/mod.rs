//! Arabic text enhancement for transcripts and command results
//!
//! Providers are best-effort: a failed call degrades to the unmodified
//! input (or a generic acknowledgement) instead of surfacing an error.

mod openai;

pub use openai::OpenAiEnhancer;

use async_trait::async_trait;

/// Trait for text enhancement providers
#[async_trait]
pub trait TextEnhancer: Send + Sync {
    /// Correct spelling and grammar in a raw transcript without changing
    /// its meaning. Returns the input unchanged when the provider fails.
    async fn correct_text(&self, text: &str) -> String;

    /// Generate a short, friendly Arabic narration of a command result.
    /// Returns a generic acknowledgement when the provider fails.
    async fn narrate(&self, command: &str, result: &serde_json::Value) -> String;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
