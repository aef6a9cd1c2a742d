//! Speech capture and synthesis
//!
//! Transcription windows over an injected hypothesis source, and HTTP
//! text-to-speech with audio delivered into an injected sink.

mod recognizer;
mod synthesizer;

pub use recognizer::VoiceRecognizer;
pub use synthesizer::SpeechSynthesizer;

use async_trait::async_trait;

use crate::Result;

/// Trait for speech-to-text capture
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Listen for one utterance and return the recognized text
    ///
    /// Resolves as soon as a non-empty hypothesis is recognized, when the
    /// listening window elapses, or when `stop` is called, whichever comes
    /// first. An empty string means nothing was recognized.
    ///
    /// # Errors
    ///
    /// Returns error if a capture is already in flight
    async fn transcribe(&self, locale: &str) -> Result<String>;

    /// Stop an in-flight capture, resolving it with the text heard so far
    fn stop(&self);
}

/// Trait for text-to-speech delivery
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak the given text, cutting off any in-progress utterance
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or audio delivery fails
    async fn speak(&self, text: &str, language: &str) -> Result<()>;

    /// Cut off the current utterance
    fn stop(&self);
}
