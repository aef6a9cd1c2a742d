//! Text-to-speech synthesis over HTTP

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Notify, mpsc};

use crate::speech::Synthesizer;
use crate::{Error, Result};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Speaking rate passed to the speech API
const SPEECH_RATE: f32 = 0.9;

/// TTS provider backend
#[derive(Clone, Debug)]
enum TtsProvider {
    OpenAi,
    Local { url: String },
}

/// Synthesizes speech and delivers audio bytes into a sink channel
pub struct SpeechSynthesizer {
    client: reqwest::Client,
    provider: TtsProvider,
    api_key: Option<SecretString>,
    model: String,
    voice: String,
    sink: mpsc::Sender<Vec<u8>>,
    interrupt: Notify,
}

impl SpeechSynthesizer {
    /// Create a synthesizer using the `OpenAI` speech API
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new_openai(
        api_key: SecretString,
        model: String,
        voice: String,
        sink: mpsc::Sender<Vec<u8>>,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for speech synthesis".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            provider: TtsProvider::OpenAi,
            api_key: Some(api_key),
            model,
            voice,
            sink,
            interrupt: Notify::new(),
        })
    }

    /// Create a synthesizer against a local OpenAI-compatible speech endpoint
    #[must_use]
    pub fn new_local(
        url: String,
        model: String,
        voice: String,
        sink: mpsc::Sender<Vec<u8>>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider: TtsProvider::Local { url },
            api_key: None,
            model,
            voice,
            sink,
            interrupt: Notify::new(),
        }
    }

    async fn deliver(&self, text: &str) -> Result<()> {
        let audio = self.fetch_audio(text).await?;

        self.sink
            .send(audio)
            .await
            .map_err(|_| Error::Speech("audio sink closed".to_string()))
    }

    async fn fetch_audio(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: SPEECH_RATE,
        };

        let url = match &self.provider {
            TtsProvider::OpenAi => OPENAI_SPEECH_URL,
            TtsProvider::Local { url } => url.as_str(),
        };

        let mut builder = self.client.post(url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Speech(format!("speech API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl Synthesizer for SpeechSynthesizer {
    async fn speak(&self, text: &str, language: &str) -> Result<()> {
        // Cut off any utterance still in flight before starting a new one
        self.interrupt.notify_waiters();

        tracing::debug!(
            %language,
            voice = %self.voice,
            chars = text.chars().count(),
            "synthesizing speech"
        );

        tokio::select! {
            result = self.deliver(text) => result,
            () = self.interrupt.notified() => {
                tracing::debug!("utterance interrupted");
                Ok(())
            }
        }
    }

    fn stop(&self) {
        self.interrupt.notify_waiters();
    }
}
