//! Speech-to-text capture over a recognition hypothesis stream

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, broadcast, mpsc};

use crate::speech::Transcriber;
use crate::{Error, Result};

/// Capacity of the partial-transcript broadcast channel
const PARTIAL_CHANNEL_CAPACITY: usize = 16;

/// Windowed speech recognizer
///
/// Consumes recognition hypotheses from an injected source. Each hypothesis
/// replaces the previous one; the first non-empty hypothesis ends the
/// listening window early.
pub struct VoiceRecognizer {
    hypotheses: Mutex<mpsc::Receiver<String>>,
    listen_window: Duration,
    stop: Notify,
    partials: broadcast::Sender<String>,
}

impl VoiceRecognizer {
    /// Create a recognizer over the given hypothesis source
    #[must_use]
    pub fn new(source: mpsc::Receiver<String>, listen_window: Duration) -> Self {
        let (partials, _) = broadcast::channel(PARTIAL_CHANNEL_CAPACITY);

        Self {
            hypotheses: Mutex::new(source),
            listen_window,
            stop: Notify::new(),
            partials,
        }
    }

    /// Subscribe to partial transcripts emitted while listening
    #[must_use]
    pub fn subscribe_partials(&self) -> broadcast::Receiver<String> {
        self.partials.subscribe()
    }
}

#[async_trait]
impl Transcriber for VoiceRecognizer {
    async fn transcribe(&self, locale: &str) -> Result<String> {
        let mut source = self
            .hypotheses
            .try_lock()
            .map_err(|_| Error::Speech("a capture is already in flight".to_string()))?;

        // Hypotheses left over from a previous window are stale
        while source.try_recv().is_ok() {}

        tracing::debug!(
            %locale,
            window_ms = self.listen_window.as_millis(),
            "listening for speech"
        );

        let deadline = tokio::time::sleep(self.listen_window);
        tokio::pin!(deadline);

        let mut recognized = String::new();

        loop {
            tokio::select! {
                () = &mut deadline => break,
                () = self.stop.notified() => break,
                hypothesis = source.recv() => match hypothesis {
                    Some(text) => {
                        recognized = text;
                        let _ = self.partials.send(recognized.clone());
                        if !recognized.is_empty() {
                            break;
                        }
                    }
                    None => break,
                },
            }
        }

        tracing::info!(transcript = %recognized, "listening window closed");
        Ok(recognized)
    }

    fn stop(&self) {
        self.stop.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn recognizer(window: Duration) -> (mpsc::Sender<String>, VoiceRecognizer) {
        let (tx, rx) = mpsc::channel(8);
        (tx, VoiceRecognizer::new(rx, window))
    }

    #[tokio::test]
    async fn test_transcribe_resolves_on_first_hypothesis() {
        let (tx, recognizer) = recognizer(Duration::from_secs(5));
        let recognizer = Arc::new(recognizer);

        let listener = {
            let recognizer = Arc::clone(&recognizer);
            tokio::spawn(async move { recognizer.transcribe("ar-SA").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send("كم مبيعات اليوم".to_string()).await.unwrap();

        let text = listener.await.unwrap().unwrap();
        assert_eq!(text, "كم مبيعات اليوم");
    }

    #[tokio::test]
    async fn test_transcribe_times_out_with_empty_text() {
        let (_tx, recognizer) = recognizer(Duration::from_millis(50));

        let text = recognizer.transcribe("ar-SA").await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_stale_hypotheses_are_discarded() {
        let (tx, recognizer) = recognizer(Duration::from_millis(50));
        tx.send("أمر قديم".to_string()).await.unwrap();

        let text = recognizer.transcribe("ar-SA").await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_concurrent_capture_is_rejected() {
        let (_tx, recognizer) = recognizer(Duration::from_secs(5));
        let recognizer = Arc::new(recognizer);

        let listener = {
            let recognizer = Arc::clone(&recognizer);
            tokio::spawn(async move { recognizer.transcribe("ar-SA").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = recognizer.transcribe("ar-SA").await;
        assert!(second.is_err());

        recognizer.stop();
        let text = listener.await.unwrap().unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_empty_hypotheses_keep_the_window_open() {
        let (tx, recognizer) = recognizer(Duration::from_secs(5));
        let recognizer = Arc::new(recognizer);
        let mut partials = recognizer.subscribe_partials();

        let listener = {
            let recognizer = Arc::clone(&recognizer);
            tokio::spawn(async move { recognizer.transcribe("ar-SA").await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(String::new()).await.unwrap();
        tx.send("اعرض المخزون".to_string()).await.unwrap();

        let text = listener.await.unwrap().unwrap();
        assert_eq!(text, "اعرض المخزون");

        assert_eq!(partials.recv().await.unwrap(), "");
        assert_eq!(partials.recv().await.unwrap(), "اعرض المخزون");
    }
}
