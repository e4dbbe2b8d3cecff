use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::kernel::state::Language;

/// Result of one single-shot recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Transcript(String),
    NoSpeech,
    RecognitionError(String),
}

/// Speech-to-text boundary: one request, one terminal outcome.
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn recognize(&self, lang: Language) -> CaptureOutcome;
}

/// Wraps a recognizer and enforces one outstanding activation at a time.
pub struct UtteranceCapture {
    recognizer: Arc<dyn Recognizer>,
    active: Mutex<()>,
}

impl UtteranceCapture {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self {
            recognizer,
            active: Mutex::new(()),
        }
    }

    /// A second call while one is pending is rejected, not queued.
    ///
    /// Transcripts come back exactly as recognized; only an empty string
    /// counts as no speech. Callers decide whether surrounding whitespace
    /// matters.
    pub async fn activate(&self, lang: Language) -> Result<CaptureOutcome, CaptureError> {
        let _listening = self.active.try_lock().map_err(|_| CaptureError::Busy)?;
        debug!(lang = %lang, "listening");

        let outcome = match self.recognizer.recognize(lang).await {
            CaptureOutcome::Transcript(text) if text.is_empty() => CaptureOutcome::NoSpeech,
            other => other,
        };

        match &outcome {
            CaptureOutcome::Transcript(text) => info!(chars = text.chars().count(), "transcript finalized"),
            CaptureOutcome::NoSpeech => info!("no speech detected"),
            CaptureOutcome::RecognitionError(e) => warn!(error = %e, "recognition failed"),
        }
        Ok(outcome)
    }

    pub fn is_listening(&self) -> bool {
        self.active.try_lock().is_err()
    }
}

/// Recognizer fed by a front end that already holds finalized text
/// (browser speech API, console, test harness).
pub struct ChannelRecognizer {
    transcripts: Mutex<mpsc::Receiver<String>>,
}

impl ChannelRecognizer {
    pub fn new(buffer: usize) -> (Self, mpsc::Sender<String>) {
        let (tx, rx) = mpsc::channel(buffer);
        (
            Self {
                transcripts: Mutex::new(rx),
            },
            tx,
        )
    }
}

#[async_trait]
impl Recognizer for ChannelRecognizer {
    async fn recognize(&self, _lang: Language) -> CaptureOutcome {
        let mut rx = self.transcripts.lock().await;
        match rx.recv().await {
            Some(text) if text.is_empty() => CaptureOutcome::NoSpeech,
            Some(text) => CaptureOutcome::Transcript(text),
            None => CaptureOutcome::RecognitionError("transcript source closed".to_string()),
        }
    }
}
