#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use civic_voice::capture::{CaptureOutcome, ChannelRecognizer, Recognizer, UtteranceCapture};
use civic_voice::config::UserProfile;
use civic_voice::error::{ProviderError, RenderError};
use civic_voice::kernel::state::Language;
use civic_voice::outputs::voice::{AudioSink, LocalVoice};
use civic_voice::outputs::ResponseRenderer;
use civic_voice::services::llm::{CompletionProvider, IntentResolver, PromptBuilder, ResolutionPrompt};
use civic_voice::services::tts::SpeechSynthesizer;
use civic_voice::Session;
use tokio::sync::mpsc;

/// Provider that replays canned replies; `None` means HTTP 500.
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<ResolutionPrompt>>,
}

impl ScriptedProvider {
    pub fn new(name: &str, replies: Vec<Option<&str>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            replies: Mutex::new(replies.into_iter().map(|r| r.map(str::to_string)).collect()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Always fails with HTTP 500.
    pub fn failing(name: &str) -> Arc<Self> {
        Self::new(name, Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<ResolutionPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &ResolutionPrompt) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        match self.replies.lock().unwrap().pop_front().flatten() {
            Some(reply) => Ok(reply),
            None => Err(ProviderError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            }),
        }
    }
}

pub fn resolver(providers: &[Arc<ScriptedProvider>]) -> IntentResolver {
    let providers = providers
        .iter()
        .map(|p| p.clone() as Arc<dyn CompletionProvider>)
        .collect();
    IntentResolver::new(PromptBuilder::new(UserProfile::default()), providers)
}

/// Records every synthesis request; fails when `fail` is set.
#[derive(Default)]
pub struct RecordingSynth {
    pub fail: bool,
    pub texts: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSynthesizer for RecordingSynth {
    async fn synthesize(&self, text: &str, _lang: Language) -> Result<Vec<u8>, RenderError> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(RenderError::Status {
                status: 401,
                body: "bad key".to_string(),
            });
        }
        Ok(vec![0xFF, 0xFB, 0x90])
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub played: AtomicUsize,
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, audio: &[u8]) -> Result<(), RenderError> {
        assert!(!audio.is_empty());
        self.played.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingVoice {
    pub fail: bool,
    pub spoken: Mutex<Vec<(String, Language)>>,
}

#[async_trait]
impl LocalVoice for RecordingVoice {
    async fn speak(&self, text: &str, lang: Language) -> Result<(), RenderError> {
        if self.fail {
            return Err(RenderError::LocalVoice("no voice installed".to_string()));
        }
        self.spoken.lock().unwrap().push((text.to_string(), lang));
        Ok(())
    }
}

/// Replays transcripts in order and records the language each activation
/// asked for. Runs out into `NoSpeech`.
#[derive(Default)]
pub struct RecordingRecognizer {
    transcripts: Mutex<VecDeque<String>>,
    pub languages: Mutex<Vec<Language>>,
}

impl RecordingRecognizer {
    pub fn new(transcripts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            transcripts: Mutex::new(transcripts.iter().map(|t| t.to_string()).collect()),
            languages: Mutex::new(Vec::new()),
        })
    }

    pub fn languages(&self) -> Vec<Language> {
        self.languages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Recognizer for RecordingRecognizer {
    async fn recognize(&self, lang: Language) -> CaptureOutcome {
        self.languages.lock().unwrap().push(lang);
        match self.transcripts.lock().unwrap().pop_front() {
            Some(text) => CaptureOutcome::Transcript(text),
            None => CaptureOutcome::NoSpeech,
        }
    }
}

pub fn session_with_recognizer(providers: &[Arc<ScriptedProvider>], recognizer: Arc<dyn Recognizer>) -> Session {
    let capture = UtteranceCapture::new(recognizer);
    Session::new(capture, resolver(providers), ResponseRenderer::silent())
}

/// Session on a channel recognizer with a screen-only renderer.
pub fn session(providers: &[Arc<ScriptedProvider>]) -> (Session, mpsc::Sender<String>) {
    session_with_renderer(providers, ResponseRenderer::silent())
}

pub fn session_with_renderer(
    providers: &[Arc<ScriptedProvider>],
    renderer: ResponseRenderer,
) -> (Session, mpsc::Sender<String>) {
    let (recognizer, tx) = ChannelRecognizer::new(8);
    let capture = UtteranceCapture::new(Arc::new(recognizer));
    (Session::new(capture, resolver(providers), renderer), tx)
}
