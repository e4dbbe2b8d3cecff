use std::sync::Arc;

use tracing::{debug, warn};

use super::text::Screen;
use super::voice::{AudioSink, LocalVoice};
use crate::error::RenderError;
use crate::kernel::state::Language;
use crate::services::tts::SpeechSynthesizer;

/// Which channel ended up carrying the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Primary synthesis played.
    Spoken,
    /// Primary failed; the on-device voice spoke.
    LocalFallback,
    /// No audio path worked; the screen message is all the user got.
    ScreenOnly,
    /// Nothing to speak.
    Silent,
}

/// Screen first, then primary synthesis, then the local voice.
/// Never fails: the screen message is the guaranteed channel.
#[derive(Clone, Default)]
pub struct ResponseRenderer {
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    sink: Option<Arc<dyn AudioSink>>,
    local: Option<Arc<dyn LocalVoice>>,
}

impl ResponseRenderer {
    /// Screen-only renderer.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_primary(
        mut self,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        self.synthesizer = Some(synthesizer);
        self.sink = Some(sink);
        self
    }

    pub fn with_local_voice(mut self, local: Arc<dyn LocalVoice>) -> Self {
        self.local = Some(local);
        self
    }

    pub async fn render(
        &self,
        screen: &mut Screen,
        speech: &str,
        ui_message: &str,
        lang: Language,
    ) -> RenderOutcome {
        let shown = if ui_message.trim().is_empty() { speech } else { ui_message };
        screen.show(shown);

        if speech.trim().is_empty() {
            return RenderOutcome::Silent;
        }

        match self.speak_primary(speech, lang).await {
            Ok(()) => return RenderOutcome::Spoken,
            Err(e) => warn!(error = %e, "primary synthesis failed; using local voice"),
        }

        match &self.local {
            Some(local) => match local.speak(speech, lang).await {
                Ok(()) => RenderOutcome::LocalFallback,
                Err(e) => {
                    warn!(error = %e, "local voice failed; screen message only");
                    RenderOutcome::ScreenOnly
                }
            },
            None => {
                debug!("no local voice configured");
                RenderOutcome::ScreenOnly
            }
        }
    }

    async fn speak_primary(&self, speech: &str, lang: Language) -> Result<(), RenderError> {
        let (Some(synthesizer), Some(sink)) = (&self.synthesizer, &self.sink) else {
            return Err(RenderError::Playback("no primary synthesis configured".to_string()));
        };
        let audio = synthesizer.synthesize(speech, lang).await?;
        if audio.is_empty() {
            return Err(RenderError::EmptyAudio);
        }
        sink.play(&audio).await
    }
}
