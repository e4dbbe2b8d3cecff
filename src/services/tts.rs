use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::TtsConfig;
use crate::error::{ConfigError, RenderError};
use crate::kernel::state::Language;

/// Text in, encoded audio out.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, lang: Language) -> Result<Vec<u8>, RenderError>;
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

/// ElevenLabs text-to-speech. The multilingual model covers both locales,
/// so the language does not change the request.
#[derive(Clone)]
pub struct ElevenLabsSynthesizer {
    client: Client,
    base_url: String,
    voice_id: String,
    model_id: String,
    api_key: String,
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsSynthesizer {
    pub fn new(client: Client, config: &TtsConfig) -> Result<Self, ConfigError> {
        let api_key = config.provider.require_key("ELEVENLABS_API_KEY")?.to_string();
        Ok(Self {
            client,
            base_url: config.provider.base_url.trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            model_id: config.provider.model.clone(),
            api_key,
            stability: config.stability,
            similarity_boost: config.similarity_boost,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str, _lang: Language) -> Result<Vec<u8>, RenderError> {
        let request = SynthesisRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: self.stability,
                similarity_boost: self.similarity_boost,
            },
        };

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);
        let response = self
            .client
            .post(url)
            .header("xi-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RenderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(RenderError::EmptyAudio);
        }
        Ok(audio.to_vec())
    }
}
