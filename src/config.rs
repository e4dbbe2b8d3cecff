//! Environment-driven configuration.
//!
//! Credentials stay optional here; a component that needs one checks for it
//! when it is built and fails with [`ConfigError::MissingCredential`].

use std::time::Duration;

use crate::error::ConfigError;
use crate::kernel::state::Language;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_ELEVENLABS_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";
pub const DEFAULT_ELEVENLABS_MODEL_ID: &str = "eleven_multilingual_v2";

#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    pub fn require_key(&self, name: &'static str) -> Result<&str, ConfigError> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential(name)),
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// Keys must never reach the logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TtsConfig {
    pub provider: ProviderConfig,
    pub voice_id: String,
    pub stability: f32,
    pub similarity_boost: f32,
}

/// Stub identity of the signed-in citizen, embedded in resolution prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name_en: String,
    pub name_ar: String,
    pub national_id: String,
}

impl UserProfile {
    pub fn display_name(&self, lang: Language) -> &str {
        match lang {
            Language::ArSa => &self.name_ar,
            Language::EnUs => &self.name_en,
        }
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name_en: "Mohammed Al-Saud".to_string(),
            name_ar: "محمد آل سعود".to_string(),
            national_id: "1056789012".to_string(),
        }
    }
}

/// Command lines for on-device audio in the console client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAudioConfig {
    /// Speaks text with a local synthesis voice.
    pub local_voice_command: String,
    /// Plays encoded audio fed on stdin.
    pub audio_player_command: String,
}

impl Default for DeviceAudioConfig {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self {
                local_voice_command: "say".to_string(),
                audio_player_command: "ffplay -nodisp -autoexit -loglevel quiet -".to_string(),
            }
        } else {
            Self {
                local_voice_command: "espeak-ng".to_string(),
                audio_player_command: "ffplay -nodisp -autoexit -loglevel quiet -".to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub provider_timeout: Duration,
    pub gemini: ProviderConfig,
    pub groq: ProviderConfig,
    pub tts: TtsConfig,
    pub user: UserProfile,
    pub device_audio: DeviceAudioConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any name -> value lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let or = |name: &str, default: &str| get(name).unwrap_or_else(|| default.to_string());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match get("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                name: "PROVIDER_TIMEOUT_SECS",
                value: raw,
            })?,
            None => 20,
        };

        let device_defaults = DeviceAudioConfig::default();

        Ok(Self {
            host: or("BIND_HOST", "127.0.0.1"),
            port,
            provider_timeout: Duration::from_secs(timeout_secs),
            gemini: ProviderConfig {
                api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
                base_url: or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
                model: or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            },
            groq: ProviderConfig {
                api_key: get("GROQ_API_KEY"),
                base_url: or("GROQ_BASE_URL", DEFAULT_GROQ_BASE_URL),
                model: or("GROQ_MODEL", DEFAULT_GROQ_MODEL),
            },
            tts: TtsConfig {
                provider: ProviderConfig {
                    api_key: get("ELEVENLABS_API_KEY"),
                    base_url: or("ELEVENLABS_BASE_URL", DEFAULT_ELEVENLABS_BASE_URL),
                    model: or("ELEVENLABS_MODEL_ID", DEFAULT_ELEVENLABS_MODEL_ID),
                },
                voice_id: or("ELEVENLABS_VOICE_ID", DEFAULT_ELEVENLABS_VOICE_ID),
                stability: 0.5,
                similarity_boost: 0.75,
            },
            user: UserProfile::default(),
            device_audio: DeviceAudioConfig {
                local_voice_command: get("LOCAL_VOICE_COMMAND")
                    .unwrap_or(device_defaults.local_voice_command),
                audio_player_command: get("AUDIO_PLAYER_COMMAND")
                    .unwrap_or(device_defaults.audio_player_command),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
