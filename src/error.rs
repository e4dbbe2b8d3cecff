use thiserror::Error;

/// Missing or malformed configuration. Fatal for the request that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required credential {0}")]
    MissingCredential(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Another activation is still outstanding.
    #[error("capture already active")]
    Busy,
}

/// One failed provider attempt.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider reply carried no text payload")]
    MissingText,
    #[error("provider reply is not a structured action: {0}")]
    Unparseable(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Every configured provider was tried once and failed.
    #[error("all {attempts} provider attempt(s) failed; last: {last}")]
    Exhausted { attempts: usize, last: ProviderError },
    #[error("no language-understanding provider configured")]
    NoProviders,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("synthesis transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("synthesis returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("synthesis returned empty audio")]
    EmptyAudio,
    #[error("playback failed: {0}")]
    Playback(String),
    #[error("local voice failed: {0}")]
    LocalVoice(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("session busy: a turn is already in flight")]
    Busy,
    #[error("empty field name for targeted capture")]
    EmptyField,
}
