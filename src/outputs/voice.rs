//! On-device audio: playback of synthesized audio and the local fallback voice.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::RenderError;
use crate::kernel::state::Language;

/// Plays encoded audio (e.g. mp3 from the synthesis provider).
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, audio: &[u8]) -> Result<(), RenderError>;
}

/// Speaks text with an on-device synthesis voice.
#[async_trait]
pub trait LocalVoice: Send + Sync {
    async fn speak(&self, text: &str, lang: Language) -> Result<(), RenderError>;
}

/// Splits a configured command line into program and leading args.
fn split_command(line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Pipes audio into an external player's stdin (`ffplay -`, `mpv -`, ...).
#[derive(Debug, Clone)]
pub struct CommandAudioSink {
    program: String,
    args: Vec<String>,
}

impl CommandAudioSink {
    pub fn new(command_line: &str) -> Result<Self, RenderError> {
        let (program, args) = split_command(command_line)
            .ok_or_else(|| RenderError::Playback("empty audio player command".to_string()))?;
        Ok(Self { program, args })
    }
}

#[async_trait]
impl AudioSink for CommandAudioSink {
    async fn play(&self, audio: &[u8]) -> Result<(), RenderError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::Playback(format!("spawn {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(audio)
                .await
                .map_err(|e| RenderError::Playback(format!("write audio: {e}")))?;
            // Closing stdin signals end of stream to the player.
            drop(stdin);
        }

        let status = child
            .wait()
            .await
            .map_err(|e| RenderError::Playback(format!("wait {}: {e}", self.program)))?;
        if !status.success() {
            return Err(RenderError::Playback(format!("{} exited with {status}", self.program)));
        }
        Ok(())
    }
}

/// Local synthesis through `say` (macOS) or an espeak-compatible binary.
#[derive(Debug, Clone)]
pub struct CommandLocalVoice {
    program: String,
    args: Vec<String>,
}

impl CommandLocalVoice {
    pub fn new(command_line: &str) -> Result<Self, RenderError> {
        let (program, args) = split_command(command_line)
            .ok_or_else(|| RenderError::LocalVoice("empty local voice command".to_string()))?;
        Ok(Self { program, args })
    }

    fn is_say(&self) -> bool {
        self.program.rsplit('/').next() == Some("say")
    }

    /// Voice selector bound to the locale.
    pub fn voice_for(&self, lang: Language) -> &'static str {
        match (self.is_say(), lang) {
            (true, Language::EnUs) => "Samantha",
            (true, Language::ArSa) => "Maged",
            (false, Language::EnUs) => "en-us",
            (false, Language::ArSa) => "ar",
        }
    }
}

#[async_trait]
impl LocalVoice for CommandLocalVoice {
    async fn speak(&self, text: &str, lang: Language) -> Result<(), RenderError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg("-v")
            .arg(self.voice_for(lang))
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| RenderError::LocalVoice(format!("spawn {}: {e}", self.program)))?;

        if !status.success() {
            return Err(RenderError::LocalVoice(format!("{} exited with {status}", self.program)));
        }
        Ok(())
    }
}
