use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use civic_voice::capture::{ChannelRecognizer, UtteranceCapture};
use civic_voice::config::Config;
use civic_voice::kernel::state::Language;
use civic_voice::outputs::phrases;
use civic_voice::outputs::voice::{CommandAudioSink, CommandLocalVoice};
use civic_voice::outputs::ResponseRenderer;
use civic_voice::services::llm::provider::http_client;
use civic_voice::services::llm::{IntentResolver, PromptBuilder};
use civic_voice::services::tts::ElevenLabsSynthesizer;
use civic_voice::{Session, TurnReport};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Stand-in for the biometric prompt.
const VERIFICATION_DELAY: Duration = Duration::from_secs(3);

const HELP: &str = "Speak by typing a line. Commands:
  :field <name>  dictate the next line into one form field
  :cancel        drop a pending field or verification
  :lang <tag>    switch language (en-US, ar-SA)
  :verify        complete a pending verification
  :login         sign in without voice
  :state         show the current view and form";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = Config::from_env().context("invalid configuration")?;

    let resolver = IntentResolver::from_config(&config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "no resolution provider; every request will be apologized for");
        IntentResolver::new(PromptBuilder::new(config.user.clone()), Vec::new())
    });
    let renderer = build_renderer(&config);

    let (recognizer, transcripts) = ChannelRecognizer::new(1);
    let capture = UtteranceCapture::new(Arc::new(recognizer));
    let mut session = Session::new(capture, resolver, renderer);

    tracing::info!(session = %session.id, "console session started");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(raw) = lines.next_line().await.context("reading stdin")? {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix(':') {
            let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
            match (name, arg.trim()) {
                ("field", "") => println!("usage: :field <name>"),
                ("field", field) => match session.arm_field(field) {
                    Ok(()) => println!("[next line goes into {field}]"),
                    Err(e) => println!("[{e}]"),
                },
                ("cancel", _) => {
                    if let Some(field) = session.cancel_field_capture() {
                        println!("[capture for {field} cancelled]");
                    }
                    if session.cancel_verification() {
                        println!("[verification cancelled]");
                    }
                }
                ("lang", tag) => match tag.parse::<Language>() {
                    Ok(lang) => {
                        session.set_language(lang);
                        println!("[language: {lang}]");
                    }
                    Err(()) => println!("unknown language {tag:?}"),
                },
                ("verify", _) => verify(&mut session).await,
                ("login", _) => {
                    if session.login_manually() {
                        let lang = session.context().language();
                        println!("> {}", phrases::welcome(lang));
                    } else {
                        println!("[already signed in]");
                    }
                }
                ("state", _) => print_state(&session),
                ("help", _) => println!("{HELP}"),
                _ => println!("unknown command :{name}"),
            }
            continue;
        }

        if transcripts.send(raw.clone()).await.is_err() {
            anyhow::bail!("transcript channel closed");
        }

        match session.activate().await {
            Ok(report) => print_report(&session, &report),
            Err(e) => println!("[{e}]"),
        }
    }

    Ok(())
}

fn build_renderer(config: &Config) -> ResponseRenderer {
    let mut renderer = ResponseRenderer::silent();

    match (
        ElevenLabsSynthesizer::new(http_client(config.provider_timeout), &config.tts),
        CommandAudioSink::new(&config.device_audio.audio_player_command),
    ) {
        (Ok(synth), Ok(sink)) => renderer = renderer.with_primary(Arc::new(synth), Arc::new(sink)),
        (Err(e), _) => tracing::info!(error = %e, "primary synthesis disabled"),
        (_, Err(e)) => tracing::warn!(error = %e, "primary synthesis disabled"),
    }

    match CommandLocalVoice::new(&config.device_audio.local_voice_command) {
        Ok(voice) => renderer = renderer.with_local_voice(Arc::new(voice)),
        Err(e) => tracing::warn!(error = %e, "local voice disabled"),
    }

    renderer
}

async fn verify(session: &mut Session) {
    if !session.verification_pending() {
        println!("[nothing to verify]");
        return;
    }
    println!("[{}]", phrases::verifying(session.context().language()));
    tokio::time::sleep(VERIFICATION_DELAY).await;

    if let Some(outcome) = session.complete_verification().await {
        println!("> {}", outcome.message);
    }
}

fn print_report(session: &Session, report: &TurnReport) {
    if report.transcript.is_none() {
        println!("[no speech]");
        return;
    }
    if let Some(message) = session.screen().message() {
        println!("> {message}");
    }
    if report.verification_armed {
        println!("[verification required: type :verify]");
    }
}

fn print_state(session: &Session) {
    let ctx = session.context();
    println!("view: {}  lang: {}  phase: {:?}", ctx.current_view(), ctx.language(), session.phase());
    for (field, value) in ctx.form_data() {
        println!("  {field} = {value}");
    }
    println!(
        "unpaid: {} SAR  renewals: {}  unread notifications: {}  pending verification: {}",
        session.portal().unpaid_total(),
        session.portal().renewals.len(),
        session.portal().unread_notifications(),
        session.verification_pending()
    );
}
