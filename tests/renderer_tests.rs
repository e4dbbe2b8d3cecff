mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use civic_voice::kernel::state::Language;
use civic_voice::outputs::{RenderOutcome, ResponseRenderer, Screen};
use common::{RecordingSink, RecordingSynth, RecordingVoice, ScriptedProvider};

#[tokio::test]
async fn primary_synthesis_plays_when_available() {
    let synth = Arc::new(RecordingSynth::default());
    let sink = Arc::new(RecordingSink::default());
    let voice = Arc::new(RecordingVoice::default());
    let renderer = ResponseRenderer::silent()
        .with_primary(synth.clone(), sink.clone())
        .with_local_voice(voice.clone());

    let mut screen = Screen::new();
    let outcome = renderer
        .render(&mut screen, "Opening your violations.", "Violations", Language::EnUs)
        .await;

    assert_eq!(outcome, RenderOutcome::Spoken);
    assert_eq!(screen.message(), Some("Violations"));
    assert_eq!(sink.played.load(Ordering::SeqCst), 1);
    assert!(voice.spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn primary_failure_falls_back_to_local_voice_in_locale() {
    let synth = Arc::new(RecordingSynth {
        fail: true,
        ..Default::default()
    });
    let sink = Arc::new(RecordingSink::default());
    let voice = Arc::new(RecordingVoice::default());
    let renderer = ResponseRenderer::silent()
        .with_primary(synth.clone(), sink.clone())
        .with_local_voice(voice.clone());

    let mut screen = Screen::new();
    let outcome = renderer
        .render(&mut screen, "تم الدفع بنجاح", "", Language::ArSa)
        .await;

    assert_eq!(outcome, RenderOutcome::LocalFallback);
    assert_eq!(synth.texts.lock().unwrap().len(), 1);
    assert_eq!(sink.played.load(Ordering::SeqCst), 0);
    assert_eq!(
        voice.spoken.lock().unwrap().as_slice(),
        &[("تم الدفع بنجاح".to_string(), Language::ArSa)]
    );
    // Empty ui message: the speech is what the screen shows.
    assert_eq!(screen.message(), Some("تم الدفع بنجاح"));
}

#[tokio::test]
async fn every_audio_path_failing_still_updates_the_screen() {
    let renderer = ResponseRenderer::silent()
        .with_primary(
            Arc::new(RecordingSynth {
                fail: true,
                ..Default::default()
            }),
            Arc::new(RecordingSink::default()),
        )
        .with_local_voice(Arc::new(RecordingVoice {
            fail: true,
            ..Default::default()
        }));

    let mut screen = Screen::new();
    let outcome = renderer
        .render(&mut screen, "Hello", "Welcome", Language::EnUs)
        .await;

    assert_eq!(outcome, RenderOutcome::ScreenOnly);
    assert_eq!(screen.message(), Some("Welcome"));
    assert_eq!(screen.updates(), 1);
}

#[tokio::test]
async fn empty_speech_shows_message_silently() {
    let synth = Arc::new(RecordingSynth::default());
    let renderer = ResponseRenderer::silent().with_primary(synth.clone(), Arc::new(RecordingSink::default()));

    let mut screen = Screen::new();
    let outcome = renderer.render(&mut screen, "", "Form filled", Language::EnUs).await;

    assert_eq!(outcome, RenderOutcome::Silent);
    assert_eq!(screen.message(), Some("Form filled"));
    assert!(synth.texts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn session_speaks_the_welcome_once() {
    let login = r#"{"action":"LOGIN","speechResponse":"Logging you in.","uiMessage":"Login"}"#;
    let synth = Arc::new(RecordingSynth::default());
    let renderer = ResponseRenderer::silent().with_primary(synth.clone(), Arc::new(RecordingSink::default()));
    let (mut session, tx) =
        common::session_with_renderer(&[ScriptedProvider::new("primary", vec![Some(login)])], renderer);

    tx.send("log me in".to_string()).await.unwrap();
    let report = session.activate().await.unwrap();

    assert_eq!(report.rendered, Some(RenderOutcome::Spoken));
    let spoken = synth.texts.lock().unwrap().clone();
    assert_eq!(spoken.len(), 1);
    assert_ne!(spoken[0], "Logging you in.");
}
