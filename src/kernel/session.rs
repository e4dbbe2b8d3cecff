use tracing::{info, warn};
use uuid::Uuid;

use super::dispatcher::{Dispatcher, PendingEffect, TurnEffect};
use super::event::ResolvedAction;
use super::gate::{VerificationCallback, VerificationGate, VerificationOutcome};
use super::state::{ContextDelta, DialogueContext, HistoryEntry, Language, View};
use super::turn::{CaptureMode, TurnMachine, TurnPhase, TurnSignal};
use crate::capture::{CaptureOutcome, UtteranceCapture};
use crate::error::SessionError;
use crate::outputs::{phrases, RenderOutcome, ResponseRenderer, Screen};
use crate::portal::PortalRecord;
use crate::services::llm::resolver::apology_action;
use crate::services::llm::{IntentResolver, ResolutionContext};

/// What one activation produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReport {
    pub transcript: Option<String>,
    /// Present for full-NLU turns; ERROR when resolution failed.
    pub action: Option<ResolvedAction>,
    pub rendered: Option<RenderOutcome>,
    pub verification_armed: bool,
}

/// One user's conversation. Owns every piece of mutable state; each turn
/// runs to completion before the next can start.
pub struct Session {
    pub id: Uuid,
    context: DialogueContext,
    machine: TurnMachine,
    portal: PortalRecord,
    gate: VerificationGate,
    active_field: Option<String>,
    screen: Screen,
    capture: UtteranceCapture,
    resolver: IntentResolver,
    renderer: ResponseRenderer,
    dispatcher: Dispatcher,
}

impl Session {
    pub fn new(capture: UtteranceCapture, resolver: IntentResolver, renderer: ResponseRenderer) -> Self {
        Self {
            id: Uuid::new_v4(),
            context: DialogueContext::new(),
            machine: TurnMachine::new(),
            portal: PortalRecord::demo(),
            gate: VerificationGate::new(),
            active_field: None,
            screen: Screen::new(),
            capture,
            resolver,
            renderer,
            dispatcher: Dispatcher,
        }
    }

    pub fn with_portal(mut self, portal: PortalRecord) -> Self {
        self.portal = portal;
        self
    }

    pub fn context(&self) -> &DialogueContext {
        &self.context
    }

    pub fn phase(&self) -> &TurnPhase {
        self.machine.phase()
    }

    pub fn portal(&self) -> &PortalRecord {
        &self.portal
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn active_field(&self) -> Option<&str> {
        self.active_field.as_deref()
    }

    pub fn verification_pending(&self) -> bool {
        self.gate.is_pending()
    }

    /// Takes effect from the next activation.
    pub fn set_language(&mut self, lang: Language) {
        if lang != self.context.language() {
            info!(session = %self.id, lang = %lang, "language switched");
            self.context.reduce(ContextDelta::LanguageChanged(lang));
        }
    }

    /// Button login. Same rule as the LOGIN action: only from the login view.
    pub fn login_manually(&mut self) -> bool {
        if self.context.current_view() != View::Login {
            return false;
        }
        self.context.reduce(ContextDelta::ViewChanged(View::Dashboard));
        true
    }

    /// Runs one turn. With a field armed the transcript goes straight into
    /// that field; otherwise it is resolved, dispatched and rendered.
    pub async fn activate(&mut self) -> Result<TurnReport, SessionError> {
        let mode = match &self.active_field {
            Some(field) => CaptureMode::Field(field.clone()),
            None => CaptureMode::FullNlu,
        };
        self.run_turn(mode).await
    }

    /// Targets the next activation at one form field.
    pub fn arm_field(&mut self, field: &str) -> Result<(), SessionError> {
        let field = field.trim();
        if field.is_empty() {
            return Err(SessionError::EmptyField);
        }
        if !self.machine.is_idle() {
            return Err(SessionError::Busy);
        }
        self.active_field = Some(field.to_string());
        Ok(())
    }

    /// Dictation straight into one field; never calls the resolver.
    pub async fn activate_field(&mut self, field: &str) -> Result<TurnReport, SessionError> {
        self.arm_field(field)?;
        self.activate().await
    }

    /// Drops an armed field before it is used.
    pub fn cancel_field_capture(&mut self) -> Option<String> {
        self.active_field.take()
    }

    /// Verification finished: run the pending effect exactly once.
    pub async fn complete_verification(&mut self) -> Option<VerificationOutcome> {
        let outcome = self.gate.complete(&mut self.portal)?;
        info!(session = %self.id, "verification completed");
        let lang = self.context.language();
        self.renderer
            .render(&mut self.screen, &outcome.message, &outcome.message, lang)
            .await;
        Some(outcome)
    }

    pub fn cancel_verification(&mut self) -> bool {
        self.gate.cancel()
    }

    async fn run_turn(&mut self, mode: CaptureMode) -> Result<TurnReport, SessionError> {
        self.machine
            .apply(TurnSignal::Activate(mode.clone()))
            .map_err(|_| SessionError::Busy)?;

        let lang = self.context.language();
        let outcome = match self.capture.activate(lang).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.machine.reset();
                return Err(e.into());
            }
        };

        // Dictation is written verbatim; only resolution trims.
        let text = match (outcome, &mode) {
            (CaptureOutcome::Transcript(text), CaptureMode::Field(_)) => Some(text),
            (CaptureOutcome::Transcript(text), CaptureMode::FullNlu) => {
                Some(text.trim().to_string()).filter(|t| !t.is_empty())
            }
            (CaptureOutcome::NoSpeech | CaptureOutcome::RecognitionError(_), _) => None,
        };
        let Some(text) = text else {
            self.active_field = None;
            self.advance(TurnSignal::CaptureEnded);
            return Ok(TurnReport::default());
        };

        self.advance(TurnSignal::TranscriptReady);
        let report = match mode {
            CaptureMode::Field(field) => self.apply_field(field, text).await,
            CaptureMode::FullNlu => self.resolve_and_apply(text).await,
        };
        Ok(report)
    }

    async fn apply_field(&mut self, field: String, text: String) -> TurnReport {
        self.context.reduce(ContextDelta::FieldCaptured {
            field: field.clone(),
            value: text.clone(),
        });
        self.active_field = None;
        info!(session = %self.id, field = %field, "field captured");

        let lang = self.context.language();
        let rendered = self
            .renderer
            .render(
                &mut self.screen,
                &phrases::field_entered(lang, &text),
                &phrases::field_filled(lang, &text),
                lang,
            )
            .await;
        self.advance(TurnSignal::Applied);

        TurnReport {
            transcript: Some(text),
            action: None,
            rendered: Some(rendered),
            verification_armed: false,
        }
    }

    async fn resolve_and_apply(&mut self, text: String) -> TurnReport {
        let request = ResolutionContext::from(&self.context);

        let (resolved, failed) = match self.resolver.resolve(&text, &request).await {
            Ok(resolved) => {
                self.advance(TurnSignal::Resolved);
                (resolved, false)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "resolution failed; apologizing");
                self.advance(TurnSignal::ResolutionFailed);
                (apology_action(&request), true)
            }
        };

        let mut report = self.apply_resolved(&text, resolved).await;
        report.transcript = Some(text);
        self.advance(if failed {
            TurnSignal::ApologyRendered
        } else {
            TurnSignal::Applied
        });
        report
    }

    async fn apply_resolved(&mut self, utterance: &str, resolved: ResolvedAction) -> TurnReport {
        let dispatch = self.dispatcher.dispatch(&self.context, &resolved);
        for delta in dispatch.deltas {
            self.context.reduce(delta);
        }
        self.context.reduce(ContextDelta::TurnRecorded(HistoryEntry {
            utterance: utterance.to_string(),
            action: resolved.clone(),
        }));

        let lang = self.context.language();
        let mut report = TurnReport::default();
        for effect in dispatch.effects {
            match effect {
                TurnEffect::Render { speech, ui_message } => {
                    let outcome = self
                        .renderer
                        .render(&mut self.screen, &speech, &ui_message, lang)
                        .await;
                    report.rendered = Some(outcome);
                }
                TurnEffect::RequestVerification(pending) => {
                    info!(session = %self.id, effect = ?pending, "verification requested");
                    self.gate.arm(verification_callback(pending, lang));
                    report.verification_armed = true;
                }
                TurnEffect::Log(msg) => info!(session = %self.id, "{msg}"),
            }
        }

        report.action = Some(resolved);
        report
    }

    /// Moves the FSM; an impossible edge means a bug, so recover to idle.
    fn advance(&mut self, signal: TurnSignal) {
        if let Err(e) = self.machine.apply(signal) {
            warn!(session = %self.id, error = %e, "turn machine out of step; resetting");
            self.machine.reset();
        }
    }
}

fn verification_callback(pending: PendingEffect, lang: Language) -> VerificationCallback {
    match pending {
        PendingEffect::PayViolations => Box::new(move |record: &mut PortalRecord| {
            let settled = record.pay_all_violations();
            let message = if settled == 0 {
                phrases::nothing_to_pay(lang)
            } else {
                phrases::payment_success(lang)
            };
            VerificationOutcome {
                message: message.to_string(),
            }
        }),
        PendingEffect::RenewPassport(request) => Box::new(move |record: &mut PortalRecord| {
            record.submit_renewal(request);
            VerificationOutcome {
                message: phrases::renewal_initiated(lang).to_string(),
            }
        }),
    }
}
