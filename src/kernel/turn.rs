use serde::{Deserialize, Serialize};

/// What the microphone is listening for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Transcript goes through intent resolution.
    FullNlu,
    /// Transcript is written verbatim into the named field.
    Field(String),
}

/// The explicit lifecycle of one interaction turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// Nothing in flight. The only state that accepts an activation.
    Idle,
    /// Capture outstanding.
    Listening(CaptureMode),
    /// Waiting on intent resolution.
    Processing,
    /// Folding effects into the context and rendering the reply.
    Applying,
    /// Resolution failed; apology pending.
    Error,
}

impl Default for TurnPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Signals that request a phase transition.
/// These are REQUESTS, not forces. The graph validates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnSignal {
    Activate(CaptureMode),
    TranscriptReady,
    CaptureEnded,
    Resolved,
    ResolutionFailed,
    Applied,
    ApologyRendered,
}

pub struct TurnGraph;

impl TurnGraph {
    /// Pure function: (Current Phase, Signal) -> New Phase
    /// Returns None if the transition is invalid.
    pub fn transition(current: &TurnPhase, signal: &TurnSignal) -> Option<TurnPhase> {
        use TurnPhase::*;
        use TurnSignal::*;

        match (current, signal) {
            (Idle, Activate(mode)) => Some(Listening(mode.clone())),

            // Field dictation never reaches the resolver.
            (Listening(CaptureMode::Field(_)), TranscriptReady) => Some(Applying),
            (Listening(CaptureMode::FullNlu), TranscriptReady) => Some(Processing),
            // No speech or recognition error
            (Listening(_), CaptureEnded) => Some(Idle),

            (Processing, Resolved) => Some(Applying),
            (Processing, ResolutionFailed) => Some(Error),

            (Applying, Applied) => Some(Idle),
            (Error, ApologyRendered) => Some(Idle),

            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("turn transition {signal:?} rejected in phase {phase:?}")]
pub struct TransitionRejected {
    pub phase: TurnPhase,
    pub signal: TurnSignal,
}

/// Holds the current phase and only moves along `TurnGraph` edges.
#[derive(Debug, Default)]
pub struct TurnMachine {
    phase: TurnPhase,
}

impl TurnMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TurnPhase::Idle
    }

    pub fn is_listening(&self) -> bool {
        matches!(self.phase, TurnPhase::Listening(_))
    }

    pub fn apply(&mut self, signal: TurnSignal) -> Result<&TurnPhase, TransitionRejected> {
        match TurnGraph::transition(&self.phase, &signal) {
            Some(next) => {
                tracing::debug!(from = ?self.phase, to = ?next, "turn transition");
                self.phase = next;
                Ok(&self.phase)
            }
            None => Err(TransitionRejected {
                phase: self.phase.clone(),
                signal,
            }),
        }
    }

    /// Forces the machine back to idle. Used when a turn is abandoned
    /// half-way so the session is never left stuck.
    pub fn reset(&mut self) {
        self.phase = TurnPhase::Idle;
    }
}
