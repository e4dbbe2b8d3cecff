use crate::portal::PortalRecord;

/// What a completed verification wants rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub message: String,
}

pub type VerificationCallback =
    Box<dyn FnOnce(&mut PortalRecord) -> VerificationOutcome + Send + 'static>;

/// Single-slot holder for the effect waiting on identity verification.
///
/// Arming replaces any pending callback (never queues). Completion takes the
/// callback out before running it, so it fires at most once.
#[derive(Default)]
pub struct VerificationGate {
    pending: Option<VerificationCallback>,
}

impl VerificationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, callback: VerificationCallback) {
        if self.pending.replace(callback).is_some() {
            tracing::info!("verification re-armed; previous pending effect dropped");
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Runs the pending callback (if any) and releases the gate.
    pub fn complete(&mut self, record: &mut PortalRecord) -> Option<VerificationOutcome> {
        let callback = self.pending.take()?;
        Some(callback(record))
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

impl std::fmt::Debug for VerificationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationGate")
            .field("pending", &self.pending.is_some())
            .finish()
    }
}
