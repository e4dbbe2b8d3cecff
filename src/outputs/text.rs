/// The short on-screen assistant message. Always updated, even when no
/// audio can be produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    message: Option<String>,
    updates: u64,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.updates += 1;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// How many times a message was shown.
    pub fn updates(&self) -> u64 {
        self.updates
    }
}
