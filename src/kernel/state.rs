use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::event::ResolvedAction;

/// Screens of the portal. The dialogue can only ever point at one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    Login,
    Dashboard,
    Violations,
    Passport,
    Appointments,
    Settings,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Login,
        View::Dashboard,
        View::Violations,
        View::Passport,
        View::Appointments,
        View::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Login => "LOGIN",
            View::Dashboard => "DASHBOARD",
            View::Violations => "VIOLATIONS",
            View::Passport => "PASSPORT",
            View::Appointments => "APPOINTMENTS",
            View::Settings => "SETTINGS",
        }
    }
}

impl Default for View {
    fn default() -> Self {
        Self::Login
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = ();

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        View::ALL
            .iter()
            .copied()
            .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
            .ok_or(())
    }
}

/// Supported locales. Drives recognition, provider prompts and voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "ar-SA")]
    ArSa,
}

impl Language {
    pub fn tag(&self) -> &'static str {
        match self {
            Language::EnUs => "en-US",
            Language::ArSa => "ar-SA",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::EnUs
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = ();

    /// Accepts full tags and bare language codes ("ar", "en").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "en-us" | "en" => Ok(Language::EnUs),
            "ar-sa" | "ar" => Ok(Language::ArSa),
            _ => Err(()),
        }
    }
}

/// One completed full-NLU turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub utterance: String,
    pub action: ResolvedAction,
}

/// Strict context delta. This is the ONLY way the dialogue context mutates.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextDelta {
    ViewChanged(View),
    FormPatched(BTreeMap<String, String>),
    FieldCaptured { field: String, value: String },
    TurnRecorded(HistoryEntry),
    LanguageChanged(Language),
}

/// Authoritative conversation state for a single session.
#[derive(Debug, Clone, Default)]
pub struct DialogueContext {
    current_view: View,
    form_data: BTreeMap<String, String>,
    history: Vec<HistoryEntry>,
    language: Language,
    // Monotonic, bumped on every reduction
    pub version: u64,
}

impl DialogueContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    pub fn form_data(&self) -> &BTreeMap<String, String> {
        &self.form_data
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.form_data.get(name).map(String::as_str)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Authentication is leaving the login screen; only LOGIN does that.
    pub fn is_authenticated(&self) -> bool {
        self.current_view != View::Login
    }

    /// Pure reduction: State + Delta -> Mutated State
    pub fn reduce(&mut self, delta: ContextDelta) {
        self.version += 1;

        match delta {
            ContextDelta::ViewChanged(view) => {
                self.current_view = view;
            }
            ContextDelta::FormPatched(patch) => {
                // Field-wise merge, last write wins, untouched keys survive.
                for (field, value) in patch {
                    self.form_data.insert(field, value);
                }
            }
            ContextDelta::FieldCaptured { field, value } => {
                self.form_data.insert(field, value);
            }
            ContextDelta::TurnRecorded(entry) => {
                self.history.push(entry);
            }
            ContextDelta::LanguageChanged(language) => {
                self.language = language;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fresh_context_starts_on_login() {
        let ctx = DialogueContext::new();
        assert_eq!(ctx.current_view(), View::Login);
        assert!(ctx.form_data().is_empty());
        assert!(ctx.history().is_empty());
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn form_patches_merge_last_write_wins() {
        let mut ctx = DialogueContext::new();
        ctx.reduce(ContextDelta::FormPatched(patch(&[("city", "Jeddah"), ("duration", "5")])));
        ctx.reduce(ContextDelta::FormPatched(patch(&[("city", "Riyadh")])));
        ctx.reduce(ContextDelta::FormPatched(BTreeMap::new()));

        assert_eq!(ctx.field("city"), Some("Riyadh"));
        assert_eq!(ctx.field("duration"), Some("5"));
        assert_eq!(ctx.version, 3);
    }

    #[test]
    fn view_parses_case_insensitively() {
        assert_eq!("passport".parse::<View>(), Ok(View::Passport));
        assert_eq!(" VIOLATIONS ".parse::<View>(), Ok(View::Violations));
        assert!("GARAGE".parse::<View>().is_err());
    }

    #[test]
    fn language_accepts_short_codes() {
        assert_eq!("ar".parse::<Language>(), Ok(Language::ArSa));
        assert_eq!("en-US".parse::<Language>(), Ok(Language::EnUs));
        assert!("fr-FR".parse::<Language>().is_err());
    }
}
