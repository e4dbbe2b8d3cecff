use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::state::View;

/// Where a navigation asked to go. Unknown names are kept, not trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewTarget {
    Known(View),
    Unrecognized(String),
}

impl ViewTarget {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<View>() {
            Ok(view) => ViewTarget::Known(view),
            Err(()) => ViewTarget::Unrecognized(raw.trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login,
    Navigate(ViewTarget),
    FillForm,
    ConfirmAction,
    GeneralQuery,
    Error,
}

impl Action {
    /// Wire name as the providers emit it.
    pub fn wire_name(&self) -> String {
        match self {
            Action::Login => "LOGIN".to_string(),
            Action::Navigate(ViewTarget::Known(view)) => format!("NAVIGATE_{}", view.as_str()),
            Action::Navigate(ViewTarget::Unrecognized(raw)) => {
                format!("NAVIGATE_{}", raw.to_ascii_uppercase())
            }
            Action::FillForm => "FILL_FORM".to_string(),
            Action::ConfirmAction => "CONFIRM_ACTION".to_string(),
            Action::GeneralQuery => "GENERAL_QUERY".to_string(),
            Action::Error => "ERROR".to_string(),
        }
    }

    /// Maps a wire action name. Unknown names degrade to `GeneralQuery`
    /// (render only), never to a state-changing variant.
    pub fn from_wire(name: &str, target_view: Option<&str>) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "LOGIN" => Action::Login,
            "FILL_FORM" => Action::FillForm,
            "CONFIRM_ACTION" => Action::ConfirmAction,
            "GENERAL_QUERY" => Action::GeneralQuery,
            "ERROR" => Action::Error,
            "NAVIGATE" => match target_view {
                Some(raw) => Action::Navigate(ViewTarget::parse(raw)),
                None => Action::Navigate(ViewTarget::Unrecognized(String::new())),
            },
            other => match other.strip_prefix("NAVIGATE_") {
                Some(raw) => Action::Navigate(ViewTarget::parse(raw)),
                None => Action::GeneralQuery,
            },
        }
    }
}

/// The single structured outcome of one resolution turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAction {
    pub action: Action,
    pub target_view: Option<View>,
    /// Merge patch against the dialogue form data.
    pub form_data: BTreeMap<String, String>,
    pub speech_response: String,
    pub ui_message: String,
}

impl ResolvedAction {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            target_view: None,
            form_data: BTreeMap::new(),
            speech_response: String::new(),
            ui_message: String::new(),
        }
    }

    pub fn with_target(mut self, view: View) -> Self {
        self.target_view = Some(view);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.form_data.insert(field.into(), value.into());
        self
    }

    pub fn with_speech(mut self, speech: impl Into<String>) -> Self {
        self.speech_response = speech.into();
        self
    }

    pub fn with_ui_message(mut self, message: impl Into<String>) -> Self {
        self.ui_message = message.into();
        self
    }

    /// ERROR marker carrying a fixed apology.
    pub fn error(speech: impl Into<String>, ui_message: impl Into<String>) -> Self {
        Self::new(Action::Error)
            .with_speech(speech)
            .with_ui_message(ui_message)
    }

    pub fn is_error(&self) -> bool {
        self.action == Action::Error
    }

    /// Parses one provider payload. Anything that is not a JSON object with
    /// an `action` string is rejected outright.
    pub fn from_provider_text(text: &str) -> Result<Self, serde_json::Error> {
        let body = strip_code_fence(text);
        let wire: WireAction = serde_json::from_str(body)?;
        Ok(wire.into())
    }
}

/// Providers sometimes wrap JSON in a markdown fence despite instructions.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAction {
    action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    form_data: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    speech_response: Option<String>,
    #[serde(default)]
    ui_message: Option<String>,
}

impl From<WireAction> for ResolvedAction {
    fn from(wire: WireAction) -> Self {
        let action = Action::from_wire(&wire.action, wire.target_view.as_deref());
        let target_view = wire
            .target_view
            .as_deref()
            .and_then(|raw| raw.parse::<View>().ok());

        let form_data = stringify_form(wire.form_data.unwrap_or_default());

        Self {
            action,
            target_view,
            form_data,
            speech_response: wire.speech_response.unwrap_or_default(),
            ui_message: wire.ui_message.unwrap_or_default(),
        }
    }
}

/// Form values arrive as arbitrary JSON: strings pass through, nulls are
/// dropped, anything else keeps its JSON text (`10` becomes `"10"`).
pub(crate) fn stringify_form(form: BTreeMap<String, serde_json::Value>) -> BTreeMap<String, String> {
    form.into_iter()
        .filter_map(|(field, value)| {
            let value = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some((field, value))
        })
        .collect()
}

impl From<&ResolvedAction> for WireAction {
    fn from(resolved: &ResolvedAction) -> Self {
        Self {
            action: resolved.action.wire_name(),
            target_view: resolved.target_view.map(|v| v.as_str().to_string()),
            form_data: if resolved.form_data.is_empty() {
                None
            } else {
                Some(
                    resolved
                        .form_data
                        .iter()
                        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                        .collect(),
                )
            },
            speech_response: Some(resolved.speech_response.clone()),
            ui_message: Some(resolved.ui_message.clone()),
        }
    }
}

impl Serialize for ResolvedAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireAction::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResolvedAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WireAction::deserialize(deserializer).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fill_form_with_numeric_duration() {
        let text = r#"{"action":"FILL_FORM","targetView":"PASSPORT",
            "formData":{"city":"Riyadh","duration":10,"note":null},
            "speechResponse":"Shall I confirm?","uiMessage":"Form filled"}"#;
        let parsed = ResolvedAction::from_provider_text(text).unwrap();

        assert_eq!(parsed.action, Action::FillForm);
        assert_eq!(parsed.target_view, Some(View::Passport));
        assert_eq!(parsed.form_data.get("city").map(String::as_str), Some("Riyadh"));
        assert_eq!(parsed.form_data.get("duration").map(String::as_str), Some("10"));
        assert!(!parsed.form_data.contains_key("note"));
    }

    #[test]
    fn navigate_suffix_maps_to_view() {
        let parsed =
            ResolvedAction::from_provider_text(r#"{"action":"NAVIGATE_VIOLATIONS"}"#).unwrap();
        assert_eq!(parsed.action, Action::Navigate(ViewTarget::Known(View::Violations)));
        assert_eq!(parsed.speech_response, "");
    }

    #[test]
    fn bare_navigate_uses_target_view() {
        let parsed = ResolvedAction::from_provider_text(
            r#"{"action":"NAVIGATE","targetView":"settings"}"#,
        )
        .unwrap();
        assert_eq!(parsed.action, Action::Navigate(ViewTarget::Known(View::Settings)));
    }

    #[test]
    fn unknown_navigation_target_is_kept_unrecognized() {
        let parsed =
            ResolvedAction::from_provider_text(r#"{"action":"NAVIGATE_GARAGE"}"#).unwrap();
        assert_eq!(
            parsed.action,
            Action::Navigate(ViewTarget::Unrecognized("GARAGE".to_string()))
        );
    }

    #[test]
    fn unknown_action_degrades_to_general_query() {
        let parsed = ResolvedAction::from_provider_text(r#"{"action":"DANCE"}"#).unwrap();
        assert_eq!(parsed.action, Action::GeneralQuery);
    }

    #[test]
    fn fenced_payload_is_accepted() {
        let text = "```json\n{\"action\":\"LOGIN\",\"speechResponse\":\"hi\"}\n```";
        let parsed = ResolvedAction::from_provider_text(text).unwrap();
        assert_eq!(parsed.action, Action::Login);
    }

    #[test]
    fn prose_and_actionless_objects_are_rejected() {
        assert!(ResolvedAction::from_provider_text("Sure! I will renew it.").is_err());
        assert!(ResolvedAction::from_provider_text(r#"{"speechResponse":"hi"}"#).is_err());
        assert!(ResolvedAction::from_provider_text("[1,2,3]").is_err());
    }

    #[test]
    fn serializes_in_wire_shape() {
        let action = ResolvedAction::new(Action::Navigate(ViewTarget::Known(View::Passport)))
            .with_speech("Opening passports");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "NAVIGATE_PASSPORT");
        assert_eq!(json["speechResponse"], "Opening passports");
        assert!(json.get("formData").is_none());
    }
}
