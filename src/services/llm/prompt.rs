use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::UserProfile;
use crate::kernel::state::{DialogueContext, HistoryEntry, Language, View};

/// Most recent turns embedded in a prompt.
pub const PROMPT_HISTORY_LIMIT: usize = 20;

pub const STRICT_JSON_INSTRUCTION: &str = "Respond with exactly one JSON object matching the \
OUTPUT FORMAT above. Do not add markdown, code fences, commentary or any text outside the object.";

/// Everything the resolver needs to know about the dialogue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionContext {
    pub view: View,
    pub language: Language,
    #[serde(default)]
    pub form_data: BTreeMap<String, String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl From<&DialogueContext> for ResolutionContext {
    fn from(ctx: &DialogueContext) -> Self {
        Self {
            view: ctx.current_view(),
            language: ctx.language(),
            form_data: ctx.form_data().clone(),
            history: ctx.history().to_vec(),
        }
    }
}

/// The text handed to a provider for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPrompt {
    /// Full instruction block, context and utterance included.
    pub instructions: String,
    /// Current utterance, for providers that take a separate user turn.
    pub utterance: String,
    pub strict: bool,
}

impl ResolutionPrompt {
    /// Same content plus an explicit demand for bare structured output.
    pub fn strict(&self) -> Self {
        Self {
            instructions: format!("{}\n\n{}", self.instructions, STRICT_JSON_INSTRUCTION),
            utterance: self.utterance.clone(),
            strict: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    user: UserProfile,
    history_limit: usize,
}

impl PromptBuilder {
    pub fn new(user: UserProfile) -> Self {
        Self {
            user,
            history_limit: PROMPT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn build(&self, utterance: &str, ctx: &ResolutionContext) -> ResolutionPrompt {
        let skip = ctx.history.len().saturating_sub(self.history_limit);
        let history: Vec<PromptTurn<'_>> = ctx.history[skip..].iter().map(PromptTurn::from).collect();

        let form_json = serde_json::to_string(&ctx.form_data).unwrap_or_else(|_| "{}".to_string());
        let history_json = serde_json::to_string(&history).unwrap_or_else(|_| "[]".to_string());
        let views = View::ALL
            .iter()
            .map(View::as_str)
            .collect::<Vec<_>>()
            .join(" | ");

        let instructions = format!(
            "{preamble}\n\n\
             --- CONTEXT ---\n\
             User: {name} (National ID: {id}).\n\
             Current View: {view}.\n\
             Language: {lang}. Reply in the same language as the user input.\n\
             Current Form Data: {form}.\n\
             History: {history}.\n\
             User Input: {utterance:?}\n\n\
             {flows}\n\n\
             --- OUTPUT FORMAT (JSON) ---\n\
             {{\n  \"action\": \"LOGIN\" | \"NAVIGATE_<VIEW>\" | \"FILL_FORM\" | \"CONFIRM_ACTION\" | \"GENERAL_QUERY\",\n  \
             \"targetView\": {views},\n  \
             \"formData\": {{ \"city\": \"Riyadh\", \"duration\": \"10\" }},\n  \
             \"speechResponse\": \"Natural spoken reply.\",\n  \
             \"uiMessage\": \"Short on-screen message\"\n}}\n\
             Only include formData fields extracted now or carried from history. Return only the JSON object.",
            preamble = PREAMBLE,
            name = self.user.display_name(ctx.language),
            id = self.user.national_id,
            view = ctx.view,
            lang = ctx.language,
            form = form_json,
            history = history_json,
            utterance = utterance,
            flows = SERVICE_FLOWS,
            views = views,
        );

        ResolutionPrompt {
            instructions,
            utterance: utterance.to_string(),
            strict: false,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptTurn<'a> {
    utterance: &'a str,
    action: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    form_data: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a HistoryEntry> for PromptTurn<'a> {
    fn from(entry: &'a HistoryEntry) -> Self {
        Self {
            utterance: &entry.utterance,
            action: entry.action.action.wire_name(),
            form_data: &entry.action.form_data,
        }
    }
}

const PREAMBLE: &str = "You are the voice assistant of a government e-services portal. \
You help the signed-in citizen finish services (passport renewal, traffic violation payment) \
in as few turns as possible. You remember every detail the user has already given: \
use Current Form Data and History before asking for anything again.";

const SERVICE_FLOWS: &str = "--- SERVICE FLOWS ---\n\
1. LOGIN\n\
- If Current View is LOGIN and the user wants to sign in: action = LOGIN.\n\
\n\
2. PASSPORT RENEWAL\n\
- Triggers: passport, renew, travel.\n\
- Required slots: city (pickup city, e.g. Riyadh, Jeddah); duration (\"5\" or \"10\" years; \
5 years costs 300 SAR, 10 years costs 600 SAR).\n\
- If the user wants to renew and is not on PASSPORT: set targetView = PASSPORT.\n\
- If exactly one slot is missing: action = FILL_FORM with the slots you have, and ask one targeted \
question for the missing slot (city: which city to pick the passport up from; duration: 5 or 10 years).\n\
- If both slots are known: action = FILL_FORM with both values, summarize them with the total \
price and ask whether to confirm.\n\
- If the user confirms on PASSPORT: action = CONFIRM_ACTION.\n\
\n\
3. VIOLATION PAYMENT\n\
- Triggers: fine, violation, ticket.\n\
- Required slot: confirmation (yes / pay).\n\
- If the user wants to pay and is not on VIOLATIONS: action = NAVIGATE_VIOLATIONS and ask for confirmation.\n\
- If Current View is VIOLATIONS and the user says pay or yes: action = CONFIRM_ACTION.\n\
\n\
--- GLOBAL RULES ---\n\
1. ONE-SHOT FILLING: when one utterance carries several slots \
(\"Renew passport for 10 years in Riyadh\"), fill all of them at once with FILL_FORM and ask for confirmation.\n\
2. AUTO-NAVIGATION: when the user wants a service, go to its view first or in the same reply \
(NAVIGATE_<VIEW>, or targetView alongside FILL_FORM).\n\
3. PROACTIVE WARNINGS: when asked for status or updates, mention unpaid violations.\n\
4. Anything else: action = GENERAL_QUERY with a helpful spoken answer.";
