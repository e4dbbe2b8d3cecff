use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::ResolutionPrompt;
use super::provider::{check_status, CompletionProvider};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError};

/// Secondary provider: Groq's OpenAI-compatible chat completions.
#[derive(Clone)]
pub struct GroqProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ReplyMessage>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl GroqProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_key("GROQ_API_KEY")?.to_string();
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, prompt: &ResolutionPrompt) -> Result<String, ProviderError> {
        // History already lives in the system text; only the current
        // utterance is sent as the user turn.
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.instructions,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.utterance,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let reply: ChatResponse = check_status(response).await?.json().await?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::MissingText)
    }
}
