use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::prompt::ResolutionPrompt;
use super::provider::{check_status, CompletionProvider};
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError};

/// Primary provider: Gemini `generateContent` with JSON response mode.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_key("GEMINI_API_KEY")?.to_string();
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &ResolutionPrompt) -> Result<String, ProviderError> {
        // The whole prompt travels as one user content block.
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt.instructions }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        });

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let reply: GenerateResponse = check_status(response).await?.json().await?;

        reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::MissingText)
    }
}
