use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use super::prompt::ResolutionPrompt;
use crate::error::ProviderError;

/// One language-understanding backend. Returns the raw text payload; the
/// resolver owns parsing.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &ResolutionPrompt) -> Result<String, ProviderError>;
}

/// HTTP client shared by provider adapters. The timeout is the only deadline
/// a resolution call gets.
pub fn http_client(timeout: Duration) -> Client {
    match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, timeout_secs = timeout.as_secs_f64(), "HTTP client setup failed; requests have no timeout");
            Client::new()
        }
    }
}

/// Turns a non-2xx reply into `ProviderError::Status`, keeping the body for logs.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}
