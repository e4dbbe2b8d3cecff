use std::sync::Arc;

use tracing::{info, warn};

use super::gemini::GeminiProvider;
use super::groq::GroqProvider;
use super::prompt::{PromptBuilder, ResolutionContext, ResolutionPrompt};
use super::provider::{http_client, CompletionProvider};
use crate::config::Config;
use crate::error::{ConfigError, ProviderError, ResolutionError};
use crate::kernel::event::ResolvedAction;
use crate::outputs::phrases;

/// Primary plus exactly one fallback. Never a third attempt.
pub const MAX_ATTEMPTS: usize = 2;

/// Turns an utterance plus dialogue context into one `ResolvedAction`.
///
/// Providers are tried strictly in order until one returns a parseable
/// action. The first attempt gets the plain prompt; the fallback gets the
/// same content with an explicit strict-JSON instruction.
pub struct IntentResolver {
    prompts: PromptBuilder,
    providers: Vec<Arc<dyn CompletionProvider>>,
}

impl IntentResolver {
    pub fn new(prompts: PromptBuilder, mut providers: Vec<Arc<dyn CompletionProvider>>) -> Self {
        if providers.len() > MAX_ATTEMPTS {
            warn!(
                configured = providers.len(),
                "more providers than attempts allowed; extra providers dropped"
            );
            providers.truncate(MAX_ATTEMPTS);
        }
        Self { prompts, providers }
    }

    /// Gemini is required; Groq is added as the fallback when its key is set.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let client = http_client(config.provider_timeout);
        let mut providers: Vec<Arc<dyn CompletionProvider>> =
            vec![Arc::new(GeminiProvider::new(client.clone(), &config.gemini)?)];

        if config.groq.has_key() {
            providers.push(Arc::new(GroqProvider::new(client, &config.groq)?));
        } else {
            info!("GROQ_API_KEY not set; resolution runs without a fallback provider");
        }

        Ok(Self::new(PromptBuilder::new(config.user.clone()), providers))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn resolve(
        &self,
        utterance: &str,
        ctx: &ResolutionContext,
    ) -> Result<ResolvedAction, ResolutionError> {
        let base = self.prompts.build(utterance, ctx);
        let mut last_error = None;

        for (attempt, provider) in self.providers.iter().enumerate() {
            let prompt = if attempt == 0 { base.clone() } else { base.strict() };

            match attempt_once(provider.as_ref(), &prompt).await {
                Ok(resolved) => {
                    info!(
                        provider = provider.name(),
                        attempt,
                        action = %resolved.action.wire_name(),
                        "utterance resolved"
                    );
                    return Ok(resolved);
                }
                Err(e) => {
                    warn!(provider = provider.name(), attempt, error = %e, "provider attempt failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(ResolutionError::Exhausted {
                attempts: self.providers.len(),
                last,
            }),
            None => Err(ResolutionError::NoProviders),
        }
    }

}

pub fn apology_action(ctx: &ResolutionContext) -> ResolvedAction {
    ResolvedAction::error(
        phrases::apology(ctx.language),
        phrases::apology_banner(ctx.language),
    )
}

async fn attempt_once(
    provider: &dyn CompletionProvider,
    prompt: &ResolutionPrompt,
) -> Result<ResolvedAction, ProviderError> {
    let text = provider.complete(prompt).await?;
    ResolvedAction::from_provider_text(&text).map_err(ProviderError::Unparseable)
}
