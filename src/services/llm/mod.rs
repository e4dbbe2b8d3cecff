pub mod gemini;
pub mod groq;
pub mod prompt;
pub mod provider;
pub mod resolver;

pub use prompt::{PromptBuilder, ResolutionContext, ResolutionPrompt};
pub use provider::CompletionProvider;
pub use resolver::IntentResolver;
