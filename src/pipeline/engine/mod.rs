pub mod demo;
pub mod gemini;
pub mod gemini_types;

pub use demo::*;
pub use gemini::*;

use serde::Serialize;
use thiserror::Error;

use super::prompt::PromptText;
use crate::config::TriageConfig;
use crate::models::ImageBlob;

/// Hosted model abstraction (allows mocking).
///
/// One blocking call per analysis, no retries: the caller turns any
/// `EngineError` into a banner and the user decides whether to try again.
pub trait AiEngine {
    fn send(&self, prompt: &PromptText, image: Option<&ImageBlob>) -> Result<String, EngineError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Credential rejected or missing: {0}")]
    Auth(String),

    #[error("Quota exhausted: {0}")]
    RateLimit(String),

    #[error("Network failure: {0}")]
    Transport(String),

    #[error("Unexpected engine failure: {0}")]
    Unknown(String),
}

/// Coarse failure class, for banners and logs (no message payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineErrorKind {
    Auth,
    RateLimit,
    Transport,
    Unknown,
}

impl EngineError {
    pub fn kind(&self) -> EngineErrorKind {
        match self {
            Self::Auth(_) => EngineErrorKind::Auth,
            Self::RateLimit(_) => EngineErrorKind::RateLimit,
            Self::Transport(_) => EngineErrorKind::Transport,
            Self::Unknown(_) => EngineErrorKind::Unknown,
        }
    }

    /// Banner text for the Presentation Layer.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            EngineErrorKind::Auth => {
                "The AI service rejected the request. Check the API credentials in settings."
            }
            EngineErrorKind::RateLimit => {
                "The AI service quota is exhausted. Please retry later."
            }
            EngineErrorKind::Transport => {
                "The AI service could not be reached. This is usually temporary, please retry."
            }
            EngineErrorKind::Unknown => {
                "The AI service returned an unexpected error. Please retry."
            }
        }
    }
}

/// Pick the engine the configuration asks for: canned demo or live model.
pub fn engine_from_config(config: &TriageConfig) -> Result<Box<dyn AiEngine>, EngineError> {
    if config.demo_mode {
        tracing::info!("Demo mode active, AI engine calls are simulated");
        return Ok(Box::new(DemoEngine::new()));
    }
    let api_key = config.engine.api_key_from_env();
    if api_key.is_none() {
        tracing::warn!(
            env_var = %config.engine.api_key_env,
            "No API key in environment, analyses will fail with an auth error"
        );
    }
    Ok(Box::new(GeminiClient::new(&config.engine, api_key)?))
}
