pub mod validation;
pub mod sanitize;
pub mod prompt;
pub mod engine;
pub mod classify;
pub mod report;
pub mod orchestrator;

pub use validation::*;
pub use prompt::*;
pub use engine::*;
pub use classify::*;
pub use report::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::models::{Gender, PatientContext};

/// Profile or request rejected at the boundary. Recoverable: the
/// Presentation Layer shows it inline next to the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Context '{context}' is not available for gender '{gender}'")]
    InvalidContext {
        gender: Gender,
        context: PatientContext,
    },

    #[error("Enter a symptom or medicine, or upload an image")]
    EmptyRequest,

    #[error("Unknown {field} value: '{value}'")]
    UnknownValue { field: String, value: String },
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &str {
        match self {
            Self::OutOfRange { field, .. } => field,
            Self::InvalidContext { .. } => "context",
            Self::EmptyRequest => "query",
            Self::UnknownValue { field, .. } => field,
        }
    }
}

/// Any failure of one Analyze run.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("AI engine failed: {0}")]
    Engine(#[from] EngineError),
}

impl TriageError {
    /// Text for the inline error or failure banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Engine(e) => e.user_message().to_string(),
        }
    }
}
