use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::enums::TriageStatus;

/// Interpretation of one engine response. Never mutated after classification;
/// the next analysis produces a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub raw_text: String,
    /// Matched emergency keywords (deduplicated).
    pub emergency_flags: BTreeSet<String>,
    pub confidence_score: Option<u8>,
    pub status: TriageStatus,
    /// Best-effort parsing gaps, for logging/diagnostics only.
    #[serde(default)]
    pub degradations: Vec<ClassificationDegradation>,
}

impl AnalysisResult {
    pub fn is_urgent(&self) -> bool {
        self.status == TriageStatus::Urgent
    }
}

/// Something the classifier could not read out of the response text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationDegradation {
    /// Response was empty or whitespace-only.
    EmptyResponse,
    /// No `CONFIDENCE SCORE: N%` line found.
    ConfidenceMissing,
    /// A confidence line was found but its value exceeds 100.
    ConfidenceOutOfRange { value: String },
}
