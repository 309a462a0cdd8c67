use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::ValidatedProfile;
use crate::models::{AnalysisResult, Gender, PatientContext, ResponseLanguage};

/// Patient line of the report, taken from the validated profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub age: u8,
    pub gender: Gender,
    pub context: PatientContext,
    pub allergies: Option<String>,
}

impl From<&ValidatedProfile> for PatientSummary {
    fn from(profile: &ValidatedProfile) -> Self {
        Self {
            age: profile.age(),
            gender: profile.gender(),
            context: profile.context(),
            allergies: profile.allergies().map(str::to_string),
        }
    }
}

/// One completed analysis, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageReport {
    pub id: Uuid,
    pub generated_at: NaiveDateTime,
    pub language: ResponseLanguage,
    pub had_image: bool,
    pub patient: PatientSummary,
    pub result: AnalysisResult,
}

impl TriageReport {
    pub fn new(
        patient: PatientSummary,
        language: ResponseLanguage,
        had_image: bool,
        result: AnalysisResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: chrono::Local::now().naive_local(),
            language,
            had_image,
            patient,
            result,
        }
    }

    /// Markdown block for the report panel.
    pub fn render_markdown(&self) -> String {
        let patient = &self.patient;
        let mut out = String::new();

        out.push_str("### 📋 Clinical Triage Report\n");
        out.push_str(&format!(
            "**Patient:** {}y/o {}",
            patient.age, patient.gender
        ));
        if patient.context != PatientContext::None {
            out.push_str(&format!(" ({})", patient.context));
        }
        out.push_str(&format!(
            " | **Allergies:** {}\n\n",
            patient.allergies.as_deref().unwrap_or("None")
        ));

        out.push_str(&format!("**Status:** {}\n", self.result.status.banner()));

        if !self.result.emergency_flags.is_empty() {
            let flags: Vec<&str> = self.result.emergency_flags.iter().map(String::as_str).collect();
            out.push_str(&format!("**Risk signals:** {}\n", flags.join(", ")));
        }

        if let Some(score) = self.result.confidence_score {
            out.push_str(&format!("**Confidence:** {score}%\n"));
        }

        out.push_str("\n---\n\n");
        out.push_str(self.result.raw_text.trim());
        out.push('\n');
        out
    }
}
