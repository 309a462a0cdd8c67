//! Per-user triage session.
//!
//! Holds the sidebar profile and the last rendered report for the duration
//! of one user's session. Nothing is persisted; dropping the session drops
//! every piece of patient data it held.

use crate::models::{
    AnalysisRequest, Gender, ImageBlob, PatientProfile, ResponseLanguage,
};
use crate::pipeline::engine::AiEngine;
use crate::pipeline::validation::validate_profile;
use crate::pipeline::{TriageError, TriagePipeline, TriageReport, ValidationError};

// ═══════════════════════════════════════════════════════════
// TriageSession
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct TriageSession {
    profile: PatientProfile,
    last_report: Option<TriageReport>,
}

impl TriageSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn profile(&self) -> &PatientProfile {
        &self.profile
    }

    // ── Profile editing ──────────────────────────────────

    /// Replace the whole profile. An invalid profile is rejected and the
    /// current one stays in place.
    pub fn update_profile(&mut self, profile: PatientProfile) -> Result<(), ValidationError> {
        validate_profile(&profile)?;
        self.profile = profile;
        Ok(())
    }

    /// Change gender, dropping a context the new gender does not permit.
    /// Returns true when the context was reset.
    pub fn set_gender(&mut self, gender: Gender) -> bool {
        self.profile.set_gender(gender)
    }

    // ── Analysis ─────────────────────────────────────────

    /// Run one analysis against the current profile. Without an explicit
    /// language the pipeline's configured one is used.
    ///
    /// The previous report survives a failed run, so the report panel never
    /// goes blank because of a rejected request or an engine outage.
    pub fn analyze<E: AiEngine + ?Sized>(
        &mut self,
        pipeline: &TriagePipeline<'_, E>,
        query: &str,
        image: Option<ImageBlob>,
        language: Option<ResponseLanguage>,
    ) -> Result<&TriageReport, TriageError> {
        let language = language.unwrap_or_else(|| pipeline.language());
        let mut request =
            AnalysisRequest::new(self.profile.clone(), query).with_language(language);
        if let Some(image) = image {
            request = request.with_image(image);
        }

        let report = pipeline.analyze(&request)?;
        Ok(&*self.last_report.insert(report))
    }

    pub fn last_report(&self) -> Option<&TriageReport> {
        self.last_report.as_ref()
    }

    /// Forget the last report. The profile is kept.
    pub fn clear(&mut self) {
        self.last_report = None;
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
