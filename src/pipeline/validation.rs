// Boundary validation for the patient profile and the analysis request.
// Nothing downstream of this module reads an unvalidated PatientProfile.

use serde::Serialize;

use super::ValidationError;
use crate::models::{
    AnalysisRequest, Gender, ImageBlob, PatientContext, PatientProfile, ResponseLanguage,
};

pub const MIN_AGE: i32 = 0;
pub const MAX_AGE: i32 = 120;

/// A profile that passed `validate_profile`, with free text normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedProfile {
    age: u8,
    gender: Gender,
    context: PatientContext,
    allergies: Option<String>,
    chronic_conditions: Option<String>,
}

impl ValidatedProfile {
    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn context(&self) -> PatientContext {
        self.context
    }

    /// `None` means no known allergies.
    pub fn allergies(&self) -> Option<&str> {
        self.allergies.as_deref()
    }

    pub fn chronic_conditions(&self) -> Option<&str> {
        self.chronic_conditions.as_deref()
    }
}

/// Validate a profile: age range, then gender/context compatibility.
pub fn validate_profile(profile: &PatientProfile) -> Result<ValidatedProfile, ValidationError> {
    let age = u8::try_from(profile.age)
        .ok()
        .filter(|a| i32::from(*a) <= MAX_AGE)
        .ok_or(ValidationError::OutOfRange {
            field: "age",
            value: i64::from(profile.age),
            min: i64::from(MIN_AGE),
            max: i64::from(MAX_AGE),
        })?;

    if !profile.gender.permits(profile.context) {
        return Err(ValidationError::InvalidContext {
            gender: profile.gender,
            context: profile.context,
        });
    }

    Ok(ValidatedProfile {
        age,
        gender: profile.gender,
        context: profile.context,
        allergies: normalize_free_text(&profile.allergies),
        chronic_conditions: profile
            .chronic_conditions
            .as_deref()
            .and_then(normalize_free_text),
    })
}

/// A request whose profile validated and which carries text or an image.
#[derive(Debug, Clone)]
pub struct ValidatedRequest<'a> {
    pub request: &'a AnalysisRequest,
    pub profile: ValidatedProfile,
}

impl ValidatedRequest<'_> {
    pub fn query(&self) -> Option<&str> {
        self.request.has_query().then(|| self.request.query.trim())
    }

    pub fn image(&self) -> Option<&ImageBlob> {
        self.request.attached_image()
    }

    pub fn language(&self) -> ResponseLanguage {
        self.request.response_language
    }
}

/// Validate the whole request. The engine must never see a request that
/// carries neither text nor an image.
pub fn validate_request(request: &AnalysisRequest) -> Result<ValidatedRequest<'_>, ValidationError> {
    let profile = validate_profile(&request.profile)?;
    if !request.has_query() && request.attached_image().is_none() {
        return Err(ValidationError::EmptyRequest);
    }
    Ok(ValidatedRequest { request, profile })
}

/// Empty text and the literal "None" both mean "nothing known".
pub fn normalize_free_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed.to_string())
    }
}
