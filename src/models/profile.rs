use serde::{Deserialize, Serialize};

use super::enums::{Gender, PatientContext};

/// Default age shown in the profile form on first use.
pub const DEFAULT_AGE: i32 = 25;

/// Patient attributes as entered in the profile form.
///
/// Untrusted until it passes `validate_profile`. `age` is signed so that
/// out-of-range input reaches the validator instead of failing at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub age: i32,
    pub gender: Gender,
    pub context: PatientContext,
    pub allergies: String,
    #[serde(default)]
    pub chronic_conditions: Option<String>,
}

impl Default for PatientProfile {
    fn default() -> Self {
        Self {
            age: DEFAULT_AGE,
            gender: Gender::Male,
            context: PatientContext::None,
            allergies: "None".into(),
            chronic_conditions: None,
        }
    }
}

impl PatientProfile {
    /// Change gender, resetting the context to `None` when the new gender
    /// does not permit it. Returns true if the context was reset.
    pub fn set_gender(&mut self, gender: Gender) -> bool {
        self.gender = gender;
        if gender.permits(self.context) {
            return false;
        }
        tracing::debug!(
            gender = %gender,
            dropped_context = %self.context,
            "Context not valid for new gender, reset to None"
        );
        self.context = PatientContext::None;
        true
    }
}
