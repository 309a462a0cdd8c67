use serde::{Deserialize, Serialize};

use crate::pipeline::ValidationError;

/// Macro to generate enum with as_str + Display + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ValidationError::UnknownValue {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Gender {
    Male => "Male",
    Female => "Female",
    Other => "Other",
});

str_enum!(PatientContext {
    None => "None",
    Pregnant => "Pregnant",
    Breastfeeding => "Breastfeeding",
    Puberty => "Puberty",
    Menopause => "Menopause",
    Other => "Other",
});

str_enum!(ResponseLanguage {
    English => "English",
    Hindi => "Hindi",
    Spanish => "Spanish",
    French => "French",
});

str_enum!(TriageStatus {
    Stable => "Stable",
    Caution => "Caution",
    Urgent => "Urgent",
    Unknown => "Unknown",
});

const FEMALE_CONTEXTS: &[PatientContext] = &[
    PatientContext::None,
    PatientContext::Pregnant,
    PatientContext::Breastfeeding,
    PatientContext::Puberty,
    PatientContext::Menopause,
];

const GENERAL_CONTEXTS: &[PatientContext] = &[
    PatientContext::None,
    PatientContext::Puberty,
    PatientContext::Other,
];

impl Gender {
    /// Physiological contexts selectable for this gender, in form order.
    pub fn allowed_contexts(&self) -> &'static [PatientContext] {
        match self {
            Self::Female => FEMALE_CONTEXTS,
            Self::Male | Self::Other => GENERAL_CONTEXTS,
        }
    }

    pub fn permits(&self, context: PatientContext) -> bool {
        self.allowed_contexts().contains(&context)
    }
}

impl Default for ResponseLanguage {
    fn default() -> Self {
        Self::English
    }
}

impl ResponseLanguage {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

impl TriageStatus {
    /// Banner text shown above the report.
    pub fn banner(&self) -> &'static str {
        match self {
            Self::Stable => "✅ STABLE: no urgent risk signals detected",
            Self::Caution => "⚠️ CAUTION: low-confidence assessment, review with a clinician",
            Self::Urgent => "🚨 URGENT: seek medical care now",
            Self::Unknown => "❔ UNABLE TO ASSESS: the response could not be interpreted",
        }
    }
}
