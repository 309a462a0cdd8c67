use serde::{Deserialize, Serialize};

use super::enums::ResponseLanguage;
use super::profile::PatientProfile;

/// Photo attached to an analysis (pill, rash, packaging...).
///
/// Opaque to the triage core: the bytes are handed to the engine untouched.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlob {
    bytes: Vec<u8>,
}

impl ImageBlob {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBlob").field("len", &self.bytes.len()).finish()
    }
}

/// One "Analyze" action: profile snapshot, symptom/medicine text, optional photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub profile: PatientProfile,
    pub query: String,
    #[serde(default)]
    pub image: Option<ImageBlob>,
    #[serde(default)]
    pub response_language: ResponseLanguage,
}

impl AnalysisRequest {
    pub fn new(profile: PatientProfile, query: impl Into<String>) -> Self {
        Self {
            profile,
            query: query.into(),
            image: None,
            response_language: ResponseLanguage::default(),
        }
    }

    pub fn with_image(mut self, image: ImageBlob) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_language(mut self, language: ResponseLanguage) -> Self {
        self.response_language = language;
        self
    }

    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// The attached image, if it carries any bytes.
    pub fn attached_image(&self) -> Option<&ImageBlob> {
        self.image.as_ref().filter(|img| !img.is_empty())
    }
}
