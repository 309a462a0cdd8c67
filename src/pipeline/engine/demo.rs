//! Offline engine for live demos: no network, no credentials.
//!
//! Always answers with the same reassuring report so a presentation never
//! depends on quota or connectivity.

use super::{AiEngine, EngineError};
use crate::models::ImageBlob;
use crate::pipeline::prompt::PromptText;

pub const DEMO_CONFIDENCE: u8 = 92;

const DEMO_RESPONSE: &str = "SAFETY STATUS: SAFE TO PROCEED. No acute contraindications were detected for this profile.

KEY FINDINGS:
- The described input is consistent with a common, self-limiting complaint.
- No interactions with the listed allergies or context were identified.

GUIDANCE:
1. Proceed with standard dosage as prescribed.
2. Monitor for common side effects like mild drowsiness.
3. Maintain hydration and rest.

WHEN TO SEEK CARE:
- Symptoms persist beyond 48 hours or get worse.
- New symptoms appear, such as a spreading rash or high fever.";

#[derive(Debug, Default, Clone, Copy)]
pub struct DemoEngine;

impl DemoEngine {
    pub fn new() -> Self {
        Self
    }
}

impl AiEngine for DemoEngine {
    fn send(&self, prompt: &PromptText, image: Option<&ImageBlob>) -> Result<String, EngineError> {
        tracing::debug!(
            prompt_len = prompt.as_str().len(),
            has_image = image.is_some(),
            "Demo engine answering with canned report"
        );
        Ok(format!("{DEMO_RESPONSE}\n\nCONFIDENCE SCORE: {DEMO_CONFIDENCE}%"))
    }
}
