//! Wire types for the hosted model's `generateContent` REST call.
//!
//! Only the fields the triage core reads are modelled; everything else in
//! the provider's response is ignored by serde.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Request
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    pub role: &'static str,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
pub struct InlineData {
    pub mime_type: &'static str,
    /// Base64 (standard alphabet, padded).
    pub data: String,
}

// ═══════════════════════════════════════════════════════════
// Response
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any candidate exists.
    pub fn first_candidate_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text = candidate
            .content
            .as_ref()
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        Some(text)
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_text_and_inline_data() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: "hello" },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/png",
                            data: "AAAA".into(),
                        },
                    },
                ],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(json["contents"][0]["parts"][1]["inline_data"]["data"], "AAAA");
    }

    #[test]
    fn response_text_joins_parts() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "SAFETY STATUS: "}, {"text": "stable"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"totalTokenCount": 12}
        }"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_candidate_text().as_deref(), Some("SAFETY STATUS: stable"));
        assert_eq!(resp.candidates[0].finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn blocked_prompt_has_no_candidates() {
        let json = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert!(resp.first_candidate_text().is_none());
        assert_eq!(resp.block_reason(), Some("SAFETY"));
    }

    #[test]
    fn candidate_without_content_yields_empty_text() {
        let json = r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_candidate_text().as_deref(), Some(""));
    }

    #[test]
    fn error_envelope_parses() {
        let json = r#"{"error": {"code": 429, "message": "Resource exhausted", "status": "RESOURCE_EXHAUSTED"}}"#;
        let env: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.error.status, "RESOURCE_EXHAUSTED");
        assert_eq!(env.error.message, "Resource exhausted");
    }
}
