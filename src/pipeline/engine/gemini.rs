use base64::Engine as _;

use super::gemini_types::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
};
use super::{AiEngine, EngineError};
use crate::config::{ApiKey, EngineConfig};
use crate::models::ImageBlob;
use crate::pipeline::prompt::PromptText;

/// Blocking HTTP client for the hosted generative model.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: Option<ApiKey>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build a client from engine settings. A missing key is accepted here and
    /// reported as `EngineError::Auth` on the first `send`.
    pub fn new(config: &EngineConfig, api_key: Option<ApiKey>) -> Result<Self, EngineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::Transport(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

impl AiEngine for GeminiClient {
    fn send(&self, prompt: &PromptText, image: Option<&ImageBlob>) -> Result<String, EngineError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EngineError::Auth("no API key configured".into()))?;

        let body = build_request_body(prompt, image);

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.as_str().len(),
            image_bytes = image.map(ImageBlob::len).unwrap_or(0),
            "Sending triage prompt to AI engine"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key.expose())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Transport(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else if e.is_connect() {
                    EngineError::Transport(format!("Cannot connect to {}", self.base_url))
                } else if e.is_request() || e.is_body() {
                    EngineError::Transport(e.to_string())
                } else {
                    EngineError::Unknown(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let err = classify_http_failure(status.as_u16(), &body);
            tracing::warn!(
                status = status.as_u16(),
                kind = ?err.kind(),
                "AI engine returned an error status"
            );
            return Err(err);
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| EngineError::Unknown(format!("Malformed engine response: {e}")))?;

        extract_text(&parsed)
    }
}

/// Prompt text first, then the image (if any) as base64 inline data.
fn build_request_body<'a>(
    prompt: &'a PromptText,
    image: Option<&ImageBlob>,
) -> GenerateContentRequest<'a> {
    let mut parts = vec![Part::Text {
        text: prompt.as_str(),
    }];
    if let Some(img) = image {
        parts.push(Part::InlineData {
            inline_data: InlineData {
                mime_type: sniff_mime_type(img.bytes()),
                data: base64::engine::general_purpose::STANDARD.encode(img.bytes()),
            },
        });
    }
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
    }
}

/// Guess the MIME type from magic bytes. Unknown formats are sent as opaque
/// octets and left to the provider to accept or reject.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    use image::ImageFormat;

    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Tiff) => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Map a non-2xx response to an error kind.
///
/// The provider answers an invalid key with 400 rather than 401, so the body
/// is inspected for that case.
pub fn classify_http_failure(status: u16, body: &str) -> EngineError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| {
            if env.error.status.is_empty() {
                env.error.message
            } else {
                format!("{}: {}", env.error.status, env.error.message)
            }
        })
        .unwrap_or_else(|_| format!("HTTP {status}"));

    match status {
        401 | 403 => EngineError::Auth(message),
        400 if body.contains("API_KEY_INVALID") || body.contains("API key not valid") => {
            EngineError::Auth(message)
        }
        429 => EngineError::RateLimit(message),
        408 | 500..=599 => EngineError::Transport(message),
        _ => EngineError::Unknown(message),
    }
}

fn extract_text(response: &GenerateContentResponse) -> Result<String, EngineError> {
    match response.first_candidate_text() {
        Some(text) => {
            tracing::debug!(response_len = text.len(), "AI engine response received");
            Ok(text)
        }
        None => {
            let reason = response.block_reason().unwrap_or("no candidates returned");
            tracing::warn!(reason = %reason, "AI engine returned no answer");
            Err(EngineError::Unknown(format!("Response blocked: {reason}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];

    fn config() -> EngineConfig {
        EngineConfig {
            base_url: "http://127.0.0.1:9/".into(),
            ..EngineConfig::default()
        }
    }

    #[test]
    fn endpoint_uses_model_and_trims_slash() {
        let client = GeminiClient::new(&config(), None).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:9/v1beta/models/gemini-2.0-flash-lite:generateContent"
        );
        assert_eq!(client.model(), "gemini-2.0-flash-lite");
    }

    #[test]
    fn missing_key_is_auth_error_without_network() {
        let client = GeminiClient::new(&config(), None).unwrap();
        let err = client
            .send(&PromptText::for_tests("hello"), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Auth(_)));
    }

    #[test]
    fn unreachable_host_is_transport_error() {
        let cfg = EngineConfig {
            timeout_secs: 2,
            ..config()
        };
        let client = GeminiClient::new(&cfg, Some(ApiKey::new("test-key"))).unwrap();
        let err = client
            .send(&PromptText::for_tests("hello"), None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Transport(_)), "got {err:?}");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(classify_http_failure(401, ""), EngineError::Auth(_)));
        assert!(matches!(classify_http_failure(403, ""), EngineError::Auth(_)));
        assert!(matches!(classify_http_failure(429, ""), EngineError::RateLimit(_)));
        assert!(matches!(classify_http_failure(503, ""), EngineError::Transport(_)));
        assert!(matches!(classify_http_failure(408, ""), EngineError::Transport(_)));
        assert!(matches!(classify_http_failure(404, ""), EngineError::Unknown(_)));
        assert!(matches!(classify_http_failure(400, "bad"), EngineError::Unknown(_)));
    }

    #[test]
    fn invalid_key_400_is_auth() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        let err = classify_http_failure(400, body);
        assert_eq!(
            err,
            EngineError::Auth(
                "INVALID_ARGUMENT: API key not valid. Please pass a valid API key.".into()
            )
        );
    }

    #[test]
    fn unparseable_error_body_falls_back_to_status() {
        assert_eq!(
            classify_http_failure(429, "<html>Too Many Requests</html>"),
            EngineError::RateLimit("HTTP 429".into())
        );
    }

    #[test]
    fn mime_sniffing() {
        assert_eq!(sniff_mime_type(PNG_MAGIC), "image/png");
        assert_eq!(sniff_mime_type(JPEG_MAGIC), "image/jpeg");
        assert_eq!(sniff_mime_type(b"not an image"), "application/octet-stream");
    }

    #[test]
    fn request_body_passes_image_bytes_through() {
        let prompt = PromptText::for_tests("look at this");
        let image = ImageBlob::new(PNG_MAGIC.to_vec());
        let body = build_request_body(&prompt, Some(&image));
        let json = serde_json::to_value(&body).unwrap();

        let data = json["contents"][0]["parts"][1]["inline_data"]["data"]
            .as_str()
            .unwrap();
        let decoded = base64::engine::general_purpose::STANDARD.decode(data).unwrap();
        assert_eq!(decoded, PNG_MAGIC);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "look at this");
    }

    #[test]
    fn request_body_without_image_has_one_part() {
        let prompt = PromptText::for_tests("text only");
        let body = build_request_body(&prompt, None);
        assert_eq!(body.contents[0].parts.len(), 1);
    }

    #[test]
    fn blocked_response_is_unknown_error() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert_eq!(
            extract_text(&resp).unwrap_err(),
            EngineError::Unknown("Response blocked: SAFETY".into())
        );
    }
}
