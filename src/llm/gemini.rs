//! Google Gemini provider implementation

use super::types::{LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini service implementation
///
/// Bound to one API key for its whole lifetime.
pub struct GeminiService {
    client: Client,
    api_key: String,
    url: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(api_key: &str, model: &str, gateway: Option<&str>) -> Result<Self, LlmError> {
        let url = match gateway {
            Some(gw) => format!(
                "{}/gemini/v1beta/models/{model}:generateContent",
                gw.trim_end_matches('/')
            ),
            None => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
            ),
        };

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            url,
            model_id: model.to_string(),
        })
    }

    fn translate_request(request: &LlmRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .filter(|msg| !msg.text.is_empty())
            .map(|msg| GeminiContent {
                role: Some(
                    match msg.role {
                        MessageRole::User => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(msg.text.clone()),
                    thought: false,
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            }),
        }
    }

    /// A response without candidates or text is not an error here; callers
    /// decide what an empty answer means.
    fn normalize_response(resp: GeminiResponse) -> LlmResponse {
        let usage = resp
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u64::from(u.prompt_token_count),
                output_tokens: u64::from(u.candidates_token_count),
            })
            .unwrap_or_default();

        let Some(candidate) = resp.candidates.into_iter().next() else {
            return LlmResponse {
                usage,
                ..LlmResponse::default()
            };
        };

        let parts = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|part| !part.thought)
            .filter_map(|part| part.text)
            .filter(|text| !text.is_empty())
            .collect();

        LlmResponse {
            parts,
            finish_reason: candidate.finish_reason,
            usage,
        }
    }

    fn classify_status(status: reqwest::StatusCode, message: &str) -> LlmError {
        match status.as_u16() {
            400 => LlmError::invalid_request(format!("Invalid request: {message}")),
            401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
            429 => LlmError::rate_limit(format!("Rate limit exceeded: {message}")),
            500..=599 => LlmError::server_error(format!("Server error: {message}")),
            _ => LlmError::unknown(format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let gemini_request = Self::translate_request(request);

        // Key travels in a header so it never shows up in URL-bearing errors
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {}", e.without_url())))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map_or(body, |error_resp| error_resp.error.message);
            return Err(Self::classify_status(status, &message));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::unknown(format!("Failed to parse response: {e}")))?;

        Ok(Self::normalize_response(gemini_response))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Thinking models mark reasoning parts; those are not answer text
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    thought: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
