//! Lucky-number fortune generation
//!
//! Asks the model for a short upbeat reading of the drawn numbers and
//! folds every possible result into one of three outcomes.

use crate::credential::Credential;
use crate::llm::{
    GeminiService, LlmConfig, LlmError, LlmErrorKind, LlmMessage, LlmRequest, LlmService,
    LoggingService,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const FORTUNE_PROMPT: &str = "You are a charismatic lottery fortune teller. These are the 6 lotto numbers drawn: {numbers}.
Give a short, energetic, and positive 2-sentence fortune analysis in Korean for the user.
Make it feel mystical but fun.";

const FORTUNE_TEMPERATURE: f32 = 0.8;
const FORTUNE_MAX_TOKENS: u32 = 150;
const FORTUNE_TIMEOUT: Duration = Duration::from_secs(30);

/// Shown when the model answers with no text
pub const EMPTY_RESPONSE_FORTUNE: &str =
    "행운이 당신을 기다리고 있습니다! 오늘 하루 멋진 일이 생길 것 같아요.";

/// Shown when the request fails for any reason other than the key
pub const DEGRADED_FORTUNE: &str = "오늘의 번호가 당신의 운명을 바꿀지도 모릅니다. 행운을 빌어요!";

/// Shown when the key is missing or refused
pub const CREDENTIAL_REPROMPT: &str =
    "API 키가 유효하지 않거나 설정되지 않았습니다. 키를 다시 입력해 주세요.";

/// Caption for clients while a fortune is loading
pub const FORTUNE_LOADING_CAPTION: &str = "Gemini가 번호를 분석하는 중...";

/// Lowercased fragments of provider messages that mean the key is bad
const INVALID_KEY_MARKERS: &[&str] = &[
    "api key not valid",
    "api_key_invalid",
    "invalid key",
    "invalid api key",
    "entity not found",
    "entity was not found",
    "unauthenticated",
];

/// Result of a fortune request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FortuneOutcome {
    Success(String),
    /// Missing, malformed or refused key. The user has to enter a new one.
    CredentialInvalid,
    /// Anything else went wrong; carries the fallback text to show
    Degraded(String),
}

/// Builds a service bound to one API key
pub type ServiceFactory =
    Arc<dyn Fn(&str) -> Result<Arc<dyn LlmService>, LlmError> + Send + Sync>;

/// Client for fortune requests
pub struct FortuneClient {
    factory: ServiceFactory,
}

impl FortuneClient {
    pub fn new(config: &LlmConfig) -> Self {
        let model = config.model.clone();
        let gateway = config.gateway.clone();
        Self::with_factory(Arc::new(
            move |api_key: &str| -> Result<Arc<dyn LlmService>, LlmError> {
                let service = GeminiService::new(api_key, &model, gateway.as_deref())?;
                Ok(Arc::new(LoggingService::new(Arc::new(service))))
            },
        ))
    }

    pub fn with_factory(factory: ServiceFactory) -> Self {
        Self { factory }
    }

    /// Request a fortune for `numbers`.
    ///
    /// Never fails: every error ends up as `CredentialInvalid` or `Degraded`.
    pub async fn request_fortune(
        &self,
        numbers: &[u32],
        credential: Option<&Credential>,
    ) -> FortuneOutcome {
        let Some(credential) = credential else {
            tracing::warn!("No API key available, skipping fortune request");
            return FortuneOutcome::CredentialInvalid;
        };

        // A fresh service per call so a replaced key is never reused
        let service = match (self.factory)(credential.value()) {
            Ok(service) => service,
            Err(e) => {
                tracing::error!(error = %e.message, "Failed to build LLM service");
                return FortuneOutcome::Degraded(DEGRADED_FORTUNE.to_string());
            }
        };

        let request = fortune_request(numbers);

        match timeout(FORTUNE_TIMEOUT, service.complete(&request)).await {
            Ok(Ok(response)) => {
                let text = response.text();
                let text = text.trim();
                if text.is_empty() {
                    tracing::info!("Fortune response was empty, using fallback");
                    FortuneOutcome::Success(EMPTY_RESPONSE_FORTUNE.to_string())
                } else {
                    FortuneOutcome::Success(text.to_string())
                }
            }
            Ok(Err(e)) => classify_failure(&e),
            Err(_) => {
                tracing::warn!(timeout_secs = FORTUNE_TIMEOUT.as_secs(), "Fortune request timed out");
                FortuneOutcome::Degraded(DEGRADED_FORTUNE.to_string())
            }
        }
    }
}

fn fortune_request(numbers: &[u32]) -> LlmRequest {
    let joined = numbers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    LlmRequest {
        messages: vec![LlmMessage::user(FORTUNE_PROMPT.replace("{numbers}", &joined))],
        max_tokens: Some(FORTUNE_MAX_TOKENS),
        temperature: Some(FORTUNE_TEMPERATURE),
    }
}

/// Map a provider failure to an outcome. Raw detail stays in the logs.
fn classify_failure(error: &LlmError) -> FortuneOutcome {
    let message = error.message.to_lowercase();
    let key_rejected = error.kind == LlmErrorKind::Auth
        || INVALID_KEY_MARKERS
            .iter()
            .any(|marker| message.contains(marker));

    if key_rejected {
        tracing::warn!(kind = ?error.kind, "API key rejected by provider");
        FortuneOutcome::CredentialInvalid
    } else {
        tracing::warn!(kind = ?error.kind, error = %error.message, "Fortune request failed, using fallback");
        FortuneOutcome::Degraded(DEGRADED_FORTUNE.to_string())
    }
}
