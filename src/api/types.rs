//! API request and response types

use crate::credential::CredentialSource;
use serde::{Deserialize, Serialize};

/// Request to submit an API key
#[derive(Debug, Deserialize)]
pub struct CredentialRequest {
    pub api_key: String,
    /// Persist the key across restarts
    #[serde(default = "default_remember")]
    pub remember: bool,
}

fn default_remember() -> bool {
    true
}

/// Whether an API key is available, and from where. Never the key itself.
#[derive(Debug, Serialize)]
pub struct CredentialStatusResponse {
    pub configured: bool,
    pub source: Option<CredentialSource>,
}

impl CredentialStatusResponse {
    pub fn new(source: Option<CredentialSource>) -> Self {
        Self {
            configured: source.is_some(),
            source,
        }
    }
}

/// Response for session intents. The outcome arrives as a state change.
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
