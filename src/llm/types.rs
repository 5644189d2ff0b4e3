//! Common types for LLM interactions

/// LLM request
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Message in a conversation
#[derive(Debug, Clone)]
pub struct LlmMessage {
    pub role: MessageRole,
    pub text: String,
}

impl LlmMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
}

/// LLM response
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// Text parts in the order the model produced them
    pub parts: Vec<String>,
    pub finish_reason: Option<String>,
    pub usage: Usage,
}

impl LlmResponse {
    /// Create a response holding a single text part
    #[allow(dead_code)] // Used by mocks
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            parts: vec![text.into()],
            finish_reason: Some("STOP".to_string()),
            usage: Usage::default(),
        }
    }

    /// Get text content from the response
    pub fn text(&self) -> String {
        self.parts.concat()
    }
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
