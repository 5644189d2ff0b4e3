//! LLM provider configuration

/// Model used when `FORTUNE_MODEL` is not set
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Configuration for the fortune model
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Key injected at startup; takes precedence over the stored key
    pub gemini_api_key: Option<String>,
    /// Gateway URL replacing the public Gemini endpoint
    pub gateway: Option<String>,
    /// Model API name
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gateway: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            gateway: std::env::var("LLM_GATEWAY").ok(),
            model: std::env::var("FORTUNE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }
}
