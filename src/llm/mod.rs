pub mod chat;

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Failures of the remote completion call. Every variant degrades to a
/// template answer; `InvalidCredential` also erases the stored key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("the API key was rejected")]
    InvalidCredential,
    #[error("rate limited by the completion endpoint")]
    RateLimited,
    #[error("completion endpoint unavailable: {0}")]
    Unavailable(String),
    #[error("completion endpoint returned no text")]
    EmptyResponse,
}

impl RemoteError {
    pub fn user_message(&self) -> &'static str {
        match self {
            RemoteError::InvalidCredential =>
                "Your API key was rejected, so it has been removed. Here's what I can tell you without it:",
            RemoteError::RateLimited =>
                "The AI service is busy right now. Here's what I can tell you in the meantime:",
            RemoteError::Unavailable(_) =>
                "Sorry, I couldn't reach the AI service. Here's what I can tell you anyway:",
            RemoteError::EmptyResponse =>
                "Sorry, the AI service sent back an empty answer. Here's what I know:",
        }
    }
}

/// Fixed decoding parameters sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Default for DecodingParams {
    fn default() -> Self {
        Self {
            max_tokens: 300,
            temperature: 0.7,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub completion_model: Option<String>,
    pub params: DecodingParams,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            completion_model: None,
            params: DecodingParams::default(),
            timeout: Duration::from_secs(20),
        }
    }
}
