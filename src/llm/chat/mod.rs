pub mod openai;

use async_trait::async_trait;
use log::{ debug, warn };
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use std::sync::Arc;

use self::openai::OpenAIChatClient;
use super::{ LlmConfig, RemoteError };
use crate::config::prompt::{ self, PromptConfig };
use crate::intent::ClassificationResult;
use crate::models::knowledge::KnowledgeBase;

const CREDENTIAL_PREFIX: &str = "sk-";
const CREDENTIAL_MIN_LEN: usize = 21;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        credential: &str
    ) -> Result<CompletionResponse, RemoteError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> String;
}

pub fn new_client(
    config: &LlmConfig
) -> Result<Arc<dyn ChatClient>, Box<dyn StdError + Send + Sync>> {
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(client))
}

/// Accepts keys shaped like `sk-` followed by at least 18 more characters.
pub fn is_valid_credential(credential: &str) -> bool {
    credential.starts_with(CREDENTIAL_PREFIX) && credential.len() >= CREDENTIAL_MIN_LEN
}

/// Asks the remote model about the portfolio. The credential is checked
/// before anything is sent.
pub async fn generate_remote(
    client: &dyn ChatClient,
    prompts: &PromptConfig,
    utterance: &str,
    classification: &ClassificationResult,
    kb: &KnowledgeBase,
    credential: &str
) -> Result<String, RemoteError> {
    if !is_valid_credential(credential) {
        warn!("Refusing remote call: credential does not look like an API key");
        return Err(RemoteError::InvalidCredential);
    }

    let messages = vec![
        ChatMessage::system(prompt::get_system_prompt(prompts, kb)),
        ChatMessage::user(prompt::get_user_prompt(prompts, kb, utterance, classification.intent))
    ];
    debug!(
        "Sending {} messages to {} (model {}) for intent '{}'",
        messages.len(),
        client.get_base_url(),
        client.get_model(),
        classification.intent
    );

    let completion = client.complete(&messages, credential).await?;
    let text = completion.response.trim();
    if text.is_empty() {
        return Err(RemoteError::EmptyResponse);
    }
    Ok(text.to_string())
}
