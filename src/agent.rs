use log::{ info, warn, error };
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::cli::Args;
use crate::config::knowledge::load_knowledge_base;
use crate::config::prompt::{ self, PromptConfig };
use crate::intent::{ classify, ClassificationResult, Intent };
use crate::llm::{ DecodingParams, LlmConfig, RemoteError };
use crate::llm::chat::{ generate_remote, is_valid_credential, new_client as new_chat_client, ChatClient };
use crate::models::knowledge::KnowledgeBase;
use crate::navigation::{ is_navigation_request, resolve_navigation, Preview };
use crate::session::{ Session, SessionError };
use crate::storage::{ create_credential_store, CredentialStore };
use crate::templates;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_MAX_MESSAGE_LENGTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Navigation,
    Remote,
    Template,
}

/// One assistant answer. `text` is never empty.
#[derive(Debug, Clone)]
pub struct Response {
    pub text: String,
    pub preview: Option<Preview>,
    pub source: ResponseSource,
    /// Apology shown above a fallback answer when the remote call failed.
    pub notice: Option<String>,
    pub remote_error: Option<RemoteError>,
}

/// A message accepted by [`PortfolioAgent::start_request`] and not yet
/// answered.
#[derive(Debug)]
pub struct PendingRequest {
    text: String,
    credential: Option<String>,
    visitor_id: Option<String>,
}

impl PendingRequest {
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Response {
    fn template(text: String) -> Self {
        Self { text, preview: None, source: ResponseSource::Template, notice: None, remote_error: None }
    }
}

#[derive(Clone)]
pub struct PortfolioAgent {
    knowledge: Arc<KnowledgeBase>,
    chat_client: Arc<dyn ChatClient>,
    prompt_config: Arc<PromptConfig>,
    credential_store: Arc<dyn CredentialStore>,
    request_timeout: Duration,
    max_message_length: usize,
}

impl PortfolioAgent {
    pub async fn new(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let knowledge = load_knowledge_base(args.knowledge_path.as_deref())?;
        let prompt_config = prompt::load_prompts(args.prompts_path.as_deref())?;
        info!(
            "Knowledge base ready: {} projects, {} skill categories, {} sections",
            knowledge.projects.len(),
            knowledge.skill_categories.len(),
            knowledge.sections.len()
        );

        let request_timeout = Duration::from_secs(args.request_timeout_secs);
        let chat_config = LlmConfig {
            base_url: args.chat_base_url.clone(),
            completion_model: args.chat_model.clone(),
            params: DecodingParams {
                max_tokens: args.chat_max_tokens,
                temperature: args.chat_temperature,
                presence_penalty: args.chat_presence_penalty,
                frequency_penalty: args.chat_frequency_penalty,
            },
            timeout: request_timeout,
        };
        let chat_client = new_chat_client(&chat_config)?;
        info!(
            "Chat client configured: Model={}, BaseURL={}",
            chat_client.get_model(),
            chat_client.get_base_url()
        );

        let credential_store = create_credential_store(args);

        Ok(
            Self::from_parts(knowledge, chat_client, prompt_config, credential_store)
                .with_request_timeout(request_timeout)
                .with_max_message_length(args.max_message_length)
        )
    }

    pub fn from_parts(
        knowledge: Arc<KnowledgeBase>,
        chat_client: Arc<dyn ChatClient>,
        prompt_config: Arc<PromptConfig>,
        credential_store: Arc<dyn CredentialStore>
    ) -> Self {
        Self {
            knowledge,
            chat_client,
            prompt_config,
            credential_store,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_message_length(mut self, max: usize) -> Self {
        self.max_message_length = max;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Opens a session, picking up any credential this visitor saved on an
    /// earlier visit. Anonymous sessions never touch the store.
    pub async fn new_session(&self, visitor_id: Option<String>) -> Session {
        let credential = match visitor_id.as_deref() {
            Some(visitor) =>
                match self.credential_store.load(visitor).await {
                    Ok(credential) => credential.filter(|c| is_valid_credential(c)),
                    Err(e) => {
                        warn!("Could not read stored credential, continuing without one: {}", e);
                        None
                    }
                }
            None => None,
        };
        let session = Session::new(visitor_id, credential);
        info!(
            "Started conversation {} (remote answers {})",
            session.conversation_id(),
            if session.credential().is_some() { "enabled" } else { "disabled" }
        );
        session
    }

    /// Answers one utterance. Navigation phrasing wins over the classified
    /// intent; otherwise the remote model is tried when a credential is
    /// present, and any failure there falls back to the template answer.
    pub async fn respond(
        &self,
        utterance: &str,
        classification: &ClassificationResult,
        credential: Option<&str>
    ) -> Response {
        if classification.intent == Intent::Navigation || is_navigation_request(utterance) {
            let outcome = resolve_navigation(utterance, &self.knowledge);
            return Response {
                text: outcome.text,
                preview: outcome.preview,
                source: ResponseSource::Navigation,
                notice: None,
                remote_error: None,
            };
        }

        let Some(credential) = credential else {
            return Response::template(templates::render(classification.intent, utterance, &self.knowledge));
        };

        let remote = tokio::time::timeout(
            self.request_timeout,
            generate_remote(
                self.chat_client.as_ref(),
                &self.prompt_config,
                utterance,
                classification,
                &self.knowledge,
                credential
            )
        ).await;
        let result = match remote {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Unavailable(format!("request timed out after {:?}", self.request_timeout))),
        };

        match result {
            Ok(text) => Response {
                text,
                preview: None,
                source: ResponseSource::Remote,
                notice: None,
                remote_error: None,
            },
            Err(e) => {
                warn!("Remote answer failed ({}), using template for intent '{}'", e, classification.intent);
                let mut response = Response::template(
                    templates::render(classification.intent, utterance, &self.knowledge)
                );
                response.notice = Some(e.user_message().to_string());
                response.remote_error = Some(e);
                response
            }
        }
    }

    /// Validates the message and marks the session pending. Nothing waits on
    /// the remote model here, so a second frame arriving meanwhile is refused
    /// straight away.
    pub async fn start_request(
        &self,
        session: &Mutex<Session>,
        message: &str
    ) -> Result<PendingRequest, SessionError> {
        let mut guard = session.lock().await;
        let text = guard.begin_request(message, self.max_message_length)?;
        Ok(PendingRequest {
            text,
            credential: guard.credential().map(str::to_owned),
            visitor_id: guard.visitor_id().map(str::to_owned),
        })
    }

    /// Answers a started request without holding the session lock, then
    /// appends the round.
    pub async fn finish_request(&self, session: &Mutex<Session>, pending: PendingRequest) -> Response {
        let PendingRequest { text, credential, visitor_id } = pending;

        let classification = classify(&text);
        info!(
            "Classified message as '{}' (matched: {:?})",
            classification.intent,
            classification.matched_keywords
        );

        let response = self.respond(&text, &classification, credential.as_deref()).await;

        let rejected = response.remote_error == Some(RemoteError::InvalidCredential);
        if rejected {
            if let (Some(visitor), Some(credential)) = (visitor_id.as_deref(), credential.as_deref()) {
                if let Err(e) = self.credential_store.clear_matching(visitor, credential).await {
                    error!("Failed to erase rejected credential from store: {}", e);
                }
            }
        }

        let mut guard = session.lock().await;
        if rejected && guard.credential() == credential.as_deref() {
            guard.set_credential(None);
            info!("Erased rejected credential for conversation {}", guard.conversation_id());
        }
        guard.complete_request(&text, &response);
        response
    }

    /// Runs one full round against a session.
    pub async fn process_message(
        &self,
        session: &Mutex<Session>,
        message: &str
    ) -> Result<Response, SessionError> {
        let pending = self.start_request(session, message).await?;
        Ok(self.finish_request(session, pending).await)
    }

    pub async fn store_credential(&self, session: &Mutex<Session>, key: &str) -> Result<(), SessionError> {
        let key = key.trim();
        if !is_valid_credential(key) {
            return Err(SessionError::InvalidCredentialFormat);
        }
        let visitor_id = session.lock().await.visitor_id().map(str::to_owned);
        match visitor_id.as_deref() {
            Some(visitor) => {
                self.credential_store.save(visitor, key).await?;
                info!("Stored a new API key for visitor {}", visitor);
            }
            None => info!("Keeping a new API key for this session only"),
        }
        session.lock().await.set_credential(Some(key.to_string()));
        Ok(())
    }

    pub async fn clear_credential(&self, session: &Mutex<Session>) -> Result<(), SessionError> {
        let visitor_id = session.lock().await.visitor_id().map(str::to_owned);
        if let Some(visitor) = visitor_id.as_deref() {
            self.credential_store.clear(visitor).await?;
        }
        session.lock().await.set_credential(None);
        info!("API key cleared");
        Ok(())
    }
}
