//! Per-visitor conversation state.
//!
//! A [`Session`] owns the transcript, the conversation id and the credential
//! for one connection, and tracks the single request that may be in flight.

use log::debug;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::agent::Response;
use crate::models::chat::{ now_ms, ConversationExport, Transcript };
use crate::models::knowledge::Personal;
use crate::storage::StorageError;

const CONVERSATION_SUFFIX_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Idle,
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a request is already in progress")]
    RequestPending,
    #[error("message is empty")]
    EmptyMessage,
    #[error("message is longer than {max} characters")]
    MessageTooLong {
        max: usize,
    },
    #[error("API key must start with 'sk-' and be longer than 20 characters")]
    InvalidCredentialFormat,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub fn new_conversation_id() -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(CONVERSATION_SUFFIX_LEN).collect();
    format!("conv_{}_{}", now_ms(), suffix)
}

#[derive(Debug)]
pub struct Session {
    conversation_id: String,
    visitor_id: Option<String>,
    transcript: Transcript,
    credential: Option<String>,
    state: RequestState,
}

impl Session {
    /// Without a visitor id the credential lives only as long as the session.
    pub fn new(visitor_id: Option<String>, credential: Option<String>) -> Self {
        Self {
            conversation_id: new_conversation_id(),
            visitor_id,
            transcript: Transcript::new(),
            credential,
            state: RequestState::Idle,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn visitor_id(&self) -> Option<&str> {
        self.visitor_id.as_deref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    pub fn set_credential(&mut self, credential: Option<String>) {
        self.credential = credential;
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Accepts a visitor message and marks the session as busy. Returns the
    /// trimmed text that should be answered.
    pub fn begin_request(&mut self, message: &str, max_length: usize) -> Result<String, SessionError> {
        if self.state == RequestState::Pending {
            return Err(SessionError::RequestPending);
        }
        let text = message.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if text.chars().count() > max_length {
            return Err(SessionError::MessageTooLong { max: max_length });
        }
        self.state = RequestState::Pending;
        Ok(text.to_string())
    }

    /// Records a finished round. A round answered from the fallback after a
    /// remote failure still lands in the transcript, but leaves the session
    /// in `Failed`.
    pub fn complete_request(&mut self, user_text: &str, response: &Response) {
        self.transcript.push_round(user_text, &response.text, now_ms());
        self.state = if response.remote_error.is_some() {
            RequestState::Failed
        } else {
            RequestState::Success
        };
        debug!(
            "Conversation {} now holds {} messages ({:?})",
            self.conversation_id,
            self.transcript.len(),
            self.state
        );
    }

    /// Empties the transcript and starts a fresh conversation id.
    pub fn clear(&mut self) -> Result<(), SessionError> {
        if self.state == RequestState::Pending {
            return Err(SessionError::RequestPending);
        }
        self.transcript.clear();
        self.conversation_id = new_conversation_id();
        self.state = RequestState::Idle;
        Ok(())
    }

    pub fn export(&self, personal: &Personal) -> ConversationExport {
        self.transcript.export(&self.conversation_id, personal)
    }
}
