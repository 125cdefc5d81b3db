use chrono::{ DateTime, NaiveDate, SecondsFormat, TimeZone, Utc };
use serde::{ Serialize, Deserialize };

use crate::models::knowledge::Personal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp_ms: i64,
}

/// Ordered, append-only list of messages for one session.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one completed request/response round.
    pub fn push_round(&mut self, user_text: &str, assistant_text: &str, timestamp_ms: i64) {
        self.messages.push(Message {
            sender: Sender::User,
            text: user_text.to_string(),
            timestamp_ms,
        });
        self.messages.push(Message {
            sender: Sender::Assistant,
            text: assistant_text.to_string(),
            timestamp_ms,
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn export(&self, conversation_id: &str, personal: &Personal) -> ConversationExport {
        ConversationExport {
            conversation_id: conversation_id.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            messages: self.messages
                .iter()
                .map(|m| ExportedMessage {
                    sender: m.sender,
                    text: m.text.clone(),
                    timestamp: format_timestamp_ms(m.timestamp_ms),
                })
                .collect(),
            metadata: ExportMetadata {
                personal: personal.clone(),
                total_messages: self.messages.len(),
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationExport {
    pub conversation_id: String,
    pub timestamp: String,
    pub messages: Vec<ExportedMessage>,
    pub metadata: ExportMetadata,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub sender: Sender,
    pub text: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMetadata {
    pub personal: Personal,
    pub total_messages: usize,
}

impl ConversationExport {
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("portfolio-chat-{}.json", date.format("%Y-%m-%d"))
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn format_timestamp_ms(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => DateTime::<Utc>::UNIX_EPOCH.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}
