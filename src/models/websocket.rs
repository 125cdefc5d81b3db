use serde::{ Serialize, Deserialize };

use crate::navigation::Preview;

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Chat {
        content: String,
    },
    Clear,
    Export,
    SetCredential {
        key: String,
    },
    ClearCredential,
    Help,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Response {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        preview: Option<Preview>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notice: Option<String>,
        timestamp: i64,
    },
    Processing,
    Cleared {
        conversation_id: String,
    },
    Export {
        file_name: String,
        data: String,
    },
    Credential {
        stored: bool,
    },
    Help {
        content: String,
    },
    Error {
        message: String,
    },
}
