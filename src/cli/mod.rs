use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional API Key required for clients to connect to the WebSocket server. If set, clients must provide this key.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    // --- Chat LLM Provider Args ---
    /// Base URL for the chat completion API (defaults to https://api.openai.com)
    #[arg(long, env = "CHAT_BASE_URL")]
    pub chat_base_url: Option<String>,

    /// Model name for chat completion (defaults to gpt-3.5-turbo)
    #[arg(long, env = "CHAT_MODEL")]
    pub chat_model: Option<String>,

    /// Maximum number of tokens in a generated answer.
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "300")]
    pub chat_max_tokens: u32,

    /// Sampling temperature for generated answers.
    #[arg(long, env = "CHAT_TEMPERATURE", default_value = "0.7")]
    pub chat_temperature: f32,

    #[arg(long, env = "CHAT_PRESENCE_PENALTY", default_value = "0.1")]
    pub chat_presence_penalty: f32,

    #[arg(long, env = "CHAT_FREQUENCY_PENALTY", default_value = "0.1")]
    pub chat_frequency_penalty: f32,

    /// Upper bound in seconds for one remote completion call.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "20")]
    pub request_timeout_secs: u64,

    // --- Content Args ---
    /// Path to a knowledge base JSON file. The built-in portfolio data is used when unset.
    #[arg(long, env = "KNOWLEDGE_PATH")]
    pub knowledge_path: Option<String>,

    /// Path to the prompt configuration file. Built-in templates are used when unset.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- Session Args ---
    /// JSON file holding the visitor's API key. An empty value keeps it in memory only.
    #[arg(long, env = "CREDENTIAL_STORE_PATH", default_value = "data/credentials.json")]
    pub credential_store_path: String,

    /// Longest accepted chat message, in characters.
    #[arg(long, env = "MAX_MESSAGE_LENGTH", default_value = "500")]
    pub max_message_length: usize,
}
