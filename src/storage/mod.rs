mod file;
mod memory;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Key under which a visitor's completion API key is kept.
pub const CREDENTIAL_KEY: &str = "portfolio_openai_key";

const VISITOR_ID_MIN_LEN: usize = 8;
const VISITOR_ID_MAX_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("credential store IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent key/value slot for API keys, one entry per visitor id. A
/// visitor only ever reads or erases its own entry.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self, visitor_id: &str) -> Result<Option<String>, StorageError>;

    async fn save(&self, visitor_id: &str, credential: &str) -> Result<(), StorageError>;

    async fn clear(&self, visitor_id: &str) -> Result<(), StorageError>;

    /// Removes the visitor's entry only while it still holds `credential`.
    /// Returns whether anything was removed.
    async fn clear_matching(&self, visitor_id: &str, credential: &str) -> Result<bool, StorageError>;
}

/// Accepts browser-generated ids such as UUIDs. Anything else means the
/// connection gets a session-only credential.
pub fn normalize_visitor_id(raw: &str) -> Option<String> {
    let id = raw.trim();
    let len = id.chars().count();
    let well_formed = (VISITOR_ID_MIN_LEN..=VISITOR_ID_MAX_LEN).contains(&len) &&
        id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    well_formed.then(|| id.to_string())
}

pub fn create_credential_store(args: &Args) -> Arc<dyn CredentialStore> {
    let path = args.credential_store_path.trim();
    if path.is_empty() {
        info!("Credentials will be kept in memory only");
        Arc::new(MemoryCredentialStore::default())
    } else {
        info!("Credentials will be stored in: {}", path);
        Arc::new(FileCredentialStore::new(path))
    }
}
