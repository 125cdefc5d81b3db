use async_trait::async_trait;
use log::{ debug, warn };
use serde_json::{ Map, Value };
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use tokio::fs;
use tokio::sync::Mutex;

use super::{ CredentialStore, StorageError, CREDENTIAL_KEY };

/// Stores credentials in a JSON object file keyed by visitor id:
/// `{ "<visitor>": { "portfolio_openai_key": "sk-..." } }`. Other keys in the
/// file are left untouched.
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

fn stored_credential<'a>(entries: &'a Map<String, Value>, visitor_id: &str) -> Option<&'a str> {
    entries.get(visitor_id)?.get(CREDENTIAL_KEY)?.as_str()
}

/// Drops the visitor's credential, and the visitor entry once it is empty.
fn remove_credential(entries: &mut Map<String, Value>, visitor_id: &str) -> bool {
    let Some(Value::Object(visitor)) = entries.get_mut(visitor_id) else {
        return false;
    };
    let removed = visitor.remove(CREDENTIAL_KEY).is_some();
    if visitor.is_empty() {
        entries.remove(visitor_id);
    }
    removed
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), write_lock: Mutex::new(()) }
    }

    async fn read_entries(&self) -> Result<Map<String, Value>, StorageError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(Map::new());
            }
            Err(e) => {
                return Err(e.into());
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => {
                warn!("{} does not hold a JSON object, starting fresh", self.path.display());
                Ok(Map::new())
            }
        }
    }

    async fn write_entries(&self, entries: Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_string_pretty(&Value::Object(entries))?;
        fs::write(&self.path, body).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self, visitor_id: &str) -> Result<Option<String>, StorageError> {
        let entries = self.read_entries().await?;
        Ok(stored_credential(&entries, visitor_id).map(str::to_owned))
    }

    async fn save(&self, visitor_id: &str, credential: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let visitor = entries
            .entry(visitor_id.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !visitor.is_object() {
            *visitor = Value::Object(Map::new());
        }
        if let Value::Object(visitor) = visitor {
            visitor.insert(CREDENTIAL_KEY.to_string(), Value::String(credential.to_string()));
        }
        self.write_entries(entries).await?;
        debug!("Credential for visitor {} written to {}", visitor_id, self.path.display());
        Ok(())
    }

    async fn clear(&self, visitor_id: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        if remove_credential(&mut entries, visitor_id) {
            self.write_entries(entries).await?;
            debug!("Credential for visitor {} removed from {}", visitor_id, self.path.display());
        }
        Ok(())
    }

    async fn clear_matching(&self, visitor_id: &str, credential: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        if stored_credential(&entries, visitor_id) != Some(credential) {
            return Ok(false);
        }
        remove_credential(&mut entries, visitor_id);
        self.write_entries(entries).await?;
        Ok(true)
    }
}
