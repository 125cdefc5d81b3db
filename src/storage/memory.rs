use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{ CredentialStore, StorageError };

#[derive(Default)]
pub struct MemoryCredentialStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn with_credential(visitor_id: impl Into<String>, credential: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(visitor_id.into(), credential.into());
        Self { slots: Mutex::new(slots) }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, visitor_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots.lock().await.get(visitor_id).cloned())
    }

    async fn save(&self, visitor_id: &str, credential: &str) -> Result<(), StorageError> {
        self.slots.lock().await.insert(visitor_id.to_string(), credential.to_string());
        Ok(())
    }

    async fn clear(&self, visitor_id: &str) -> Result<(), StorageError> {
        self.slots.lock().await.remove(visitor_id);
        Ok(())
    }

    async fn clear_matching(&self, visitor_id: &str, credential: &str) -> Result<bool, StorageError> {
        let mut slots = self.slots.lock().await;
        if slots.get(visitor_id).map(String::as_str) != Some(credential) {
            return Ok(false);
        }
        slots.remove(visitor_id);
        Ok(true)
    }
}
