//! Process-local store.
//!
//! Holds items in a map behind a single `RwLock`: loads run concurrently,
//! saves and deletes are exclusive across all names. Payloads are kept in
//! `SecureBuffer`s and wiped when replaced or removed. Nothing survives
//! process exit, which makes this the backend for tests and throwaway
//! sessions.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use lockbox_core::types::StoredItem;
use lockbox_core::{KeychainResult, SecureBuffer};

use crate::{validate_name, SecretStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, StoredItem>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SecretStore for MemoryStore {
    fn save(&self, name: &str, payload: &[u8]) -> KeychainResult<()> {
        validate_name(name)?;
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(name);
        items.insert(
            name.to_string(),
            StoredItem::new(name, SecureBuffer::from_slice(payload)),
        );
        tracing::debug!(key = name, "stored secret in memory store");
        Ok(())
    }

    fn load(&self, name: &str) -> KeychainResult<Option<SecureBuffer>> {
        validate_name(name)?;
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items
            .get(name)
            .map(|item| SecureBuffer::from_slice(item.payload.as_bytes())))
    }

    fn delete(&self, name: &str) -> KeychainResult<()> {
        validate_name(name)?;
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.remove(name).is_some() {
            tracing::debug!(key = name, "deleted secret from memory store");
        }
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        if validate_name(name).is_err() {
            return false;
        }
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
