//! Key lifecycle: lazy load-or-generate, and destructive reset.
//!
//! ```text
//!   Uninitialized ──current_key()──▶ Ready(key)
//!         ▲                            │
//!         └──── reset() (Rotating) ◀───┘ ──▶ Ready(new key)
//! ```
//!
//! The state sits behind an `RwLock`. Callers that find `Ready` clone the
//! `Arc` under the read lock and work on that snapshot, so an operation that
//! started on one key finishes on it even if a reset lands meanwhile.
//! Initialization and reset run under the write lock, which makes first use
//! single-flight: late arrivals re-check the state and find the key the
//! winner installed.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lockbox_core::{EncryptionError, VaultResult, ENCRYPTION_KEY_NAME};
use lockbox_keychain::SecretStore;

use crate::key::VaultKey;
use crate::KEY_SIZE;

/// Externally visible key state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// No key in memory yet; the next use loads or generates one.
    Uninitialized,
    Ready,
}

enum KeyState {
    Uninitialized,
    Ready(Arc<VaultKey>),
}

/// Sole owner of the live vault key.
pub struct KeyManager<S: SecretStore + ?Sized = dyn SecretStore> {
    store: Arc<S>,
    state: RwLock<KeyState>,
}

impl<S: SecretStore + ?Sized> KeyManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            state: RwLock::new(KeyState::Uninitialized),
        }
    }

    /// The store the key is persisted in.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Report the in-memory state without touching storage.
    pub fn status(&self) -> KeyStatus {
        match &*self.read_state() {
            KeyState::Uninitialized => KeyStatus::Uninitialized,
            KeyState::Ready(_) => KeyStatus::Ready,
        }
    }

    /// Return the current key, loading or generating it on first use.
    pub fn current_key(&self) -> VaultResult<Arc<VaultKey>> {
        if let KeyState::Ready(key) = &*self.read_state() {
            return Ok(Arc::clone(key));
        }

        let mut state = self.write_state();
        if let KeyState::Ready(key) = &*state {
            return Ok(Arc::clone(key));
        }

        let key = Arc::new(self.load_or_create()?);
        *state = KeyState::Ready(Arc::clone(&key));
        Ok(key)
    }

    /// Destroy the stored key and replace it with a fresh one.
    ///
    /// Everything sealed under the previous key becomes permanently
    /// unreadable. Re-encrypt anything worth keeping before calling this.
    pub fn reset(&self) -> VaultResult<()> {
        let mut state = self.write_state();
        // the old key is wiped before storage is touched; a failure below
        // leaves the manager Uninitialized
        *state = KeyState::Uninitialized;

        tracing::warn!(
            key = ENCRYPTION_KEY_NAME,
            "resetting encryption key: data sealed under the previous key becomes unreadable"
        );

        self.store.delete(ENCRYPTION_KEY_NAME)?;
        let key = self.create_and_persist()?;
        *state = KeyState::Ready(Arc::new(key));

        tracing::info!(key = ENCRYPTION_KEY_NAME, "encryption key rotated");
        Ok(())
    }

    fn load_or_create(&self) -> VaultResult<VaultKey> {
        let stored = self
            .store
            .load(ENCRYPTION_KEY_NAME)
            .map_err(|e| EncryptionError::KeyNotAvailable(e.to_string()))?;

        match stored {
            Some(stored) => {
                let key = VaultKey::from_stored(&stored).ok_or_else(|| {
                    EncryptionError::KeyNotAvailable(format!(
                        "stored key has wrong size: {} bytes (expected {KEY_SIZE})",
                        stored.len()
                    ))
                })?;
                tracing::info!(key = ENCRYPTION_KEY_NAME, "loaded encryption key from keychain");
                Ok(key)
            }
            None => self.create_and_persist(),
        }
    }

    fn create_and_persist(&self) -> VaultResult<VaultKey> {
        let key = VaultKey::generate().map_err(|e| {
            EncryptionError::KeyNotAvailable(format!("key generation failed: {e}"))
        })?;
        self.store
            .save(ENCRYPTION_KEY_NAME, key.as_bytes())
            .map_err(|e| EncryptionError::KeyNotAvailable(e.to_string()))?;
        tracing::info!(key = ENCRYPTION_KEY_NAME, "generated and stored new encryption key");
        Ok(key)
    }

    // State is only ever replaced whole, so a poisoned lock still holds a
    // valid value.
    fn read_state(&self) -> RwLockReadGuard<'_, KeyState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, KeyState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: SecretStore + ?Sized> std::fmt::Debug for KeyManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockbox_core::{KeychainError, KeychainResult, SecureBuffer};
    use lockbox_keychain::MemoryStore;

    /// Store whose every operation fails, as a locked or missing keychain would.
    struct BrokenStore;

    impl SecretStore for BrokenStore {
        fn save(&self, name: &str, _payload: &[u8]) -> KeychainResult<()> {
            Err(KeychainError::SaveFailed {
                name: name.into(),
                status: "interaction not allowed".into(),
            })
        }

        fn load(&self, name: &str) -> KeychainResult<Option<SecureBuffer>> {
            Err(KeychainError::LoadFailed {
                name: name.into(),
                status: "interaction not allowed".into(),
            })
        }

        fn delete(&self, name: &str) -> KeychainResult<()> {
            Err(KeychainError::DeleteFailed {
                name: name.into(),
                status: "interaction not allowed".into(),
            })
        }

        fn exists(&self, _name: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_first_use_generates_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let manager = KeyManager::new(Arc::clone(&store));
        assert_eq!(manager.status(), KeyStatus::Uninitialized);

        let key = manager.current_key().unwrap();
        assert_eq!(manager.status(), KeyStatus::Ready);

        let stored = store.load(ENCRYPTION_KEY_NAME).unwrap().unwrap();
        assert_eq!(stored.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_existing_key_is_loaded() {
        let store = Arc::new(MemoryStore::new());
        store.save(ENCRYPTION_KEY_NAME, &[0x5Au8; KEY_SIZE]).unwrap();

        let manager = KeyManager::new(store);
        let key = manager.current_key().unwrap();
        assert_eq!(key.as_bytes(), &[0x5Au8; KEY_SIZE]);
    }

    #[test]
    fn test_current_key_is_stable() {
        let manager = KeyManager::new(Arc::new(MemoryStore::new()));
        let a = manager.current_key().unwrap();
        let b = manager.current_key().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_malformed_stored_key_is_not_overwritten() {
        let store = Arc::new(MemoryStore::new());
        store.save(ENCRYPTION_KEY_NAME, &[1u8; 16]).unwrap();

        let manager = KeyManager::new(Arc::clone(&store));
        let err = manager.current_key().unwrap_err();
        assert!(matches!(err, EncryptionError::KeyNotAvailable(_)));
        assert_eq!(manager.status(), KeyStatus::Uninitialized);

        let stored = store.load(ENCRYPTION_KEY_NAME).unwrap().unwrap();
        assert_eq!(stored.len(), 16);
    }

    #[test]
    fn test_broken_store_yields_key_not_available() {
        let manager = KeyManager::new(Arc::new(BrokenStore));
        let err = manager.current_key().unwrap_err();
        assert!(matches!(err, EncryptionError::KeyNotAvailable(_)));
        assert_eq!(manager.status(), KeyStatus::Uninitialized);
    }

    #[test]
    fn test_reset_replaces_key() {
        let store = Arc::new(MemoryStore::new());
        let manager = KeyManager::new(Arc::clone(&store));
        let before = manager.current_key().unwrap();

        manager.reset().unwrap();
        let after = manager.current_key().unwrap();

        assert_ne!(before.as_bytes(), after.as_bytes());
        let stored = store.load(ENCRYPTION_KEY_NAME).unwrap().unwrap();
        assert_eq!(stored.as_bytes(), after.as_bytes());
    }

    #[test]
    fn test_reset_before_first_use() {
        let manager = KeyManager::new(Arc::new(MemoryStore::new()));
        manager.reset().unwrap();
        assert_eq!(manager.status(), KeyStatus::Ready);
    }

    #[test]
    fn test_failed_reset_leaves_uninitialized() {
        let manager = KeyManager::new(Arc::new(BrokenStore));
        let err = manager.reset().unwrap_err();
        assert!(matches!(
            err,
            EncryptionError::Keychain(KeychainError::DeleteFailed { .. })
        ));
        assert_eq!(manager.status(), KeyStatus::Uninitialized);
    }

    #[test]
    fn test_concurrent_first_use_is_single_flight() {
        let store = Arc::new(MemoryStore::new());
        let manager = KeyManager::new(Arc::clone(&store));

        let keys: Vec<Arc<VaultKey>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..16)
                .map(|_| s.spawn(|| manager.current_key().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let first = &keys[0];
        assert!(keys.iter().all(|k| Arc::ptr_eq(k, first)));
        let stored = store.load(ENCRYPTION_KEY_NAME).unwrap().unwrap();
        assert_eq!(stored.as_bytes(), first.as_bytes());
    }

    #[test]
    fn test_snapshot_survives_reset() {
        let manager = KeyManager::new(Arc::new(MemoryStore::new()));
        let held = manager.current_key().unwrap();
        let held_bytes = *held.as_bytes();

        manager.reset().unwrap();
        assert_eq!(held.as_bytes(), &held_bytes);
    }
}
