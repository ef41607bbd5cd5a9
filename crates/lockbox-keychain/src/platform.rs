//! Platform keychain backend.
//!
//! Uses the `keyring` crate for cross-platform access:
//! - macOS: Keychain Services (login keychain, not iCloud-synchronized)
//! - Windows: Credential Manager (DPAPI, per-user, not roaming)
//! - Linux: Secret Service (GNOME Keyring, KWallet), stored on disk
//!
//! Items are filed under `(service, name)` and written as raw bytes. Every
//! backend above keeps items until they are deleted; a store that forgot the
//! encryption key across a reboot would silently orphan every sealed value.

use lockbox_core::{KeychainError, KeychainResult, SecureBuffer};
use zeroize::Zeroize;

use crate::{validate_name, NameLocks, SecretStore};

const AVAILABILITY_CHECK_NAME: &str = "__lockbox_availability__";

pub struct KeyringStore {
    service: String,
    locks: NameLocks,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            locks: NameLocks::new(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Check if the platform keychain answers a read.
    ///
    /// A missing item counts as reachable; a locked keychain or an absent
    /// daemon does not.
    pub fn is_available(&self) -> bool {
        let outcome =
            keyring::Entry::new(&self.service, AVAILABILITY_CHECK_NAME).and_then(|entry| entry.get_secret());
        match outcome {
            Ok(mut bytes) => {
                bytes.zeroize();
                true
            }
            Err(keyring::Error::NoEntry) => true,
            Err(keyring::Error::BadEncoding(mut bytes)) => {
                bytes.zeroize();
                true
            }
            Err(e) => {
                tracing::debug!(service = %self.service, error = %e, "platform keychain unreachable");
                false
            }
        }
    }

    fn entry(&self, name: &str) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(&self.service, name)
    }
}

impl SecretStore for KeyringStore {
    fn save(&self, name: &str, payload: &[u8]) -> KeychainResult<()> {
        validate_name(name)?;
        let save_failed = |e: keyring::Error| KeychainError::SaveFailed {
            name: name.to_string(),
            status: e.to_string(),
        };

        self.locks.with(name, || {
            let entry = self.entry(name).map_err(save_failed)?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(save_failed(e)),
            }
            entry.set_secret(payload).map_err(save_failed)?;
            tracing::debug!(key = name, service = %self.service, "stored secret in platform keychain");
            Ok(())
        })
    }

    fn load(&self, name: &str) -> KeychainResult<Option<SecureBuffer>> {
        validate_name(name)?;
        let load_failed = |e: keyring::Error| KeychainError::LoadFailed {
            name: name.to_string(),
            status: e.to_string(),
        };

        self.locks.with(name, || {
            let entry = self.entry(name).map_err(load_failed)?;
            match entry.get_secret() {
                Ok(bytes) => Ok(Some(SecureBuffer::new(bytes))),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(keyring::Error::BadEncoding(mut bytes)) => {
                    bytes.zeroize();
                    Err(KeychainError::InvalidData {
                        name: name.to_string(),
                    })
                }
                Err(e) => Err(load_failed(e)),
            }
        })
    }

    fn delete(&self, name: &str) -> KeychainResult<()> {
        validate_name(name)?;
        let delete_failed = |e: keyring::Error| KeychainError::DeleteFailed {
            name: name.to_string(),
            status: e.to_string(),
        };

        self.locks.with(name, || {
            let entry = self.entry(name).map_err(delete_failed)?;
            match entry.delete_credential() {
                Ok(()) => {
                    tracing::debug!(key = name, service = %self.service, "deleted secret from platform keychain");
                    Ok(())
                }
                Err(keyring::Error::NoEntry) => Ok(()), // already deleted
                Err(e) => Err(delete_failed(e)),
            }
        })
    }

    fn exists(&self, name: &str) -> bool {
        match self.load(name) {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::debug!(key = name, error = %e, "keychain lookup failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringStore")
            .field("service", &self.service)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyring::credential::{Credential, CredentialApi, CredentialBuilderApi};
    use lockbox_core::ItemPolicy;
    use std::collections::HashMap;
    use std::sync::{Mutex, OnceLock};

    /// Service whose credentials refuse every access, like a locked keychain.
    const LOCKED_SERVICE: &str = "lockbox-test-locked";

    type Slots = Mutex<HashMap<(String, String), Vec<u8>>>;

    fn slots() -> &'static Slots {
        static SLOTS: OnceLock<Slots> = OnceLock::new();
        SLOTS.get_or_init(Default::default)
    }

    /// In-process keychain: every entry for the same `(service, user)` sees
    /// the same stored value, as with a real platform store.
    struct SharedBuilder;

    #[derive(Debug)]
    struct SharedCredential {
        key: (String, String),
    }

    impl SharedCredential {
        fn check_access(&self) -> keyring::Result<()> {
            if self.key.0 == LOCKED_SERVICE {
                return Err(keyring::Error::NoStorageAccess("keychain is locked".into()));
            }
            Ok(())
        }
    }

    impl CredentialApi for SharedCredential {
        fn set_secret(&self, secret: &[u8]) -> keyring::Result<()> {
            self.check_access()?;
            slots().lock().unwrap().insert(self.key.clone(), secret.to_vec());
            Ok(())
        }

        fn get_secret(&self) -> keyring::Result<Vec<u8>> {
            self.check_access()?;
            slots()
                .lock()
                .unwrap()
                .get(&self.key)
                .cloned()
                .ok_or(keyring::Error::NoEntry)
        }

        fn delete_credential(&self) -> keyring::Result<()> {
            self.check_access()?;
            slots()
                .lock()
                .unwrap()
                .remove(&self.key)
                .map(|_| ())
                .ok_or(keyring::Error::NoEntry)
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    impl CredentialBuilderApi for SharedBuilder {
        fn build(
            &self,
            _target: Option<&str>,
            service: &str,
            user: &str,
        ) -> keyring::Result<Box<Credential>> {
            Ok(Box::new(SharedCredential {
                key: (service.to_string(), user.to_string()),
            }))
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    // The default builder is process-global, so every test installs the same
    // one and keeps to its own service name.
    fn shared_store(service: &str) -> KeyringStore {
        keyring::set_default_credential_builder(Box::new(SharedBuilder));
        KeyringStore::new(service)
    }

    #[test]
    fn load_missing_is_none() {
        let store = shared_store("lockbox-test-load-missing");
        assert!(store.load("plaid_access_token_item-1").unwrap().is_none());
    }

    #[test]
    fn saved_item_loads_back() {
        let store = shared_store("lockbox-test-roundtrip");
        store.save("encryption_key", &[7u8; 32]).unwrap();

        let loaded = store.load("encryption_key").unwrap().unwrap();
        assert_eq!(loaded.as_bytes(), &[7u8; 32]);
    }

    #[test]
    fn save_replaces_existing_item() {
        let store = shared_store("lockbox-test-overwrite");
        store
            .save("plaid_access_token_item-2", b"access-sandbox-old")
            .unwrap();
        store
            .save("plaid_access_token_item-2", b"access-sandbox-new")
            .unwrap();

        let loaded = store.load("plaid_access_token_item-2").unwrap().unwrap();
        assert_eq!(loaded.as_str().unwrap(), "access-sandbox-new");
    }

    #[test]
    fn delete_existing_then_again() {
        let store = shared_store("lockbox-test-delete");
        store.save("encryption_key", &[1u8; 32]).unwrap();

        store.delete("encryption_key").unwrap();
        assert!(store.load("encryption_key").unwrap().is_none());
        store.delete("encryption_key").unwrap();
    }

    #[test]
    fn exists_tracks_save_and_delete() {
        let store = shared_store("lockbox-test-exists");
        assert!(!store.exists("plaid_access_token_item-3"));

        store.save("plaid_access_token_item-3", b"token").unwrap();
        assert!(store.exists("plaid_access_token_item-3"));

        store.delete("plaid_access_token_item-3").unwrap();
        assert!(!store.exists("plaid_access_token_item-3"));
    }

    #[test]
    fn services_do_not_share_items() {
        let a = shared_store("lockbox-test-service-a");
        let b = shared_store("lockbox-test-service-b");
        a.save("encryption_key", &[9u8; 32]).unwrap();

        assert!(b.load("encryption_key").unwrap().is_none());
    }

    #[test]
    fn non_utf8_secret_loads_as_bytes() {
        let store = shared_store("lockbox-test-binary");
        let key = [0xFFu8, 0x00, 0xC3, 0x28];
        store.save("encryption_key", &key).unwrap();

        assert_eq!(store.load("encryption_key").unwrap().unwrap().as_bytes(), &key);
    }

    #[test]
    fn locked_keychain_maps_to_store_errors() {
        let store = shared_store(LOCKED_SERVICE);

        assert!(matches!(
            store.save("encryption_key", &[0u8; 32]),
            Err(KeychainError::SaveFailed { .. })
        ));
        assert!(matches!(
            store.load("encryption_key"),
            Err(KeychainError::LoadFailed { .. })
        ));
        assert!(matches!(
            store.delete("encryption_key"),
            Err(KeychainError::DeleteFailed { .. })
        ));
        assert!(!store.exists("encryption_key"));
    }

    #[test]
    fn empty_name_rejected() {
        let store = shared_store("lockbox-test-empty-name");
        assert!(matches!(store.save("", b"x"), Err(KeychainError::InvalidName)));
        assert!(matches!(store.load(""), Err(KeychainError::InvalidName)));
        assert!(matches!(store.delete(""), Err(KeychainError::InvalidName)));
        assert!(!store.exists(""));
    }

    #[test]
    fn reachable_keychain_is_available() {
        let store = shared_store("lockbox-test-available");
        assert!(store.is_available());
    }

    #[test]
    fn locked_keychain_is_unavailable() {
        let store = shared_store(LOCKED_SERVICE);
        assert!(!store.is_available());
    }

    #[test]
    fn policy_is_device_only() {
        let store = shared_store("lockbox-test-policy");
        assert_eq!(store.policy(), ItemPolicy::DEVICE_ONLY);
        assert_eq!(store.service(), "lockbox-test-policy");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_default_store_outlives_reboot() {
        let builder = keyring::default::default_credential_builder();
        assert!(matches!(
            builder.persistence(),
            keyring::credential::CredentialPersistence::UntilDelete
        ));
    }
}
