//! Encryption engine: seal and open caller payloads with the device key.
//!
//! `Vault` holds no plaintext between calls. Share one instance per process
//! by handing an `Arc<Vault>` to whoever needs it.

use std::sync::Arc;

use lockbox_core::{EncryptionError, SecureBuffer, VaultResult};
use lockbox_keychain::SecretStore;
use zeroize::Zeroizing;

use crate::manager::{KeyManager, KeyStatus};
use crate::sealed::{self, SealedBlob};

pub struct Vault<S: SecretStore + ?Sized = dyn SecretStore> {
    keys: KeyManager<S>,
}

impl<S: SecretStore + ?Sized> Vault<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            keys: KeyManager::new(store),
        }
    }

    pub fn key_manager(&self) -> &KeyManager<S> {
        &self.keys
    }

    pub fn status(&self) -> KeyStatus {
        self.keys.status()
    }

    /// Seal `plaintext`, returning `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &[u8]) -> VaultResult<Vec<u8>> {
        let key = self.keys.current_key()?;
        sealed::seal(&key, plaintext)
    }

    /// Open a blob produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, blob: &[u8]) -> VaultResult<SecureBuffer> {
        let sealed = SealedBlob::parse(blob)?;
        let key = self.keys.current_key()?;
        sealed.open(&key)
    }

    pub fn encrypt_string(&self, plaintext: &str) -> VaultResult<Vec<u8>> {
        self.encrypt(plaintext.as_bytes())
    }

    /// Open a blob and decode it as UTF-8.
    pub fn decrypt_string(&self, blob: &[u8]) -> VaultResult<Zeroizing<String>> {
        self.decrypt(blob)?.into_string().map_err(|e| {
            EncryptionError::InvalidData(format!("decrypted payload is not UTF-8: {e}"))
        })
    }

    /// Replace the device key. Destructive: see [`KeyManager::reset`].
    pub fn reset_key(&self) -> VaultResult<()> {
        self.keys.reset()
    }
}

impl<S: SecretStore + ?Sized> std::fmt::Debug for Vault<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").field("keys", &self.keys).finish()
    }
}
