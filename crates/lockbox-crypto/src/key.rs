//! The vault key: 256 random bits, zeroized on drop, never readable outside
//! this crate.

use lockbox_core::SecureBuffer;
use rand::RngCore;
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// Opaque handle to the device key. Callers can hold one (via
/// [`KeyManager::current_key`](crate::KeyManager::current_key)) but cannot
/// read its bytes.
pub struct VaultKey {
    bytes: [u8; KEY_SIZE],
}

impl VaultKey {
    /// Generate a fresh key from the thread-local CSPRNG.
    pub(crate) fn generate() -> Result<Self, rand::Error> {
        let mut key = Self {
            bytes: [0u8; KEY_SIZE],
        };
        rand::thread_rng().try_fill_bytes(&mut key.bytes)?;
        Ok(key)
    }

    /// Rebuild a key from its stored form. `None` unless exactly
    /// `KEY_SIZE` bytes.
    pub(crate) fn from_stored(stored: &SecureBuffer) -> Option<Self> {
        if stored.len() != KEY_SIZE {
            return None;
        }
        let mut key = Self {
            bytes: [0u8; KEY_SIZE],
        };
        key.bytes.copy_from_slice(stored.as_bytes());
        Some(key)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for VaultKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_key(fill: u8) -> VaultKey {
    VaultKey {
        bytes: [fill; KEY_SIZE],
    }
}
