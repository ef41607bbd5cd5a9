//! lockbox-keychain: protected key-value storage for small secrets
//!
//! Every backend honours the same contract:
//!   - `save` replaces any existing item (delete, then insert)
//!   - `load` of a missing item is `Ok(None)`, not an error
//!   - `delete` is idempotent
//!   - operations on one name are serialized; different names do not contend
//!
//! Items are always written device-only and non-synchronizable
//! (see [`ItemPolicy::DEVICE_ONLY`]).

pub mod locks;
pub mod memory;
pub mod platform;

pub use locks::NameLocks;
pub use memory::MemoryStore;
pub use platform::KeyringStore;

use lockbox_core::{ItemPolicy, KeychainError, KeychainResult, SecureBuffer};

/// Save/load/delete/exists over opaque byte blobs, keyed by name.
pub trait SecretStore: Send + Sync {
    /// Store `payload` under `name`, replacing any previous item.
    fn save(&self, name: &str, payload: &[u8]) -> KeychainResult<()>;

    /// Fetch the payload stored under `name`, or `None` if absent.
    fn load(&self, name: &str) -> KeychainResult<Option<SecureBuffer>>;

    /// Remove the item under `name`. Succeeds if nothing was stored.
    fn delete(&self, name: &str) -> KeychainResult<()>;

    /// Whether an item is stored. Storage failures read as "absent".
    fn exists(&self, name: &str) -> bool;

    /// Protection attributes applied to written items.
    fn policy(&self) -> ItemPolicy {
        ItemPolicy::DEVICE_ONLY
    }
}

pub(crate) fn validate_name(name: &str) -> KeychainResult<()> {
    if name.is_empty() {
        return Err(KeychainError::InvalidName);
    }
    Ok(())
}
