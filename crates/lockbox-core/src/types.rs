use serde::{Deserialize, Serialize};

use crate::buffer::SecureBuffer;

/// When a stored item may be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    /// Readable only while the device is unlocked; never migrates to
    /// another device through backup or restore.
    WhenUnlockedThisDeviceOnly,
}

/// Protection attributes applied to every item the vault writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPolicy {
    pub accessibility: Accessibility,
    pub synchronizable: bool,
}

impl ItemPolicy {
    /// Unlock-gated, device-bound, never synchronized.
    pub const DEVICE_ONLY: Self = Self {
        accessibility: Accessibility::WhenUnlockedThisDeviceOnly,
        synchronizable: false,
    };
}

impl Default for ItemPolicy {
    fn default() -> Self {
        Self::DEVICE_ONLY
    }
}

/// A named secret as held by a store backend
#[derive(Debug)]
pub struct StoredItem {
    pub name: String,
    pub payload: SecureBuffer,
    pub policy: ItemPolicy,
}

impl StoredItem {
    pub fn new(name: impl Into<String>, payload: SecureBuffer) -> Self {
        Self {
            name: name.into(),
            payload,
            policy: ItemPolicy::DEVICE_ONLY,
        }
    }
}
