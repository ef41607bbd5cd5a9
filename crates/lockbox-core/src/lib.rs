pub mod buffer;
pub mod config;
pub mod error;
pub mod types;

pub use buffer::SecureBuffer;
pub use error::{EncryptionError, KeychainError, KeychainResult, VaultResult};
pub use types::{Accessibility, ItemPolicy};

/// Keychain item name holding the raw vault key bytes
pub const ENCRYPTION_KEY_NAME: &str = "encryption_key";
