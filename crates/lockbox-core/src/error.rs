use thiserror::Error;

pub type KeychainResult<T> = Result<T, KeychainError>;

pub type VaultResult<T> = Result<T, EncryptionError>;

/// Protected key-value store failures.
///
/// `status` carries the backend's own diagnostic (platform error text or
/// status code). A missing item is never an error for `load`, `exists` or
/// `delete`.
#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("keychain save failed for '{name}': {status}")]
    SaveFailed { name: String, status: String },

    #[error("keychain load failed for '{name}': {status}")]
    LoadFailed { name: String, status: String },

    #[error("keychain delete failed for '{name}': {status}")]
    DeleteFailed { name: String, status: String },

    #[error("keychain item '{name}' holds malformed data")]
    InvalidData { name: String },

    #[error("keychain item name must not be empty")]
    InvalidName,
}

/// Vault (key manager + encryption engine) failures.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("encryption key not available: {0}")]
    KeyNotAvailable(String),

    #[error("encryption failed")]
    EncryptionFailed,

    /// Wrong key, tampered data and truncated ciphertext all map here with
    /// the same message.
    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Keychain(#[from] KeychainError),
}
