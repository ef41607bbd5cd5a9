//! lockbox-crypto: device-bound authenticated encryption
//!
//! One 256-bit key per installation, kept in the platform keychain under
//! `"encryption_key"` and loaded (or generated) on first use.
//!
//! Sealed blob format (binary):
//! ```text
//! [12 bytes: random nonce][N bytes: AES-256-GCM ciphertext][16 bytes: GCM tag]
//! ```
//!
//! Hashing (`hash`) is independent of the key: plain SHA-256 for
//! content-addressing non-secret identifiers.

pub mod hash;
pub mod key;
pub mod manager;
pub mod sealed;
pub mod vault;

pub use hash::{digest, hash, hash_str, Digest};
pub use key::VaultKey;
pub use manager::{KeyManager, KeyStatus};
pub use sealed::SealedBlob;
pub use vault::Vault;

/// Size of the vault key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;
