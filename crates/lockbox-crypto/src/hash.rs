//! SHA-256 identifiers for non-secret values.
//!
//! Deterministic and unsalted: use for deduplication keys and content
//! addressing. Never for password verification.

use lockbox_core::{EncryptionError, VaultResult};
use sha2::{Digest as _, Sha256};

/// Size of a digest in bytes (256-bit)
pub const DIGEST_SIZE: usize = 32;

/// A SHA-256 digest, displayed as 64 lowercase hex chars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Parse a 64-char hex string (either case).
    pub fn from_hex(hex: &str) -> VaultResult<Self> {
        if hex.len() != DIGEST_SIZE * 2 {
            return Err(EncryptionError::InvalidData(format!(
                "digest hex must be {} chars, got {}",
                DIGEST_SIZE * 2,
                hex.len()
            )));
        }
        // from_str_radix alone would let a sign through ("+f")
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EncryptionError::InvalidData(
                "digest hex contains a non-hex character".into(),
            ));
        }
        let mut out = [0u8; DIGEST_SIZE];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|e| EncryptionError::InvalidData(format!("invalid digest hex: {e}")))?;
        }
        Ok(Self(out))
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Digest a byte slice.
pub fn digest(data: &[u8]) -> Digest {
    let mut out = [0u8; DIGEST_SIZE];
    out.copy_from_slice(&Sha256::digest(data));
    Digest(out)
}

/// Digest a byte slice and render it as lowercase hex.
pub fn hash(data: &[u8]) -> String {
    digest(data).to_hex()
}

pub fn hash_str(data: &str) -> String {
    hash(data.as_bytes())
}
