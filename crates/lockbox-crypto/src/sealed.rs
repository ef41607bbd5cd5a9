//! AES-256-GCM sealing in the combined `nonce || ciphertext || tag` form.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use lockbox_core::{EncryptionError, SecureBuffer, VaultResult};
use rand::RngCore;

use crate::key::VaultKey;
use crate::{NONCE_SIZE, TAG_SIZE};

/// A borrowed view over a combined sealed blob.
#[derive(Debug, Clone, Copy)]
pub struct SealedBlob<'a> {
    nonce: &'a [u8],
    /// ciphertext followed by the tag, as the AEAD expects it
    body: &'a [u8],
}

impl<'a> SealedBlob<'a> {
    /// Split a combined blob. Fails with `InvalidData` if it cannot hold a
    /// nonce and a tag.
    pub fn parse(bytes: &'a [u8]) -> VaultResult<Self> {
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(EncryptionError::InvalidData(format!(
                "sealed blob too short: {} bytes (minimum {})",
                bytes.len(),
                NONCE_SIZE + TAG_SIZE
            )));
        }
        let (nonce, body) = bytes.split_at(NONCE_SIZE);
        Ok(Self { nonce, body })
    }

    pub fn nonce(&self) -> &'a [u8] {
        self.nonce
    }

    pub fn ciphertext(&self) -> &'a [u8] {
        &self.body[..self.body.len() - TAG_SIZE]
    }

    pub fn tag(&self) -> &'a [u8] {
        &self.body[self.body.len() - TAG_SIZE..]
    }

    /// Authenticate and decrypt under `key`.
    ///
    /// Any verification failure is `DecryptionFailed`; no plaintext is
    /// produced unless the tag checks out.
    pub fn open(&self, key: &VaultKey) -> VaultResult<SecureBuffer> {
        let cipher = Aes256Gcm::new(key.as_bytes().into());
        cipher
            .decrypt(Nonce::from_slice(self.nonce), self.body)
            .map(SecureBuffer::new)
            .map_err(|_| EncryptionError::DecryptionFailed)
    }
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
///
/// Returns `[12-byte nonce][ciphertext][16-byte tag]`.
pub fn seal(key: &VaultKey, plaintext: &[u8]) -> VaultResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng()
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}
