//! Zeroizing byte container for transient plaintext.
//!
//! A `SecureBuffer` owns its bytes outright (no `Clone`) and wipes the whole
//! allocation, spare capacity included, when dropped. The wipe goes through
//! `zeroize`, which uses volatile writes plus a compiler fence so the store
//! cannot be optimized away.

use std::str::Utf8Error;

use zeroize::{Zeroize, Zeroizing};

pub struct SecureBuffer {
    bytes: Vec<u8>,
}

impl SecureBuffer {
    /// Take ownership of `bytes` without copying.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Copy `bytes` into a fresh buffer.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Borrow the contents as UTF-8.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Move the contents into a zeroizing `String`.
    ///
    /// On malformed UTF-8 the bytes are wiped before the error is returned.
    pub fn into_string(mut self) -> Result<Zeroizing<String>, Utf8Error> {
        let bytes = std::mem::take(&mut self.bytes);
        match String::from_utf8(bytes) {
            Ok(s) => Ok(Zeroizing::new(s)),
            Err(e) => {
                let err = e.utf8_error();
                let mut rejected = e.into_bytes();
                rejected.zeroize();
                Err(err)
            }
        }
    }

    /// Wipe and free the buffer now rather than at scope exit.
    pub fn release(self) {
        drop(self);
    }
}

impl Zeroize for SecureBuffer {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
    }
}

impl Drop for SecureBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl From<Vec<u8>> for SecureBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<String> for SecureBuffer {
    fn from(s: String) -> Self {
        Self::new(s.into_bytes())
    }
}

impl From<&str> for SecureBuffer {
    fn from(s: &str) -> Self {
        Self::from_slice(s.as_bytes())
    }
}

impl AsRef<[u8]> for SecureBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SecureBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureBuffer")
            .field("len", &self.bytes.len())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
