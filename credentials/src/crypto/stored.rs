//! Typed view of a persisted credential hash.
//! The on-disk form is `base64(salt || derived_key)` with the standard
//! alphabet; the byte layout must stay bit-exact so hashes written by the old
//! storefront keep verifying.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};

/// Salt bytes at the front of every stored value.
pub const SALT_LEN: usize = 16;
/// PBKDF2 output bytes following the salt.
pub const KEY_LEN: usize = 32;
/// Decoded length of every well-formed stored value.
pub const STORED_LEN: usize = SALT_LEN + KEY_LEN;

/// A decoded credential hash record.
#[derive(Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub salt: [u8; SALT_LEN],
    pub key: [u8; KEY_LEN],
}

impl StoredCredential {
    pub fn new(salt: [u8; SALT_LEN], key: [u8; KEY_LEN]) -> Self {
        Self { salt, key }
    }

    /// Parses a stored value. Returns `None` for invalid base64 or any decoded
    /// length other than [`STORED_LEN`]; callers treat both as a failed match.
    pub fn decode(stored: &str) -> Option<Self> {
        let bytes = STANDARD.decode(stored.as_bytes()).ok()?;
        if bytes.len() != STORED_LEN {
            return None;
        }

        let mut salt = [0u8; SALT_LEN];
        let mut key = [0u8; KEY_LEN];
        salt.copy_from_slice(&bytes[..SALT_LEN]);
        key.copy_from_slice(&bytes[SALT_LEN..]);
        Some(Self { salt, key })
    }

    /// Encodes the record back into its persisted text form.
    pub fn encode(&self) -> String {
        let mut buf = [0u8; STORED_LEN];
        buf[..SALT_LEN].copy_from_slice(&self.salt);
        buf[SALT_LEN..].copy_from_slice(&self.key);
        STANDARD.encode(buf)
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("salt", &STANDARD.encode(self.salt))
            .field("key", &"<redacted>")
            .finish()
    }
}
