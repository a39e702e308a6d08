//! Password hashing helpers built around PBKDF2-HMAC-SHA256.
//! Every login path (admin, customer, the seeding CLI) goes through these two
//! functions so the salt, iteration, and key-length parameters cannot drift
//! between callers.

use hmac::Hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

use super::stored::{StoredCredential, KEY_LEN, SALT_LEN};

/// PBKDF2 rounds applied to every credential. Existing stored values were
/// produced with this count, so changing it invalidates them.
pub const ITERATIONS: u32 = 100_000;

const HASHER_TARGET: &str = "tealeaf::credentials";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("crypto primitives unavailable: {0}")]
    CryptoUnavailable(String),
}

fn derive_key_with_rounds(
    plaintext: &str,
    salt: &[u8],
    rounds: u32,
    out: &mut [u8; KEY_LEN],
) -> Result<(), CredentialError> {
    pbkdf2::pbkdf2::<Hmac<Sha256>>(plaintext.as_bytes(), salt, rounds, out)
        .map_err(|e| CredentialError::CryptoUnavailable(format!("{e}")))
}

/// Derives the 32-byte fingerprint of `plaintext` under `salt`. Pure function
/// of its inputs.
pub fn derive_key(plaintext: &str, salt: &[u8; SALT_LEN]) -> Result<[u8; KEY_LEN], CredentialError> {
    let mut out = [0u8; KEY_LEN];
    derive_key_with_rounds(plaintext, salt, ITERATIONS, &mut out)?;
    Ok(out)
}

/// Hashes a credential with a fresh random salt and returns the base64 stored
/// value. Empty plaintexts are hashed like any other.
pub fn hash_password(plaintext: &str) -> Result<String, CredentialError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.try_fill_bytes(&mut salt).map_err(|e| {
        tracing::error!(target: HASHER_TARGET, error = %e, "os rng unavailable");
        CredentialError::CryptoUnavailable(format!("{e}"))
    })?;

    let key = derive_key(plaintext, &salt).map_err(|e| {
        tracing::error!(target: HASHER_TARGET, error = %e, "key derivation failed");
        e
    })?;

    Ok(StoredCredential::new(salt, key).encode())
}

/// Verifies a plaintext credential against a stored value.
/// Malformed values, derivation errors, and mismatches all return `false`.
pub fn verify_password(plaintext: &str, stored: &str) -> bool {
    let Some(record) = StoredCredential::decode(stored) else {
        tracing::debug!(target: HASHER_TARGET, "stored value is malformed");
        return false;
    };

    let mut candidate = Zeroizing::new([0u8; KEY_LEN]);
    if derive_key_with_rounds(plaintext, &record.salt, ITERATIONS, &mut *candidate).is_err() {
        tracing::debug!(target: HASHER_TARGET, "key derivation failed during verify");
        return false;
    }

    record.key[..].ct_eq(&candidate[..]).into()
}

/// Runs [`hash_password`] on the blocking pool. Losing the worker task is
/// reported as `CryptoUnavailable`.
pub async fn hash_password_async(plaintext: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&plaintext))
        .await
        .map_err(|e| {
            tracing::error!(target: HASHER_TARGET, error = %e, "hashing task did not complete");
            CredentialError::CryptoUnavailable(format!("{e}"))
        })?
}

/// Runs [`verify_password`] on the blocking pool. A lost worker task counts as
/// a failed match.
pub async fn verify_password_async(plaintext: String, stored: String) -> bool {
    tokio::task::spawn_blocking(move || verify_password(&plaintext, &stored))
        .await
        .unwrap_or(false)
}
