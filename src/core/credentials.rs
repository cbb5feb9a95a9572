//! One-way password hashing
//!
//! User records only ever hold the output of [`CredentialHasher::hash`].

use crate::core::error::{StoreError, StoreResult};
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

/// Salted one-way hashing of cleartext passwords
pub trait CredentialHasher: Send + Sync {
    /// Hash `cleartext` with a fresh random salt
    fn hash(&self, cleartext: &str) -> StoreResult<String>;

    /// `true` if `cleartext` hashes to `hash`
    fn verify(&self, cleartext: &str, hash: &str) -> bool;
}

/// Argon2id hasher producing PHC strings (`$argon2id$...`)
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, cleartext: &str) -> StoreResult<String> {
        let salt_bytes: [u8; 16] = rand::random();
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| StoreError::Hashing(e.to_string()))?;

        self.argon2
            .hash_password(cleartext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::Hashing(e.to_string()))
    }

    fn verify(&self, cleartext: &str, hash: &str) -> bool {
        PasswordHash::new(hash)
            .map(|parsed| {
                self.argon2
                    .verify_password(cleartext.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}
