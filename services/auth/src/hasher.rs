//! One-way salted password hashing
//!
//! Digests are Argon2id PHC strings, so the salt and cost parameters travel
//! inside the stored value.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};

use crate::error::{AuthError, AuthResult};

/// Hashes and verifies passwords
#[derive(Clone)]
pub struct Hasher {
    argon2: Argon2<'static>,
    /// Digest of a throwaway password, checked when the user does not exist
    dummy_digest: String,
}

impl Hasher {
    /// Hasher with the Argon2 default cost
    pub fn new() -> AuthResult<Self> {
        Self::with_argon2(Argon2::default())
    }

    /// Hasher with explicit Argon2id cost parameters
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> AuthResult<Self> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Self::with_argon2(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    fn with_argon2(argon2: Argon2<'static>) -> AuthResult<Self> {
        let mut hasher = Self {
            argon2,
            dummy_digest: String::new(),
        };
        hasher.dummy_digest = hasher.hash("dummy-password-never-matches")?;
        Ok(hasher)
    }

    /// Hash a plaintext password with a freshly generated salt
    pub fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let digest = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .to_string();

        Ok(digest)
    }

    /// Check a plaintext password against a stored digest
    ///
    /// A digest that cannot be parsed never verifies.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Spend the same work as [`Hasher::verify`] without a real digest
    pub fn verify_dummy(&self, plaintext: &str) {
        let _ = self.verify(plaintext, &self.dummy_digest);
    }
}
