use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// Length of a password salt in bytes.
pub const SALT_LEN: usize = 16;

/// Random per-account salt.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Draw a fresh salt from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({}..)", &self.to_hex()[..8])
    }
}

/// Stored password digest.
///
/// Equality is constant-time (delegates to `blake3::Hash`).
#[derive(Clone, Copy, Serialize, Deserialize)]
pub struct PasswordDigest([u8; 32]);

impl PasswordDigest {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl PartialEq for PasswordDigest {
    fn eq(&self, other: &Self) -> bool {
        blake3::Hash::from(self.0) == blake3::Hash::from(other.0)
    }
}

impl Eq for PasswordDigest {}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// Domain-separated, iterated BLAKE3 password hasher.
///
/// The first round hashes `domain ":" salt password`; every further round
/// hashes `domain ":" previous salt`. The domain tag keeps these digests
/// disjoint from any other BLAKE3 use in the process.
pub struct PasswordHasher {
    domain: &'static str,
    rounds: u32,
}

impl PasswordHasher {
    /// Default number of stretching rounds.
    pub const DEFAULT_ROUNDS: u32 = 10_000;

    /// Hasher for account passwords.
    pub const ACCOUNT: Self = Self {
        domain: "vax-password-v1",
        rounds: Self::DEFAULT_ROUNDS,
    };

    pub fn new(domain: &'static str, rounds: u32) -> Result<Self, CredentialError> {
        if rounds == 0 {
            return Err(CredentialError::ZeroRounds);
        }
        Ok(Self { domain, rounds })
    }

    /// Same domain, different round count.
    pub fn with_rounds(&self, rounds: u32) -> Result<Self, CredentialError> {
        Self::new(self.domain, rounds)
    }

    pub fn hash(&self, password: &str, salt: &Salt) -> PasswordDigest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(salt.as_bytes());
        hasher.update(password.as_bytes());
        let mut digest = *hasher.finalize().as_bytes();

        for _ in 1..self.rounds {
            let mut hasher = blake3::Hasher::new();
            hasher.update(self.domain.as_bytes());
            hasher.update(b":");
            hasher.update(&digest);
            hasher.update(salt.as_bytes());
            digest = *hasher.finalize().as_bytes();
        }
        PasswordDigest(digest)
    }

    pub fn verify(&self, password: &str, salt: &Salt, expected: &PasswordDigest) -> bool {
        self.hash(password, salt) == *expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> PasswordHasher {
        PasswordHasher::ACCOUNT.with_rounds(4).unwrap()
    }

    #[test]
    fn hash_is_deterministic() {
        let salt = Salt::from_bytes([7u8; SALT_LEN]);
        assert_eq!(fast().hash("secret", &salt), fast().hash("secret", &salt));
    }

    #[test]
    fn salt_changes_digest() {
        let a = Salt::from_bytes([1u8; SALT_LEN]);
        let b = Salt::from_bytes([2u8; SALT_LEN]);
        assert_ne!(fast().hash("secret", &a), fast().hash("secret", &b));
    }

    #[test]
    fn rounds_change_digest() {
        let salt = Salt::from_bytes([3u8; SALT_LEN]);
        let one = PasswordHasher::ACCOUNT.with_rounds(1).unwrap();
        assert_ne!(one.hash("secret", &salt), fast().hash("secret", &salt));
    }

    #[test]
    fn domain_separation() {
        let salt = Salt::from_bytes([3u8; SALT_LEN]);
        let other = PasswordHasher::new("other-v1", 4).unwrap();
        assert_ne!(other.hash("secret", &salt), fast().hash("secret", &salt));
    }

    #[test]
    fn verify_matches_only_correct_password() {
        let salt = Salt::generate();
        let digest = fast().hash("hunter2", &salt);
        assert!(fast().verify("hunter2", &salt, &digest));
        assert!(!fast().verify("Hunter2", &salt, &digest));
    }

    #[test]
    fn zero_rounds_rejected() {
        assert_eq!(
            PasswordHasher::new("x", 0).err(),
            Some(CredentialError::ZeroRounds)
        );
    }

    #[test]
    fn debug_redacts_digest() {
        let digest = fast().hash("pw", &Salt::from_bytes([0u8; SALT_LEN]));
        assert_eq!(format!("{digest:?}"), "PasswordDigest(<redacted>)");
    }

    #[test]
    fn generated_salts_differ() {
        assert_ne!(Salt::generate(), Salt::generate());
    }
}
