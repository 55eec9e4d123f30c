use serde::{Deserialize, Serialize};

use crate::error::CredentialError;
use crate::hasher::{PasswordDigest, PasswordHasher, Salt};

/// Salt and digest persisted for one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub salt: Salt,
    pub digest: PasswordDigest,
}

/// Authentication service boundary used by the session manager.
pub trait CredentialHasher: Send + Sync {
    /// Derive fresh credentials for a new account.
    fn issue(&self, password: &str) -> Result<Credentials, CredentialError>;

    /// Check a login attempt against stored credentials.
    fn verify(&self, password: &str, credentials: &Credentials) -> bool;
}

/// [`CredentialHasher`] backed by [`PasswordHasher`].
pub struct Blake3CredentialHasher {
    hasher: PasswordHasher,
}

impl Blake3CredentialHasher {
    pub fn new(rounds: u32) -> Result<Self, CredentialError> {
        Ok(Self {
            hasher: PasswordHasher::ACCOUNT.with_rounds(rounds)?,
        })
    }
}

impl Default for Blake3CredentialHasher {
    fn default() -> Self {
        Self {
            hasher: PasswordHasher::ACCOUNT,
        }
    }
}

impl CredentialHasher for Blake3CredentialHasher {
    fn issue(&self, password: &str) -> Result<Credentials, CredentialError> {
        if password.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }
        let salt = Salt::generate();
        let digest = self.hasher.hash(password, &salt);
        Ok(Credentials { salt, digest })
    }

    fn verify(&self, password: &str, credentials: &Credentials) -> bool {
        self.hasher
            .verify(password, &credentials.salt, &credentials.digest)
    }
}
