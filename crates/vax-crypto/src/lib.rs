//! Credential hashing for the vaccine scheduler.
//!
//! Passwords are never stored. Each account keeps a random [`Salt`] and the
//! [`PasswordDigest`] produced by a domain-separated, iterated BLAKE3 hash
//! of salt and password. The scheduler only talks to the
//! [`CredentialHasher`] trait, so the scheme can be swapped without touching
//! the ledgers.
//!
//! All crypto operations wrap established libraries; there are no custom primitives.

pub mod credentials;
pub mod error;
pub mod hasher;

pub use credentials::{Blake3CredentialHasher, CredentialHasher, Credentials};
pub use error::CredentialError;
pub use hasher::{PasswordDigest, PasswordHasher, Salt};
