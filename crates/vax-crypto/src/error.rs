/// Errors from credential operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("password must not be empty")]
    EmptyPassword,

    #[error("hash rounds must be at least 1")]
    ZeroRounds,
}
