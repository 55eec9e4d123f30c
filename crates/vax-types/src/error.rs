use thiserror::Error;

/// Errors produced when parsing or validating scheduler types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid username {0:?}: must be non-empty and contain no whitespace")]
    InvalidUsername(String),

    #[error("invalid vaccine name {0:?}: must be non-empty and contain no whitespace")]
    InvalidVaccineName(String),

    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid appointment id {0:?}")]
    InvalidAppointmentId(String),
}
