use thiserror::Error;
use vax_crypto::CredentialError;
use vax_ledger::LedgerError;
use vax_store::StoreError;
use vax_types::{AppointmentId, Role, SlotDate, TypeError, Username, VaccineName};

/// Failures reported by scheduler operations.
///
/// Every variant is raised before the operation's transaction commits, so a
/// failed call never leaves a partial change behind.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("a user is already logged in")]
    AlreadyLoggedIn,

    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("there is no active session to log out of")]
    NoActiveSession,

    #[error("operation requires a {required} session")]
    WrongRole { required: Role },

    #[error("{role} username already taken: {username}")]
    UsernameTaken { role: Role, username: Username },

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no provider is available on {date}")]
    NoAvailability { date: SlotDate },

    #[error("not enough available doses of {vaccine}")]
    InsufficientDoses { vaccine: VaccineName },

    #[error("no open slot for {provider} on {date}")]
    NoSuchSlot { provider: Username, date: SlotDate },

    #[error("{provider} already has an appointment on {date}")]
    SlotExists { provider: Username, date: SlotDate },

    #[error("appointment not found: {0}")]
    NotFound(AppointmentId),

    #[error("not a party to appointment {0}")]
    NotAuthorized(AppointmentId),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

impl From<LedgerError> for SchedulerError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::VaccineNotFound(vaccine)
            | LedgerError::InsufficientDoses { vaccine, .. } => Self::InsufficientDoses { vaccine },
            LedgerError::InvalidDoseCount => {
                Self::InvalidInput("dose count must be a positive integer".into())
            }
            LedgerError::DoseOverflow(vaccine) => {
                Self::InvalidInput(format!("dose count for {vaccine} would overflow"))
            }
            LedgerError::SlotExists { provider, date } => Self::SlotExists { provider, date },
            LedgerError::NoSuchSlot { provider, date } => Self::NoSuchSlot { provider, date },
            LedgerError::AppointmentNotFound(id) => Self::NotFound(id),
            LedgerError::Store(e) => Self::StoreUnavailable(e),
        }
    }
}

impl From<TypeError> for SchedulerError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidDate(raw) => Self::InvalidDate(raw),
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

impl From<CredentialError> for SchedulerError {
    fn from(err: CredentialError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_to_taxonomy() {
        let id = AppointmentId::new(3);
        assert!(matches!(
            SchedulerError::from(LedgerError::AppointmentNotFound(id)),
            SchedulerError::NotFound(found) if found == id
        ));
        assert!(matches!(
            SchedulerError::from(LedgerError::InvalidDoseCount),
            SchedulerError::InvalidInput(_)
        ));
        assert!(matches!(
            SchedulerError::from(LedgerError::Store(StoreError::ReadOnly)),
            SchedulerError::StoreUnavailable(StoreError::ReadOnly)
        ));
    }

    #[test]
    fn type_errors_split_dates_from_other_input() {
        assert!(matches!(
            SchedulerError::from(TypeError::InvalidDate("x".into())),
            SchedulerError::InvalidDate(_)
        ));
        assert!(matches!(
            SchedulerError::from(TypeError::InvalidUsername("".into())),
            SchedulerError::InvalidInput(_)
        ));
    }
}
