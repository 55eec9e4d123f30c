use vax_store::StoreError;
use vax_types::{AppointmentId, SlotDate, Username, VaccineName};

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("vaccine not found: {0}")]
    VaccineNotFound(VaccineName),

    #[error("insufficient doses of {vaccine}: {available} available, {requested} requested")]
    InsufficientDoses {
        vaccine: VaccineName,
        available: u64,
        requested: u64,
    },

    #[error("dose count must be positive")]
    InvalidDoseCount,

    #[error("dose count overflow for {0}")]
    DoseOverflow(VaccineName),

    #[error("{provider} already has an appointment on {date}")]
    SlotExists { provider: Username, date: SlotDate },

    #[error("no open slot for {provider} on {date}")]
    NoSuchSlot { provider: Username, date: SlotDate },

    #[error("appointment not found: {0}")]
    AppointmentNotFound(AppointmentId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
