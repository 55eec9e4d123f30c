use serde::{Deserialize, Serialize};
use vax_crypto::Credentials;
use vax_types::{AppointmentId, SlotDate, Username, VaccineName};

/// A provider or recipient account. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub username: Username,
    pub credentials: Credentials,
}

/// Dose stock for one vaccine.
///
/// `total_added` counts every dose ever added, so that
/// `total_added == available + doses held by live appointments`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseInventory {
    pub vaccine: VaccineName,
    pub available: u64,
    pub total_added: u64,
}

impl DoseInventory {
    pub fn new(vaccine: VaccineName) -> Self {
        Self {
            vaccine,
            available: 0,
            total_added: 0,
        }
    }
}

/// A provider's open capacity for one date.
///
/// Ordered by date, then provider username, which is the order schedule
/// lookups and reservations walk them in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub date: SlotDate,
    pub provider: Username,
}

impl AvailabilitySlot {
    pub fn new(date: SlotDate, provider: Username) -> Self {
        Self { date, provider }
    }
}

/// A confirmed booking of one dose with one provider on one date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub date: SlotDate,
    pub provider: Username,
    pub recipient: Username,
    pub vaccine: VaccineName,
}

impl Appointment {
    /// The availability slot this appointment consumed.
    pub fn slot(&self) -> AvailabilitySlot {
        AvailabilitySlot::new(self.date, self.provider.clone())
    }
}
