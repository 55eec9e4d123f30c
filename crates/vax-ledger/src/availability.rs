use serde::{Deserialize, Serialize};
use tracing::debug;
use vax_store::{AvailabilitySlot, Mutation, Tables, Transaction};
use vax_types::{SlotDate, Username, VaccineName};

use crate::appointments::AppointmentLedger;
use crate::error::LedgerError;

/// One row of a schedule lookup: an open provider joined with one vaccine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub provider: Username,
    pub vaccine: VaccineName,
    pub doses: u64,
}

/// Open `(date, provider)` slots.
///
/// At most one slot exists per pair. A pair that is already booked cannot be
/// offered again until the appointment is cancelled.
pub struct AvailabilityBoard;

impl AvailabilityBoard {
    /// Offer `provider`'s capacity on `date`.
    ///
    /// Fails with [`LedgerError::SlotExists`] if an appointment already
    /// occupies the pair. Re-offering an open slot is accepted and stages
    /// nothing; the return value is `true` if a new slot was opened.
    pub fn upload(
        tx: &mut Transaction,
        provider: &Username,
        date: SlotDate,
    ) -> Result<bool, LedgerError> {
        if AppointmentLedger::is_occupied(tx.tables(), provider, date) {
            return Err(LedgerError::SlotExists {
                provider: provider.clone(),
                date,
            });
        }
        let slot = AvailabilitySlot::new(date, provider.clone());
        if tx.tables().has_slot(&slot) {
            return Ok(false);
        }
        tx.apply(Mutation::InsertSlot(slot));
        debug!(provider = %provider, %date, "slot opened");
        Ok(true)
    }

    /// Every open slot on `date` joined with every inventory entry, ordered
    /// by provider then vaccine.
    pub fn find_open_slots(tables: &Tables, date: SlotDate) -> Vec<ScheduleRow> {
        tables
            .slots_on(date)
            .flat_map(move |slot| {
                tables.inventory().values().map(move |entry| ScheduleRow {
                    provider: slot.provider.clone(),
                    vaccine: entry.vaccine.clone(),
                    doses: entry.available,
                })
            })
            .collect()
    }

    /// Providers holding an open slot on `date`, in username order.
    pub fn open_providers(tables: &Tables, date: SlotDate) -> Vec<Username> {
        tables
            .slots_on(date)
            .map(|slot| slot.provider.clone())
            .collect()
    }

    /// Remove exactly the `(provider, date)` slot.
    pub fn consume_slot(
        tx: &mut Transaction,
        provider: &Username,
        date: SlotDate,
    ) -> Result<(), LedgerError> {
        let slot = AvailabilitySlot::new(date, provider.clone());
        if !tx.tables().has_slot(&slot) {
            return Err(LedgerError::NoSuchSlot {
                provider: provider.clone(),
                date,
            });
        }
        tx.apply(Mutation::RemoveSlot(slot));
        debug!(provider = %provider, %date, "slot consumed");
        Ok(())
    }

    /// Re-open the `(provider, date)` slot.
    pub fn restore_slot(tx: &mut Transaction, provider: &Username, date: SlotDate) {
        tx.apply(Mutation::InsertSlot(AvailabilitySlot::new(
            date,
            provider.clone(),
        )));
        debug!(provider = %provider, %date, "slot restored");
    }
}
