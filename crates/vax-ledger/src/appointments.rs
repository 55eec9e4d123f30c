use tracing::debug;
use vax_store::{Appointment, Mutation, Tables, Transaction};
use vax_types::{AppointmentId, SlotDate, Username, VaccineName};

use crate::error::LedgerError;

/// Confirmed bookings keyed by appointment id.
pub struct AppointmentLedger;

impl AppointmentLedger {
    /// Record a booking under the next sequential id.
    ///
    /// The caller is responsible for consuming the matching slot and dose in
    /// the same transaction.
    pub fn book(
        tx: &mut Transaction,
        date: SlotDate,
        provider: &Username,
        recipient: &Username,
        vaccine: &VaccineName,
    ) -> Appointment {
        let id = tx.tables().next_appointment_id();
        let appointment = Appointment {
            id,
            date,
            provider: provider.clone(),
            recipient: recipient.clone(),
            vaccine: vaccine.clone(),
        };
        tx.apply(Mutation::InsertAppointment(appointment.clone()));
        tx.apply(Mutation::SetNextAppointmentId(id.next()));
        debug!(%id, provider = %provider, recipient = %recipient, %date, "appointment booked");
        appointment
    }

    pub fn get(tables: &Tables, id: AppointmentId) -> Result<&Appointment, LedgerError> {
        tables
            .appointment(id)
            .ok_or(LedgerError::AppointmentNotFound(id))
    }

    /// Delete a booking and return it.
    pub fn remove(tx: &mut Transaction, id: AppointmentId) -> Result<Appointment, LedgerError> {
        let appointment = Self::get(tx.tables(), id)?.clone();
        tx.apply(Mutation::RemoveAppointment(id));
        debug!(%id, "appointment removed");
        Ok(appointment)
    }

    /// Whether `provider` has a booking on `date`.
    pub fn is_occupied(tables: &Tables, provider: &Username, date: SlotDate) -> bool {
        tables
            .appointments()
            .values()
            .any(|a| a.date == date && &a.provider == provider)
    }

    /// Bookings held by `provider`, ordered by id.
    pub fn for_provider<'t>(tables: &'t Tables, provider: &Username) -> Vec<&'t Appointment> {
        tables
            .appointments()
            .values()
            .filter(|a| &a.provider == provider)
            .collect()
    }

    /// Bookings held by `recipient`, ordered by id.
    pub fn for_recipient<'t>(tables: &'t Tables, recipient: &Username) -> Vec<&'t Appointment> {
        tables
            .appointments()
            .values()
            .filter(|a| &a.recipient == recipient)
            .collect()
    }

    /// Number of live bookings for `vaccine`.
    pub fn doses_booked(tables: &Tables, vaccine: &VaccineName) -> u64 {
        tables
            .appointments()
            .values()
            .filter(|a| &a.vaccine == vaccine)
            .count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vax_store::{InMemoryStore, SchedulingStore};

    fn user(s: &str) -> Username {
        Username::new(s).unwrap()
    }

    fn book(store: &InMemoryStore, day: u32, provider: &str, recipient: &str) -> Appointment {
        store
            .transact(|tx| {
                Ok::<_, LedgerError>(AppointmentLedger::book(
                    tx,
                    SlotDate::from_ymd(2021, 5, day).unwrap(),
                    &user(provider),
                    &user(recipient),
                    &VaccineName::new("Pfizer").unwrap(),
                ))
            })
            .unwrap()
    }

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let store = InMemoryStore::new();
        let a = book(&store, 1, "p1", "r1");
        let b = book(&store, 2, "p1", "r2");
        assert_eq!(a.id, AppointmentId::new(1));
        assert_eq!(b.id, AppointmentId::new(2));

        store
            .transact(|tx| AppointmentLedger::remove(tx, b.id))
            .unwrap();
        let c = book(&store, 3, "p1", "r3");
        assert_eq!(c.id, AppointmentId::new(3));
    }

    #[test]
    fn remove_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .transact(|tx| AppointmentLedger::remove(tx, AppointmentId::new(9)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::AppointmentNotFound(id) if id.get() == 9));
    }

    #[test]
    fn views_filter_by_party() {
        let store = InMemoryStore::new();
        book(&store, 1, "p1", "r1");
        book(&store, 2, "p2", "r1");
        book(&store, 3, "p1", "r2");

        let tables = store.snapshot().unwrap();
        let p1: Vec<u64> = AppointmentLedger::for_provider(&tables, &user("p1"))
            .iter()
            .map(|a| a.id.get())
            .collect();
        assert_eq!(p1, vec![1, 3]);
        let r1: Vec<u64> = AppointmentLedger::for_recipient(&tables, &user("r1"))
            .iter()
            .map(|a| a.id.get())
            .collect();
        assert_eq!(r1, vec![1, 2]);
        assert!(AppointmentLedger::is_occupied(
            &tables,
            &user("p2"),
            SlotDate::from_ymd(2021, 5, 2).unwrap()
        ));
        assert_eq!(
            AppointmentLedger::doses_booked(&tables, &VaccineName::new("Pfizer").unwrap()),
            3
        );
    }
}
