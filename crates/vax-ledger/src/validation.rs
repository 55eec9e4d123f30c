use std::collections::{BTreeMap, HashSet};

use vax_store::Tables;
use vax_types::{AppointmentId, Role, VaccineName};

/// Result of an invariant audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub appointment_count: usize,
    pub open_slot_count: usize,
    pub vaccine_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// A booked `(provider, date)` still has an open slot.
    BookedSlotStillOpen,
    /// A provider holds two bookings on one date.
    DoubleBooking,
    /// `total_added != available + booked` for a vaccine.
    DoseConservation,
    /// A booking names a vaccine with no inventory entry.
    UnknownVaccine,
    /// A booking names a provider or recipient with no account.
    UnknownAccount,
    /// The id counter would hand out an id already in use.
    IdCounterBehind,
}

/// Cross-ledger invariant checker.
pub struct InvariantValidator;

impl InvariantValidator {
    pub fn validate(tables: &Tables) -> ValidationReport {
        let mut violations = Vec::new();
        let mut booked_pairs = HashSet::new();
        let mut booked_per_vaccine: BTreeMap<&VaccineName, u64> = BTreeMap::new();
        let mut max_id: Option<AppointmentId> = None;

        for appointment in tables.appointments().values() {
            let slot = appointment.slot();
            if tables.has_slot(&slot) {
                violations.push(Violation {
                    kind: ViolationKind::BookedSlotStillOpen,
                    description: format!(
                        "appointment {} for {} on {} left its slot open",
                        appointment.id, appointment.provider, appointment.date
                    ),
                });
            }
            if !booked_pairs.insert(slot) {
                violations.push(Violation {
                    kind: ViolationKind::DoubleBooking,
                    description: format!(
                        "{} has more than one appointment on {}",
                        appointment.provider, appointment.date
                    ),
                });
            }
            if tables.account(Role::Provider, &appointment.provider).is_none() {
                violations.push(unknown_account(
                    appointment.id,
                    Role::Provider,
                    &appointment.provider,
                ));
            }
            if tables.account(Role::Recipient, &appointment.recipient).is_none() {
                violations.push(unknown_account(
                    appointment.id,
                    Role::Recipient,
                    &appointment.recipient,
                ));
            }
            if tables.dose_inventory(&appointment.vaccine).is_none() {
                violations.push(Violation {
                    kind: ViolationKind::UnknownVaccine,
                    description: format!(
                        "appointment {} references unknown vaccine {}",
                        appointment.id, appointment.vaccine
                    ),
                });
            }
            *booked_per_vaccine.entry(&appointment.vaccine).or_default() += 1;
            max_id = max_id.max(Some(appointment.id));
        }

        for entry in tables.inventory().values() {
            let booked = booked_per_vaccine.get(&entry.vaccine).copied().unwrap_or(0);
            if entry.available.checked_add(booked) != Some(entry.total_added) {
                violations.push(Violation {
                    kind: ViolationKind::DoseConservation,
                    description: format!(
                        "{}: {} added, {} available, {} booked",
                        entry.vaccine, entry.total_added, entry.available, booked
                    ),
                });
            }
        }

        if let Some(max_id) = max_id {
            if tables.next_appointment_id() <= max_id {
                violations.push(Violation {
                    kind: ViolationKind::IdCounterBehind,
                    description: format!(
                        "next id {} does not exceed highest live id {}",
                        tables.next_appointment_id(),
                        max_id
                    ),
                });
            }
        }

        ValidationReport {
            appointment_count: tables.appointments().len(),
            open_slot_count: tables.availability().len(),
            vaccine_count: tables.inventory().len(),
            violations,
        }
    }
}

fn unknown_account(id: AppointmentId, role: Role, name: &vax_types::Username) -> Violation {
    Violation {
        kind: ViolationKind::UnknownAccount,
        description: format!("appointment {id} references unknown {role} {name}"),
    }
}
