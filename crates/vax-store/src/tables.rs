use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use vax_types::{AppointmentId, Role, SlotDate, Username, VaccineName};

use crate::records::{AccountRecord, Appointment, AvailabilitySlot, DoseInventory};

/// The complete persisted state of the scheduler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    providers: BTreeMap<Username, AccountRecord>,
    recipients: BTreeMap<Username, AccountRecord>,
    inventory: BTreeMap<VaccineName, DoseInventory>,
    availability: BTreeSet<AvailabilitySlot>,
    appointments: BTreeMap<AppointmentId, Appointment>,
    next_appointment_id: AppointmentId,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            providers: BTreeMap::new(),
            recipients: BTreeMap::new(),
            inventory: BTreeMap::new(),
            availability: BTreeSet::new(),
            appointments: BTreeMap::new(),
            next_appointment_id: AppointmentId::FIRST,
        }
    }
}

/// A single row-level change. Transactions are ordered lists of these.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    InsertAccount { role: Role, record: AccountRecord },
    PutInventory(DoseInventory),
    InsertSlot(AvailabilitySlot),
    RemoveSlot(AvailabilitySlot),
    InsertAppointment(Appointment),
    RemoveAppointment(AppointmentId),
    SetNextAppointmentId(AppointmentId),
}

impl Tables {
    pub fn accounts(&self, role: Role) -> &BTreeMap<Username, AccountRecord> {
        match role {
            Role::Provider => &self.providers,
            Role::Recipient => &self.recipients,
        }
    }

    pub fn account(&self, role: Role, username: &Username) -> Option<&AccountRecord> {
        self.accounts(role).get(username)
    }

    pub fn inventory(&self) -> &BTreeMap<VaccineName, DoseInventory> {
        &self.inventory
    }

    pub fn dose_inventory(&self, vaccine: &VaccineName) -> Option<&DoseInventory> {
        self.inventory.get(vaccine)
    }

    pub fn availability(&self) -> &BTreeSet<AvailabilitySlot> {
        &self.availability
    }

    pub fn has_slot(&self, slot: &AvailabilitySlot) -> bool {
        self.availability.contains(slot)
    }

    /// Open slots on `date`, in provider-username order.
    pub fn slots_on(&self, date: SlotDate) -> impl Iterator<Item = &AvailabilitySlot> {
        self.availability
            .iter()
            .skip_while(move |slot| slot.date < date)
            .take_while(move |slot| slot.date == date)
    }

    pub fn appointments(&self) -> &BTreeMap<AppointmentId, Appointment> {
        &self.appointments
    }

    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.get(&id)
    }

    pub fn next_appointment_id(&self) -> AppointmentId {
        self.next_appointment_id
    }

    /// Apply one mutation. The store does not validate; ledgers do.
    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation {
            Mutation::InsertAccount { role, record } => {
                let table = match role {
                    Role::Provider => &mut self.providers,
                    Role::Recipient => &mut self.recipients,
                };
                table.insert(record.username.clone(), record.clone());
            }
            Mutation::PutInventory(entry) => {
                self.inventory.insert(entry.vaccine.clone(), entry.clone());
            }
            Mutation::InsertSlot(slot) => {
                self.availability.insert(slot.clone());
            }
            Mutation::RemoveSlot(slot) => {
                self.availability.remove(slot);
            }
            Mutation::InsertAppointment(appointment) => {
                self.appointments
                    .insert(appointment.id, appointment.clone());
            }
            Mutation::RemoveAppointment(id) => {
                self.appointments.remove(id);
            }
            Mutation::SetNextAppointmentId(id) => {
                self.next_appointment_id = *id;
            }
        }
    }

    /// A mutation list that rebuilds these tables from empty.
    pub fn to_mutations(&self) -> Vec<Mutation> {
        let accounts = [(Role::Provider, &self.providers), (Role::Recipient, &self.recipients)]
            .into_iter()
            .flat_map(|(role, table)| {
                table.values().map(move |record| Mutation::InsertAccount {
                    role,
                    record: record.clone(),
                })
            });

        accounts
            .chain(self.inventory.values().cloned().map(Mutation::PutInventory))
            .chain(self.availability.iter().cloned().map(Mutation::InsertSlot))
            .chain(
                self.appointments
                    .values()
                    .cloned()
                    .map(Mutation::InsertAppointment),
            )
            .chain(std::iter::once(Mutation::SetNextAppointmentId(
                self.next_appointment_id,
            )))
            .collect()
    }
}
