use serde::Serialize;
use vax_store::Appointment;
use vax_types::{AppointmentId, Role, SlotDate, Username, VaccineName};

/// A successful reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reservation {
    pub appointment_id: AppointmentId,
    pub provider: Username,
    pub date: SlotDate,
    pub vaccine: VaccineName,
}

impl From<&Appointment> for Reservation {
    fn from(a: &Appointment) -> Self {
        Self {
            appointment_id: a.id,
            provider: a.provider.clone(),
            date: a.date,
            vaccine: a.vaccine.clone(),
        }
    }
}

/// One appointment as seen by one of its parties.
///
/// `counterpart` is the recipient when a provider lists appointments and the
/// provider when a recipient does.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AppointmentView {
    pub id: AppointmentId,
    pub vaccine: VaccineName,
    pub date: SlotDate,
    pub counterpart: Username,
    pub counterpart_role: Role,
}

impl AppointmentView {
    pub(crate) fn for_viewer(appointment: &Appointment, viewer: Role) -> Self {
        let (counterpart, counterpart_role) = match viewer {
            Role::Provider => (appointment.recipient.clone(), Role::Recipient),
            Role::Recipient => (appointment.provider.clone(), Role::Provider),
        };
        Self {
            id: appointment.id,
            vaccine: appointment.vaccine.clone(),
            date: appointment.date,
            counterpart,
            counterpart_role,
        }
    }
}
