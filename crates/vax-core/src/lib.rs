//! Scheduling core for the vaccine scheduler.
//!
//! [`Scheduler`] is the entry point for applications: it owns a
//! [`SchedulingStore`] and a credential hasher and exposes the session
//! operations (register, login, logout) and the scheduling operations
//! (search, reserve, cancel, add doses, upload availability, list
//! appointments). Callers keep one [`Session`] per interactive user and pass
//! it to every call.

pub mod config;
pub mod error;
pub mod outcome;
pub mod scheduler;
pub mod session;

pub use config::{ConfigError, SchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use outcome::{AppointmentView, Reservation};
pub use scheduler::Scheduler;
pub use session::{Identity, Session};

// Re-export key types
pub use vax_ledger::{ScheduleRow, ValidationReport, Violation, ViolationKind};
pub use vax_store::{DurableStore, InMemoryStore, SchedulingStore};
pub use vax_types::{AppointmentId, Role, SlotDate, Username, VaccineName};
