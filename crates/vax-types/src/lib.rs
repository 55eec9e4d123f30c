//! Foundation types for the vaccine scheduler.
//!
//! Every other scheduler crate depends on `vax-types`. The types here are
//! validated at construction, so code further up the stack can assume a
//! `Username` has no whitespace and a `SlotDate` is a real calendar day.
//!
//! # Key Types
//!
//! - [`Username`] -- Case-sensitive account name for providers and recipients
//! - [`Role`] -- Which account table a username lives in
//! - [`VaccineName`] -- Key of the dose inventory
//! - [`AppointmentId`] -- Caller-visible appointment identifier
//! - [`SlotDate`] -- Calendar date of an availability slot or appointment

pub mod appointment;
pub mod date;
pub mod error;
pub mod identity;
pub mod vaccine;

pub use appointment::AppointmentId;
pub use date::SlotDate;
pub use error::TypeError;
pub use identity::{Role, Username};
pub use vaccine::VaccineName;
