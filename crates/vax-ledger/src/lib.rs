//! Ledgers for the vaccine scheduler.
//!
//! Each ledger is the single source of truth for one entity and enforces
//! that entity's rules on top of a `vax-store` [`Transaction`]:
//!
//! - [`InventoryLedger`] -- dose counts per vaccine, never negative
//! - [`AvailabilityBoard`] -- open `(date, provider)` slots, never re-offered
//!   while booked
//! - [`AppointmentLedger`] -- confirmed bookings with sequential ids
//!
//! Ledger operations only stage mutations; the caller decides the
//! transaction boundary, so one reservation can touch all three ledgers
//! atomically. [`InvariantValidator`] audits the cross-ledger invariants
//! on committed tables.
//!
//! [`Transaction`]: vax_store::Transaction

pub mod appointments;
pub mod availability;
pub mod error;
pub mod inventory;
pub mod validation;

pub use appointments::AppointmentLedger;
pub use availability::{AvailabilityBoard, ScheduleRow};
pub use error::LedgerError;
pub use inventory::InventoryLedger;
pub use validation::{InvariantValidator, ValidationReport, Violation, ViolationKind};
