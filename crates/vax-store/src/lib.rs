//! Transactional storage for the vaccine scheduler.
//!
//! The store holds five collections in a single [`Tables`] value: provider
//! accounts, recipient accounts, dose inventory, availability slots, and
//! appointments. It never interprets them. Cross-table rules (no
//! double-booking, no negative dose counts) belong to `vax-ledger`; the
//! store only guarantees that a [`Transaction`] is applied completely or
//! not at all, and that transactions are serialized.
//!
//! # Storage Backends
//!
//! All backends implement the [`SchedulingStore`] trait:
//!
//! - [`InMemoryStore`] -- lock-protected tables for tests and embedding
//! - [`DurableStore`] -- in-memory tables plus a CRC-framed write-ahead log
//!
//! # Design Rules
//!
//! 1. A transaction works on a private copy of the tables and records every
//!    change as a [`Mutation`].
//! 2. Commit is log-then-apply: the durable backend writes the mutation
//!    batch before publishing the new tables.
//! 3. A closure error or a failed log write discards the copy untouched.
//! 4. Writers are serialized by one lock, so every transaction observes all
//!    transactions committed before it.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod durable;
pub mod error;
pub mod memory;
pub mod records;
pub mod tables;
pub mod traits;
pub mod wal;

pub use durable::{DurableConfig, DurableStore};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use records::{AccountRecord, Appointment, AvailabilitySlot, DoseInventory};
pub use tables::{Mutation, Tables};
pub use traits::{SchedulingStore, Transaction};
pub use wal::{SyncMode, WalEntry, WriteAheadLog};
