use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::tables::Tables;
use crate::traits::{SchedulingStore, Transaction};

/// In-memory store.
///
/// Intended for tests and embedding. The tables sit behind a `RwLock`;
/// readers share it, transactions take it exclusively for their whole
/// duration.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    read_only: AtomicBool,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::with_tables(Tables::default())
    }

    /// Create a store seeded with existing tables.
    pub fn with_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
            read_only: AtomicBool::new(false),
        }
    }

    /// Refuse (or accept again) transactions that stage mutations.
    ///
    /// While read-only, such transactions fail with [`StoreError::ReadOnly`]
    /// and leave the tables untouched.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulingStore for InMemoryStore {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> StoreResult<R> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&tables))
    }

    fn transact<R, E>(&self, f: impl FnOnce(&mut Transaction) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| E::from(StoreError::LockPoisoned))?;

        let mut tx = Transaction::begin(&tables);
        let result = f(&mut tx)?;
        let (view, staged) = tx.into_parts();
        if staged.is_empty() {
            return Ok(result);
        }
        if self.is_read_only() {
            return Err(E::from(StoreError::ReadOnly));
        }

        *tables = view;
        debug!(mutations = staged.len(), "transaction committed");
        Ok(result)
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("read_only", &self.is_read_only())
            .finish_non_exhaustive()
    }
}
