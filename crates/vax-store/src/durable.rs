use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::tables::Tables;
use crate::traits::{SchedulingStore, Transaction};
use crate::wal::{SyncMode, WalEntry, WriteAheadLog};

/// File name of the log inside the data directory.
pub const WAL_FILE_NAME: &str = "scheduler.wal";

/// Options for [`DurableStore::open`].
#[derive(Clone, Debug)]
pub struct DurableConfig {
    /// `fsync` after every committed transaction.
    pub sync_every_write: bool,
    /// Rewrite the log as a single snapshot batch after recovery.
    pub compact_on_open: bool,
}

impl Default for DurableConfig {
    fn default() -> Self {
        Self {
            sync_every_write: false,
            compact_on_open: true,
        }
    }
}

struct DurableState {
    tables: Tables,
    next_seq: u64,
}

/// In-memory tables backed by a write-ahead log.
///
/// Every committed transaction is appended to the log as one entry before
/// its effects are published, so a failed append leaves the tables exactly
/// as they were. Opening the store replays the log.
pub struct DurableStore {
    dir: PathBuf,
    wal: WriteAheadLog,
    state: RwLock<DurableState>,
}

impl DurableStore {
    /// Open (or create) a store in `dir` and replay its log.
    pub fn open(dir: &Path, config: DurableConfig) -> StoreResult<Self> {
        let sync_mode = if config.sync_every_write {
            SyncMode::EveryWrite
        } else {
            SyncMode::OsDefault
        };
        let wal = WriteAheadLog::open(&dir.join(WAL_FILE_NAME), sync_mode)?;

        let entries = wal.recover()?;
        let mut tables = Tables::default();
        let mut next_seq = 1;
        for entry in &entries {
            for mutation in &entry.mutations {
                tables.apply(mutation);
            }
            next_seq = next_seq.max(entry.seq + 1);
        }
        info!(dir = %dir.display(), entries = entries.len(), "scheduler store opened");

        let store = Self {
            dir: dir.to_path_buf(),
            wal,
            state: RwLock::new(DurableState { tables, next_seq }),
        };
        if config.compact_on_open && entries.len() > 1 {
            store.compact()?;
        }
        Ok(store)
    }

    /// Rewrite the log as one entry that rebuilds the current tables.
    pub fn compact(&self) -> StoreResult<()> {
        let mut state = self.state.write().map_err(|_| StoreError::LockPoisoned)?;
        let entry = WalEntry {
            seq: state.next_seq,
            mutations: state.tables.to_mutations(),
        };
        self.wal.rewrite(std::slice::from_ref(&entry))?;
        state.next_seq += 1;
        debug!(mutations = entry.mutations.len(), "store compacted");
        Ok(())
    }

    pub fn wal_path(&self) -> &Path {
        self.wal.path()
    }
}

impl SchedulingStore for DurableStore {
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> StoreResult<R> {
        let state = self.state.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&state.tables))
    }

    fn transact<R, E>(&self, f: impl FnOnce(&mut Transaction) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut state = self
            .state
            .write()
            .map_err(|_| E::from(StoreError::LockPoisoned))?;

        let mut tx = Transaction::begin(&state.tables);
        let result = f(&mut tx)?;
        let (view, staged) = tx.into_parts();
        if staged.is_empty() {
            return Ok(result);
        }

        let entry = WalEntry {
            seq: state.next_seq,
            mutations: staged,
        };
        self.wal.append(&entry).map_err(E::from)?;

        state.tables = view;
        state.next_seq += 1;
        Ok(result)
    }
}

impl std::fmt::Debug for DurableStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}
