use crate::error::{StoreError, StoreResult};
use crate::tables::{Mutation, Tables};

/// An open read-write transaction.
///
/// Reads see the tables as of transaction start plus every mutation applied
/// so far in this transaction. Nothing becomes visible to other callers
/// until the owning store commits.
pub struct Transaction {
    view: Tables,
    staged: Vec<Mutation>,
}

impl Transaction {
    pub(crate) fn begin(base: &Tables) -> Self {
        Self {
            view: base.clone(),
            staged: Vec::new(),
        }
    }

    /// The tables as this transaction currently sees them.
    pub fn tables(&self) -> &Tables {
        &self.view
    }

    /// Stage a mutation and make it visible to subsequent reads.
    pub fn apply(&mut self, mutation: Mutation) {
        self.view.apply(&mutation);
        self.staged.push(mutation);
    }

    /// Mutations staged so far, in application order.
    pub fn staged(&self) -> &[Mutation] {
        &self.staged
    }

    pub(crate) fn into_parts(self) -> (Tables, Vec<Mutation>) {
        (self.view, self.staged)
    }
}

/// Serializable transactional store for the scheduler tables.
///
/// All implementations must satisfy these invariants:
/// - `transact` runs its closure while holding exclusive write access, so
///   two transactions never interleave.
/// - If the closure returns `Err`, or the backend cannot record the staged
///   mutations, no mutation becomes visible.
/// - `read` observes only committed state.
pub trait SchedulingStore: Send + Sync {
    /// Run a read-only closure against committed state.
    fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> StoreResult<R>;

    /// Run a read-write closure as one atomic unit.
    fn transact<R, E>(&self, f: impl FnOnce(&mut Transaction) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>;

    /// Clone the committed tables.
    fn snapshot(&self) -> StoreResult<Tables> {
        self.read(Tables::clone)
    }
}
