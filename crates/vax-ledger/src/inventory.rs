use tracing::debug;
use vax_store::{DoseInventory, Mutation, Tables, Transaction};
use vax_types::VaccineName;

use crate::error::LedgerError;

/// Dose stock per vaccine.
///
/// Counts are unsigned and every decrease is checked first: a request that
/// would go below zero fails and stages nothing.
pub struct InventoryLedger;

impl InventoryLedger {
    /// Available doses of `vaccine`.
    pub fn get_doses(tables: &Tables, vaccine: &VaccineName) -> Result<u64, LedgerError> {
        tables
            .dose_inventory(vaccine)
            .map(|entry| entry.available)
            .ok_or_else(|| LedgerError::VaccineNotFound(vaccine.clone()))
    }

    /// Add newly delivered doses, creating the entry on first use.
    ///
    /// Returns the new available count.
    pub fn add_doses(
        tx: &mut Transaction,
        vaccine: &VaccineName,
        count: u64,
    ) -> Result<u64, LedgerError> {
        if count == 0 {
            return Err(LedgerError::InvalidDoseCount);
        }
        let mut entry = tx
            .tables()
            .dose_inventory(vaccine)
            .cloned()
            .unwrap_or_else(|| DoseInventory::new(vaccine.clone()));

        entry.available = entry
            .available
            .checked_add(count)
            .ok_or_else(|| LedgerError::DoseOverflow(vaccine.clone()))?;
        entry.total_added = entry
            .total_added
            .checked_add(count)
            .ok_or_else(|| LedgerError::DoseOverflow(vaccine.clone()))?;

        let available = entry.available;
        tx.apply(Mutation::PutInventory(entry));
        debug!(vaccine = %vaccine, count, available, "doses added");
        Ok(available)
    }

    /// Take `count` doses out of stock. Returns the new available count.
    pub fn decrease_doses(
        tx: &mut Transaction,
        vaccine: &VaccineName,
        count: u64,
    ) -> Result<u64, LedgerError> {
        if count == 0 {
            return Err(LedgerError::InvalidDoseCount);
        }
        let mut entry = tx
            .tables()
            .dose_inventory(vaccine)
            .cloned()
            .ok_or_else(|| LedgerError::VaccineNotFound(vaccine.clone()))?;

        entry.available = entry.available.checked_sub(count).ok_or_else(|| {
            LedgerError::InsufficientDoses {
                vaccine: vaccine.clone(),
                available: entry.available,
                requested: count,
            }
        })?;

        let available = entry.available;
        tx.apply(Mutation::PutInventory(entry));
        debug!(vaccine = %vaccine, count, available, "doses decreased");
        Ok(available)
    }

    /// Return doses held by a cancelled appointment to stock.
    ///
    /// Unlike [`add_doses`](Self::add_doses) this leaves `total_added`
    /// alone: the doses were already counted when first delivered.
    pub fn restore_doses(
        tx: &mut Transaction,
        vaccine: &VaccineName,
        count: u64,
    ) -> Result<u64, LedgerError> {
        if count == 0 {
            return Err(LedgerError::InvalidDoseCount);
        }
        let mut entry = tx
            .tables()
            .dose_inventory(vaccine)
            .cloned()
            .ok_or_else(|| LedgerError::VaccineNotFound(vaccine.clone()))?;

        entry.available = entry
            .available
            .checked_add(count)
            .ok_or_else(|| LedgerError::DoseOverflow(vaccine.clone()))?;

        let available = entry.available;
        tx.apply(Mutation::PutInventory(entry));
        debug!(vaccine = %vaccine, count, available, "doses restored");
        Ok(available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vax_store::{InMemoryStore, SchedulingStore};

    fn pfizer() -> VaccineName {
        VaccineName::new("Pfizer").unwrap()
    }

    fn add(store: &InMemoryStore, n: u64) -> Result<u64, LedgerError> {
        store.transact(|tx| InventoryLedger::add_doses(tx, &pfizer(), n))
    }

    fn decrease(store: &InMemoryStore, n: u64) -> Result<u64, LedgerError> {
        store.transact(|tx| InventoryLedger::decrease_doses(tx, &pfizer(), n))
    }

    fn doses(store: &InMemoryStore) -> Result<u64, LedgerError> {
        store.read(|t| InventoryLedger::get_doses(t, &pfizer()))?
    }

    #[test]
    fn unknown_vaccine_not_found() {
        let store = InMemoryStore::new();
        assert!(matches!(doses(&store), Err(LedgerError::VaccineNotFound(_))));
        assert!(matches!(decrease(&store, 1), Err(LedgerError::VaccineNotFound(_))));
    }

    #[test]
    fn add_creates_then_increments() {
        let store = InMemoryStore::new();
        assert_eq!(add(&store, 10).unwrap(), 10);
        assert_eq!(add(&store, 5).unwrap(), 15);
        assert_eq!(doses(&store).unwrap(), 15);
        let total = store
            .read(|t| t.dose_inventory(&pfizer()).unwrap().total_added)
            .unwrap();
        assert_eq!(total, 15);
    }

    #[test]
    fn zero_counts_rejected() {
        let store = InMemoryStore::new();
        assert!(matches!(add(&store, 0), Err(LedgerError::InvalidDoseCount)));
        assert!(store.snapshot().unwrap().inventory().is_empty());
    }

    #[test]
    fn decrease_below_zero_fails_without_clamping() {
        let store = InMemoryStore::new();
        add(&store, 2).unwrap();
        let err = decrease(&store, 3).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientDoses { available: 2, requested: 3, .. }
        ));
        assert_eq!(doses(&store).unwrap(), 2);
        assert_eq!(decrease(&store, 2).unwrap(), 0);
    }

    #[test]
    fn restore_keeps_total_added() {
        let store = InMemoryStore::new();
        add(&store, 3).unwrap();
        decrease(&store, 1).unwrap();
        store
            .transact(|tx| InventoryLedger::restore_doses(tx, &pfizer(), 1))
            .unwrap();
        let entry = store
            .read(|t| t.dose_inventory(&pfizer()).cloned())
            .unwrap()
            .unwrap();
        assert_eq!(entry.available, 3);
        assert_eq!(entry.total_added, 3);
    }

    #[test]
    fn overflow_rejected() {
        let store = InMemoryStore::new();
        add(&store, u64::MAX).unwrap();
        assert!(matches!(add(&store, 1), Err(LedgerError::DoseOverflow(_))));
        assert_eq!(doses(&store).unwrap(), u64::MAX);
    }

    #[derive(Clone, Debug)]
    enum Op {
        Add(u64),
        Decrease(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1u64..20).prop_map(Op::Add),
            (1u64..20).prop_map(Op::Decrease),
        ]
    }

    proptest! {
        #[test]
        fn stock_never_goes_negative(ops in proptest::collection::vec(op(), 1..40)) {
            let store = InMemoryStore::new();
            let mut model: Option<u64> = None;
            for op in ops {
                match op {
                    Op::Add(n) => {
                        add(&store, n).unwrap();
                        model = Some(model.unwrap_or(0) + n);
                    }
                    Op::Decrease(n) => {
                        let result = decrease(&store, n);
                        match model {
                            Some(current) if current >= n => {
                                prop_assert_eq!(result.unwrap(), current - n);
                                model = Some(current - n);
                            }
                            _ => prop_assert!(result.is_err()),
                        }
                    }
                }
                match model {
                    Some(expected) => prop_assert_eq!(doses(&store).unwrap(), expected),
                    None => prop_assert!(doses(&store).is_err()),
                }
            }
        }
    }
}
