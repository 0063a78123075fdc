use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use paydesk_schema::Customer;

use crate::ops::LedgerOutcome;

/// Holds the current customer record.
///
/// Readers get a consistent snapshot; writers replace the whole record, one at
/// a time, so nobody ever observes a half-applied operation.
pub struct AccountStore {
    current: ArcSwap<Customer>,
    writer: Mutex<()>,
}

impl AccountStore {
    pub fn new(seed: Customer) -> Self {
        Self {
            current: ArcSwap::from_pointee(seed),
            writer: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<Customer> {
        self.current.load_full()
    }

    /// Run `op` against the current record and publish its result.
    pub fn apply<F>(&self, op: F) -> LedgerOutcome
    where
        F: FnOnce(&Customer) -> LedgerOutcome,
    {
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = self.current.load_full();
        let outcome = op(&before);
        self.current.store(Arc::new(outcome.account.clone()));
        outcome
    }

    /// Swap in a different customer, returning the one that was showing.
    pub fn replace(&self, customer: Customer) -> Arc<Customer> {
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.current.swap(Arc::new(customer))
    }
}
