//! Port through which claim and purchase operations move currency.

use async_trait::async_trait;
use shared_types::{LedgerEntry, OperationResult};

/// The reward/payment ledger.
///
/// Implemented by the currency domain. Claiming domains receive it at
/// construction and never lock its state directly.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Opaque restore point.
    type Checkpoint: Send + Sync + 'static;

    /// Capture the ledger before a dual-resource operation touches it.
    fn checkpoint(&self) -> Self::Checkpoint;

    /// Apply one entry as a full optimistic operation of its own. Returns the
    /// authoritative balance on success.
    async fn apply(&self, entry: &LedgerEntry, reason: &str) -> OperationResult<u64>;

    /// Undo `entry`, applied since `checkpoint`, notifying the reverted
    /// balance. Movements made by other operations in the meantime stay.
    fn revert(&self, checkpoint: Self::Checkpoint, entry: &LedgerEntry);
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! In-memory [`Ledger`](super::Ledger) for claim-flow tests.

    use super::Ledger;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared_types::{CurrencyAmount, CurrencyType, LedgerEntry, OperationResult};
    use std::collections::{BTreeMap, VecDeque};

    /// Entries apply immediately unless a failure has been queued with
    /// [`InMemoryLedger::fail_next`].
    #[derive(Default)]
    pub struct InMemoryLedger {
        balances: Mutex<BTreeMap<CurrencyType, u64>>,
        failures: Mutex<VecDeque<OperationResult<u64>>>,
        applied: Mutex<Vec<LedgerEntry>>,
    }

    impl InMemoryLedger {
        /// Ledger starting from the given balances.
        pub fn with_balances(balances: impl IntoIterator<Item = (CurrencyType, u64)>) -> Self {
            Self {
                balances: Mutex::new(balances.into_iter().collect()),
                ..Self::default()
            }
        }

        /// Make the next `apply` return `result` without touching balances.
        pub fn fail_next(&self, result: OperationResult<u64>) {
            self.failures.lock().push_back(result);
        }

        /// Current balance of one currency.
        pub fn balance(&self, currency: CurrencyType) -> u64 {
            self.balances.lock().get(&currency).copied().unwrap_or(0)
        }

        /// Move a balance outside of any claim.
        pub fn set_balance(&self, currency: CurrencyType, balance: u64) {
            self.balances.lock().insert(currency, balance);
        }

        /// Every entry applied so far, reverted or not.
        pub fn applied(&self) -> Vec<LedgerEntry> {
            self.applied.lock().clone()
        }
    }

    #[async_trait]
    impl Ledger for InMemoryLedger {
        type Checkpoint = ();

        fn checkpoint(&self) -> Self::Checkpoint {}

        async fn apply(&self, entry: &LedgerEntry, _reason: &str) -> OperationResult<u64> {
            if let Some(failure) = self.failures.lock().pop_front() {
                return failure;
            }

            let CurrencyAmount { currency, amount } = entry.amount();
            let mut balances = self.balances.lock();
            let balance = balances.entry(currency).or_insert(0);
            let next = match entry {
                LedgerEntry::Credit(_) => balance.checked_add(amount),
                LedgerEntry::Debit(_) => balance.checked_sub(amount),
            };
            let Some(next) = next else {
                return OperationResult::ValidationError(format!(
                    "cannot apply {amount} {currency} to balance {balance}"
                ));
            };
            *balance = next;
            self.applied.lock().push(*entry);
            OperationResult::Success(next)
        }

        fn revert(&self, _checkpoint: (), entry: &LedgerEntry) {
            let CurrencyAmount { currency, amount } = entry.amount();
            let mut balances = self.balances.lock();
            let balance = balances.entry(currency).or_insert(0);
            *balance = match entry {
                LedgerEntry::Credit(_) => balance.saturating_sub(amount),
                LedgerEntry::Debit(_) => balance.saturating_add(amount),
            };
        }
    }
}
