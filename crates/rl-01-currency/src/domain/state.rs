//! # Currency State
//!
//! Balances per currency. A currency with no entry has balance zero.

use super::entities::BalanceSheet;
use super::errors::CurrencyError;
use shared_bus::ClientEvent;
use shared_optimistic::DomainState;
use shared_types::{CurrencyAmount, CurrencyType, Domain, LedgerEntry};

/// Mutable currency state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencyState {
    balances: BalanceSheet,
}

/// Immutable copy of [`CurrencyState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrencySnapshot {
    /// Balance per currency.
    pub balances: BalanceSheet,
}

impl CurrencyState {
    /// State holding `balances`.
    pub fn from_balances(balances: BalanceSheet) -> Self {
        Self { balances }
    }

    /// Balance of one currency.
    pub fn balance(&self, currency: CurrencyType) -> u64 {
        self.balances.get(&currency).copied().unwrap_or(0)
    }

    /// All balances.
    pub fn balances(&self) -> &BalanceSheet {
        &self.balances
    }

    /// Overwrite one balance.
    pub fn set_balance(&mut self, currency: CurrencyType, balance: u64) {
        self.balances.insert(currency, balance);
    }

    /// Replace every balance.
    pub fn replace(&mut self, balances: BalanceSheet) {
        self.balances = balances;
    }

    /// Check that `entry` can be applied.
    pub fn check(&self, entry: &LedgerEntry) -> Result<u64, CurrencyError> {
        let amount = entry.amount();
        if amount.amount == 0 {
            return Err(CurrencyError::ZeroAmount);
        }
        let balance = self.balance(amount.currency);
        match entry {
            LedgerEntry::Credit(_) => {
                balance
                    .checked_add(amount.amount)
                    .ok_or(CurrencyError::Overflow {
                        currency: amount.currency,
                        balance,
                        amount: amount.amount,
                    })
            }
            LedgerEntry::Debit(_) => {
                balance
                    .checked_sub(amount.amount)
                    .ok_or(CurrencyError::InsufficientBalance {
                        currency: amount.currency,
                        balance,
                        required: amount.amount,
                    })
            }
        }
    }

    /// Apply `entry`, returning the new balance.
    pub fn apply(&mut self, entry: &LedgerEntry) -> Result<u64, CurrencyError> {
        let next = self.check(entry)?;
        self.set_balance(entry.amount().currency, next);
        Ok(next)
    }

    /// Undo a previously applied `entry` on its currency only, saturating at
    /// the `u64` bounds. Returns the new balance.
    pub fn revert(&mut self, entry: &LedgerEntry) -> u64 {
        let CurrencyAmount { currency, amount } = entry.amount();
        let balance = self.balance(currency);
        let next = match entry {
            LedgerEntry::Credit(_) => balance.saturating_sub(amount),
            LedgerEntry::Debit(_) => balance.saturating_add(amount),
        };
        self.set_balance(currency, next);
        next
    }
}

impl DomainState for CurrencyState {
    type Snapshot = CurrencySnapshot;
    const DOMAIN: Domain = Domain::Currency;

    fn snapshot(&self) -> CurrencySnapshot {
        CurrencySnapshot {
            balances: self.balances.clone(),
        }
    }

    fn restore(&mut self, snapshot: CurrencySnapshot) {
        self.balances = snapshot.balances;
    }

    fn change_events(
        before: &CurrencySnapshot,
        after: &CurrencySnapshot,
        is_optimistic: bool,
    ) -> Vec<ClientEvent> {
        let mut currencies: Vec<CurrencyType> = before
            .balances
            .keys()
            .chain(after.balances.keys())
            .copied()
            .collect();
        currencies.sort();
        currencies.dedup();

        currencies
            .into_iter()
            .filter_map(|currency| {
                let previous = before.balances.get(&currency).copied().unwrap_or(0);
                let current = after.balances.get(&currency).copied().unwrap_or(0);
                (previous != current).then_some(ClientEvent::BalanceChanged {
                    currency,
                    previous,
                    current,
                    is_optimistic,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missing_currency_is_zero() {
        let state = CurrencyState::default();
        assert_eq!(state.balance(CurrencyType::HardCurrency), 0);
    }

    #[test]
    fn test_debit_checks_balance() {
        let mut state = CurrencyState::default();
        state.set_balance(CurrencyType::SoftCurrency, 10);

        let err = state
            .apply(&LedgerEntry::Debit(CurrencyAmount::soft(11)))
            .unwrap_err();
        assert_eq!(
            err,
            CurrencyError::InsufficientBalance {
                currency: CurrencyType::SoftCurrency,
                balance: 10,
                required: 11,
            }
        );
        assert_eq!(state.apply(&LedgerEntry::Debit(CurrencyAmount::soft(10))), Ok(0));
    }

    #[test]
    fn test_credit_overflow() {
        let mut state = CurrencyState::default();
        state.set_balance(CurrencyType::HardCurrency, u64::MAX);
        assert!(matches!(
            state.apply(&LedgerEntry::Credit(CurrencyAmount::hard(1))),
            Err(CurrencyError::Overflow { .. })
        ));
    }

    #[test]
    fn test_revert_touches_one_currency() {
        let mut state = CurrencyState::default();
        state.set_balance(CurrencyType::SoftCurrency, 40);
        state.set_balance(CurrencyType::HardCurrency, 7);

        assert_eq!(state.revert(&LedgerEntry::Credit(CurrencyAmount::soft(15))), 25);
        assert_eq!(state.revert(&LedgerEntry::Debit(CurrencyAmount::soft(5))), 30);
        assert_eq!(state.balance(CurrencyType::HardCurrency), 7);

        // A credit already spent elsewhere floors at zero.
        assert_eq!(state.revert(&LedgerEntry::Credit(CurrencyAmount::hard(10))), 0);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let state = CurrencyState::default();
        assert_eq!(
            state.check(&LedgerEntry::Credit(CurrencyAmount::soft(0))),
            Err(CurrencyError::ZeroAmount)
        );
    }

    #[test]
    fn test_change_events_only_for_changed_currencies() {
        let before = CurrencySnapshot {
            balances: BalanceSheet::from([
                (CurrencyType::SoftCurrency, 5),
                (CurrencyType::HardCurrency, 1),
            ]),
        };
        let after = CurrencySnapshot {
            balances: BalanceSheet::from([(CurrencyType::SoftCurrency, 5)]),
        };
        let events = CurrencyState::change_events(&before, &after, false);
        assert_eq!(
            events,
            vec![ClientEvent::BalanceChanged {
                currency: CurrencyType::HardCurrency,
                previous: 1,
                current: 0,
                is_optimistic: false,
            }]
        );
    }

    proptest! {
        #[test]
        fn prop_snapshot_restore_identity(soft in any::<u64>(), hard in any::<u64>(), credit in 1u64..1_000) {
            let mut state = CurrencyState::default();
            state.set_balance(CurrencyType::SoftCurrency, soft);
            state.set_balance(CurrencyType::HardCurrency, hard);
            let original = state.clone();
            let snapshot = state.snapshot();

            let _ = state.apply(&LedgerEntry::Credit(CurrencyAmount::soft(credit)));
            let _ = state.apply(&LedgerEntry::Debit(CurrencyAmount::hard(credit)));

            state.restore(snapshot);
            prop_assert_eq!(state, original);
        }
    }
}
