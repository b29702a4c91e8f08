//! # Currency Flows
//!
//! Optimistic balance changes against the server, including the declined
//! in-app purchase scenario and single-flight exclusion.

#[cfg(test)]
mod tests {
    use super::super::fixtures::Harness;
    use client_runtime::{Call, Fault};
    use rl_01_currency::CurrencyApi;
    use shared_bus::{ClientEvent, EventFilter};
    use shared_types::{
        CurrencyType, Domain, GatewayError, OperationResult, RollbackCategory, OPERATION_PENDING,
    };
    use std::time::Duration;

    #[tokio::test]
    async fn test_declined_payment_restores_balance_and_notifies() {
        let h = Harness::bootstrapped().await;
        let mut events = h.client.bus.subscribe(EventFilter::domains(&[Domain::Currency]));
        h.backend
            .inject(Call::AddCurrency, Fault::Reject("payment declined".into()));

        let result = h.client.currency.add(CurrencyType::HardCurrency, 50, "iap").await;

        assert_eq!(
            result,
            OperationResult::RolledBack {
                reason: "payment declined".into(),
                category: RollbackCategory::BusinessRule,
            }
        );
        assert_eq!(h.client.currency.balance(CurrencyType::HardCurrency), 100);

        let events = events.drain();
        assert_eq!(
            events[0],
            ClientEvent::BalanceChanged {
                currency: CurrencyType::HardCurrency,
                previous: 100,
                current: 150,
                is_optimistic: true,
            }
        );
        let rollback = events
            .iter()
            .find_map(ClientEvent::as_rollback)
            .expect("rollback published");
        assert_eq!(rollback.category, RollbackCategory::BusinessRule);
        assert!(rollback.should_notify_user);
        assert!(events.iter().any(|e| matches!(
            e,
            ClientEvent::BalanceChanged {
                current: 100,
                is_optimistic: false,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_spend_confirmed_by_server() {
        let h = Harness::bootstrapped().await;

        let result = h
            .client
            .currency
            .spend(CurrencyType::SoftCurrency, 40, "continue")
            .await;

        assert_eq!(result, OperationResult::Success(210));
        assert_eq!(h.server_balance(CurrencyType::SoftCurrency), 210);
    }

    #[tokio::test]
    async fn test_timeout_is_retryable_and_leaves_server_untouched() {
        let h = Harness::bootstrapped().await;
        h.backend
            .inject(Call::SpendCurrency, Fault::Error(GatewayError::Timeout));

        let result = h
            .client
            .currency
            .spend(CurrencyType::SoftCurrency, 40, "continue")
            .await;

        assert!(result.is_retryable());
        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 250);
        assert_eq!(h.server_balance(CurrencyType::SoftCurrency), 250);

        // The retry goes through.
        assert!(h
            .client
            .currency
            .spend(CurrencyType::SoftCurrency, 40, "continue")
            .await
            .is_success());
    }

    #[tokio::test]
    async fn test_second_operation_refused_while_first_in_flight() {
        let h = Harness::bootstrapped().await;
        h.backend.set_latency(Duration::from_millis(20));

        let (first, second) = tokio::join!(
            h.client.currency.spend(CurrencyType::SoftCurrency, 10, "a"),
            h.client.currency.spend(CurrencyType::SoftCurrency, 10, "b"),
        );

        assert_eq!(first, OperationResult::Success(240));
        assert_eq!(
            second,
            OperationResult::ValidationError(OPERATION_PENDING.to_string())
        );
        assert_eq!(h.backend.call_count(Call::SpendCurrency), 1);
    }

    #[tokio::test]
    async fn test_overspend_never_reaches_server() {
        let h = Harness::bootstrapped().await;

        let result = h
            .client
            .currency
            .spend(CurrencyType::HardCurrency, 101, "gems")
            .await;

        assert!(matches!(result, OperationResult::ValidationError(_)));
        assert_eq!(h.backend.call_count(Call::SpendCurrency), 0);
    }

    #[tokio::test]
    async fn test_sync_adopts_server_balance() {
        let h = Harness::bootstrapped().await;
        h.backend.modify(|world| {
            world.balances.insert(CurrencyType::SoftCurrency, 999);
        });

        assert!(h.client.currency.sync().await.is_success());

        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 999);
    }
}
