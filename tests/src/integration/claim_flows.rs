//! # Claim Flows
//!
//! Operations that touch a domain and the currency ledger together: item
//! purchases, reward claims and energy refills. Both effects land or
//! neither does, as seen from the client.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{standard_world, Harness, MAX_ENERGY};
    use client_runtime::{Call, Fault};
    use rl_01_currency::CurrencyApi;
    use rl_02_inventory::InventoryApi;
    use rl_03_achievements::AchievementsApi;
    use rl_04_tasks::TasksApi;
    use rl_05_energy::EnergyApi;
    use rl_06_referrals::{Referee, ReferralsApi};
    use shared_bus::EventFilter;
    use shared_optimistic::FlushOutcome;
    use shared_types::{CurrencyAmount, CurrencyType, GatewayError, OperationResult, RollbackCategory};
    use std::time::Duration;

    #[tokio::test]
    async fn test_purchase_debits_and_grants() {
        let h = Harness::bootstrapped().await;

        let result = h
            .client
            .inventory
            .purchase("board-rocket", CurrencyAmount::soft(100))
            .await;

        assert!(result.is_success());
        assert!(h.client.inventory.owns("board-rocket"));
        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 150);
        assert_eq!(h.server_balance(CurrencyType::SoftCurrency), 150);
        assert!(h.backend.world().inventory.owned.contains("board-rocket"));
    }

    #[tokio::test]
    async fn test_purchase_without_funds_changes_nothing() {
        let h = Harness::bootstrapped().await;

        let result = h
            .client
            .inventory
            .purchase("board-gold", CurrencyAmount::hard(500))
            .await;

        assert!(matches!(
            result,
            OperationResult::RolledBack {
                category: RollbackCategory::BusinessRule,
                ..
            }
        ));
        assert!(!h.client.inventory.owns("board-gold"));
        assert_eq!(h.client.currency.balance(CurrencyType::HardCurrency), 100);
        assert_eq!(h.backend.call_count(Call::PurchaseItem), 0);
    }

    #[tokio::test]
    async fn test_rejected_purchase_refunds_locally_then_sync_reconciles() {
        let h = Harness::bootstrapped().await;
        h.backend
            .inject(Call::PurchaseItem, Fault::Reject("item retired".into()));

        let result = h
            .client
            .inventory
            .purchase("board-rocket", CurrencyAmount::soft(100))
            .await;

        assert!(matches!(
            result,
            OperationResult::RolledBack {
                category: RollbackCategory::BusinessRule,
                ..
            }
        ));
        assert!(!h.client.inventory.owns("board-rocket"));
        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 250);

        // The debit had already been confirmed; the server stays authoritative.
        assert!(h.client.currency.sync().await.is_success());
        assert_eq!(
            h.client.currency.balance(CurrencyType::SoftCurrency),
            h.server_balance(CurrencyType::SoftCurrency)
        );
    }

    #[tokio::test]
    async fn test_achievement_unlock_and_claim() {
        let h = Harness::bootstrapped().await;

        let unlocked = h.client.achievements.report_progress("first-run", 1).await;
        assert!(unlocked.success().is_some_and(|a| a.unlocked));

        let claimed = h.client.achievements.claim("first-run").await;

        assert!(claimed.success().is_some_and(|a| a.claimed));
        assert_eq!(h.client.currency.balance(CurrencyType::HardCurrency), 105);
        assert_eq!(h.server_balance(CurrencyType::HardCurrency), 105);
    }

    #[tokio::test]
    async fn test_failed_claim_reverts_reward_and_flag() {
        let h = Harness::bootstrapped().await;
        assert!(h
            .client
            .achievements
            .report_progress("first-run", 1)
            .await
            .is_success());
        h.backend.inject(
            Call::ClaimAchievement,
            Fault::Error(GatewayError::Unavailable("maintenance".into())),
        );

        let result = h.client.achievements.claim("first-run").await;

        assert!(matches!(result, OperationResult::NetworkError { .. }));
        let achievement = h.client.achievements.get("first-run").expect("known");
        assert!(!achievement.claimed);
        assert_eq!(h.client.currency.balance(CurrencyType::HardCurrency), 100);

        // A retry succeeds once the server is back.
        assert!(h.client.achievements.claim("first-run").await.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_claim_keeps_concurrent_currency_add() {
        let h = Harness::bootstrapped().await;
        assert!(h
            .client
            .achievements
            .report_progress("first-run", 1)
            .await
            .is_success());
        h.backend
            .set_call_latency(Call::ClaimAchievement, Duration::from_millis(50));
        h.backend
            .inject(Call::ClaimAchievement, Fault::Reject("season over".into()));

        let claiming = h.client.achievements.claim("first-run");
        let buying = async {
            // The reward credit has landed; the claim waits on its confirm.
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.client
                .currency
                .add(CurrencyType::HardCurrency, 50, "iap")
                .await
        };
        let (claimed, added) = tokio::join!(claiming, buying);

        assert_eq!(added, OperationResult::Success(155));
        assert!(matches!(
            claimed,
            OperationResult::RolledBack {
                category: RollbackCategory::BusinessRule,
                ..
            }
        ));
        assert!(!h.client.achievements.get("first-run").expect("known").claimed);
        assert_eq!(h.client.currency.balance(CurrencyType::HardCurrency), 150);

        // The server kept the reward credit; a sync picks it up.
        assert!(h.client.currency.sync().await.is_success());
        assert_eq!(h.client.currency.balance(CurrencyType::HardCurrency), 155);
    }

    #[tokio::test]
    async fn test_ledger_failure_stops_claim_before_confirm() {
        let h = Harness::bootstrapped().await;
        assert!(h
            .client
            .achievements
            .report_progress("first-run", 1)
            .await
            .is_success());
        h.backend
            .inject(Call::AddCurrency, Fault::Error(GatewayError::Timeout));

        let result = h.client.achievements.claim("first-run").await;

        assert!(result.is_retryable());
        assert_eq!(h.backend.call_count(Call::ClaimAchievement), 0);
        assert!(!h.client.achievements.get("first-run").expect("known").claimed);
    }

    #[tokio::test]
    async fn test_task_increments_flush_as_one_batch() {
        let h = Harness::bootstrapped().await;
        let mut rollbacks = h.client.bus.subscribe(EventFilter::rollbacks());

        assert_eq!(h.client.tasks.increment("collect-7", 3), Ok(3));
        assert_eq!(h.client.tasks.increment("collect-7", 4), Ok(7));
        assert_eq!(h.client.tasks.pending_deltas().get("collect-7"), Some(&7));

        let outcome = h.client.tasks.flush().await;

        assert!(matches!(
            outcome,
            FlushOutcome::Accepted { items: 1 } | FlushOutcome::Empty
        ));
        assert_eq!(h.client.tasks.get("collect-7").map(|t| t.progress), Some(7));
        assert_eq!(h.backend.world().tasks["collect-7"].progress, 7);
        assert_eq!(h.backend.call_count(Call::UpdateProgress), 1);
        assert!(rollbacks.drain().is_empty());
    }

    #[tokio::test]
    async fn test_task_claim_flushes_progress_first() {
        let h = Harness::bootstrapped().await;
        h.client.tasks.increment("collect-7", 7).expect("known task");

        let result = h.client.tasks.claim("collect-7").await;

        assert!(result.success().is_some_and(|t| t.claimed));
        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 260);
        assert!(h.backend.world().tasks["collect-7"].claimed);
        assert!(h.client.tasks.increment("collect-7", 1).is_err());
    }

    #[tokio::test]
    async fn test_rejected_batch_reverts_progress() {
        let h = Harness::bootstrapped().await;
        h.backend
            .inject(Call::UpdateProgress, Fault::Reject("speed hack".into()));
        h.client.tasks.increment("collect-7", 5).expect("known task");

        let outcome = h.client.tasks.flush().await;

        assert!(matches!(outcome, FlushOutcome::Rejected { .. }));
        assert_eq!(h.client.tasks.get("collect-7").map(|t| t.progress), Some(0));
        assert!(h.client.tasks.pending_deltas().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_batch_keeps_progress_for_next_flush() {
        let h = Harness::bootstrapped().await;
        h.backend
            .inject(Call::UpdateProgress, Fault::Error(GatewayError::Timeout));
        h.client.tasks.increment("collect-7", 2).expect("known task");

        assert!(matches!(
            h.client.tasks.flush().await,
            FlushOutcome::Requeued { .. }
        ));
        h.client.tasks.increment("collect-7", 3).expect("known task");
        assert_eq!(h.client.tasks.pending_deltas().get("collect-7"), Some(&5));

        assert!(matches!(
            h.client.tasks.flush().await,
            FlushOutcome::Accepted { .. }
        ));
        assert_eq!(h.backend.world().tasks["collect-7"].progress, 5);
    }

    #[tokio::test]
    async fn test_energy_refill_spends_hard_currency() {
        let h = Harness::bootstrapped().await;
        assert!(h.client.energy.consume(3, "run").await.is_success());
        assert_eq!(h.client.energy.current(), MAX_ENERGY - 3);

        let result = h.client.energy.purchase_refill(CurrencyAmount::hard(10)).await;

        assert!(result.is_success());
        assert_eq!(h.client.energy.current(), MAX_ENERGY);
        assert_eq!(h.server_balance(CurrencyType::HardCurrency), 90);
        assert_eq!(h.backend.world().energy.current, MAX_ENERGY);
    }

    #[tokio::test]
    async fn test_referral_code_and_reward() {
        let mut world = standard_world();
        world.referrals.own_code = Some("RUNNER42".into());
        world.referrals.referees.insert(
            "friend-1".into(),
            Referee {
                reward: CurrencyAmount::hard(20),
                claimed: false,
            },
        );
        let h = Harness::new(world);
        h.client.bootstrap().await.expect("healthy backend");

        assert!(h.client.referrals.apply_code("runner42").await.success().is_none());
        let applied = h.client.referrals.apply_code("FRIEND2024").await;
        assert_eq!(
            applied.success().and_then(|r| r.referred_by),
            Some("FRIEND2024".to_string())
        );

        let claimed = h.client.referrals.claim_reward("friend-1").await;

        assert!(claimed.success().is_some_and(|r| r.claimed));
        assert_eq!(h.client.currency.balance(CurrencyType::HardCurrency), 120);
    }

    #[tokio::test]
    async fn test_unknown_referral_code_rolls_back() {
        let h = Harness::bootstrapped().await;

        let result = h.client.referrals.apply_code("NOBODY99").await;

        assert!(matches!(
            result,
            OperationResult::RolledBack {
                category: RollbackCategory::BusinessRule,
                ..
            }
        ));
        assert_eq!(h.client.referrals.status().referred_by, None);
    }
}
