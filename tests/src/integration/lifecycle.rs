//! # Lifecycle
//!
//! Bootstrap, conflict-driven resync, regeneration over time and sign-out.

#[cfg(test)]
mod tests {
    use super::super::fixtures::{standard_world, Harness, MAX_ENERGY};
    use client_runtime::{Call, ClientConfig, ClientRuntime, Fault, SimulatedBackend};
    use rl_01_currency::CurrencyApi;
    use rl_02_inventory::InventoryApi;
    use rl_04_tasks::TasksApi;
    use rl_05_energy::EnergyApi;
    use shared_bus::{ClientEvent, EventFilter};
    use shared_types::{
        CurrencyType, Domain, GatewayError, ManualTimeSource, OperationResult, RollbackCategory,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    const MINUTE: u64 = 60_000;

    #[tokio::test]
    async fn test_sync_all_reports_each_domain() {
        let h = Harness::new(standard_world());
        h.backend.inject(
            Call::Fetch,
            Fault::Error(GatewayError::Unavailable("edge down".into())),
        );

        let reports = h.client.sync_all().await;

        assert_eq!(reports.len(), 6);
        let failed: Vec<_> = reports.iter().filter(|r| !r.outcome.is_success()).collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].outcome.is_retryable());

        // The second attempt finds the backend healthy.
        h.client.bootstrap().await.expect("healthy backend");
        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 250);
    }

    #[tokio::test]
    async fn test_conflict_triggers_resync_through_runtime() {
        let config = ClientConfig::for_testing();
        let clock = Arc::new(ManualTimeSource::new(0));
        let mut world = standard_world();
        world.inventory.owned.insert("board-lava".into());
        let backend = Arc::new(SimulatedBackend::new(world, clock.clone(), &config.energy));
        let runtime = ClientRuntime::new(config, backend.clone(), clock).expect("valid config");
        runtime.start().await.expect("healthy backend");
        let client = runtime.container();

        backend.modify(|world| {
            world
                .inventory
                .equipped
                .insert("board".into(), "board-lava".into());
        });
        backend.inject(Call::EquipItem, Fault::Conflict("loadout changed".into()));
        let mut inventory = client.bus.subscribe(EventFilter::domains(&[Domain::Inventory]));

        let result = client.inventory.equip("board", "board-classic").await;
        assert!(matches!(
            result,
            OperationResult::RolledBack {
                category: RollbackCategory::StateConflict,
                ..
            }
        ));

        let resynced = timeout(Duration::from_secs(1), async {
            while let Some(event) = inventory.recv().await {
                if matches!(event, ClientEvent::SyncCompleted { .. }) {
                    return true;
                }
            }
            false
        })
        .await
        .expect("resync within a second");
        assert!(resynced);
        assert_eq!(
            client.inventory.equipped("board").as_deref(),
            Some("board-lava")
        );

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_energy_regenerates_with_the_clock() {
        let h = Harness::bootstrapped().await;
        assert!(h.client.energy.consume(MAX_ENERGY, "marathon").await.is_success());
        assert_eq!(h.client.energy.current(), 0);

        let interval = ClientConfig::for_testing().energy.regen_interval_ms();
        h.clock.advance(2 * interval);
        assert_eq!(h.client.energy.regenerate(), 2);

        // Server and client agree after a sync.
        assert!(h.client.energy.sync().await.is_success());
        assert_eq!(h.client.energy.current(), 2);

        h.clock.advance(60 * MINUTE * 24);
        assert_eq!(h.client.energy.regenerate(), MAX_ENERGY);
    }

    #[tokio::test]
    async fn test_sign_out_cancels_in_flight_operation() {
        let h = Harness::bootstrapped().await;
        h.backend.set_latency(Duration::from_millis(20));

        let (result, ()) = tokio::join!(
            h.client.currency.spend(CurrencyType::SoftCurrency, 50, "hat"),
            async {
                tokio::task::yield_now().await;
                h.client.sign_out();
            }
        );

        assert_eq!(result, OperationResult::Cancelled);
        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 0);
    }

    #[tokio::test]
    async fn test_sign_out_drops_pending_task_progress() {
        let h = Harness::bootstrapped().await;
        h.client.tasks.increment("collect-7", 4).expect("known task");

        h.client.sign_out();

        assert!(h.client.tasks.pending_deltas().is_empty());
        assert!(h.client.tasks.all().is_empty());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(h.backend.call_count(Call::UpdateProgress), 0);
    }

    #[tokio::test]
    async fn test_sign_in_again_after_sign_out() {
        let h = Harness::bootstrapped().await;
        assert!(h
            .client
            .currency
            .spend(CurrencyType::SoftCurrency, 50, "hat")
            .await
            .is_success());
        h.client.sign_out();

        h.client.bootstrap().await.expect("healthy backend");

        assert_eq!(h.client.currency.balance(CurrencyType::SoftCurrency), 200);
        assert!(h.client.inventory.owns("board-classic"));
    }
}
