//! # Rushlane Offline Simulator
//!
//! Plays one scripted session against the in-memory backend and logs every
//! state change. Useful for watching the optimistic flow end to end.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use client_runtime::{ClientConfig, ClientRuntime, SimulatedBackend, World};
use client_telemetry::{encode_metrics, init_telemetry};
use rl_01_currency::CurrencyApi;
use rl_02_inventory::InventoryApi;
use rl_03_achievements::{Achievement, AchievementsApi};
use rl_04_tasks::{Task, TasksApi};
use rl_05_energy::EnergyApi;
use rl_07_session::{RunResult, SessionApi, SessionRequest};
use shared_bus::{ClientEvent, EventFilter};
use shared_types::{CurrencyAmount, CurrencyType, OperationResult, SystemTimeSource, TimeSource};

fn demo_world(config: &ClientConfig, now: u64) -> World {
    let mut world = World::new_player(config.energy.max_energy, now);
    world.balances.insert(CurrencyType::SoftCurrency, 150);
    world.balances.insert(CurrencyType::HardCurrency, 5);
    world.inventory.owned.insert("board-classic".into());
    world
        .achievements
        .insert("first-run".into(), Achievement::new(1, CurrencyAmount::hard(2)));
    world
        .tasks
        .insert("collect-coins".into(), Task::new(50, CurrencyAmount::soft(25)));
    world.referral_codes.insert("FRIEND2024".into());
    world
}

fn report<T>(step: &str, result: &OperationResult<T>) {
    if result.is_success() {
        info!(step, "ok");
    } else {
        warn!(step, outcome = %result, "failed");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    let _telemetry = init_telemetry(config.telemetry.clone())?;

    info!("===========================================");
    info!("  Rushlane Offline Simulator");
    info!("===========================================");

    let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let backend = Arc::new(SimulatedBackend::new(
        demo_world(&config, clock.now()),
        clock.clone(),
        &config.energy,
    ));
    let runtime = ClientRuntime::new(config, backend.clone(), clock)?;
    let client = runtime.container();

    let mut events = client.bus.subscribe(EventFilter::all());
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                ClientEvent::OperationRolledBack(rollback) => warn!(
                    domain = %rollback.domain,
                    category = ?rollback.category,
                    reason = %rollback.reason,
                    "Rolled back"
                ),
                other => info!(domain = %other.domain(), event = ?other, "Event"),
            }
        }
    });

    runtime.start().await?;

    let price = CurrencyAmount::soft(100);
    report("buy board", &client.inventory.purchase("board-rocket", price).await);
    report("equip board", &client.inventory.equip("board", "board-rocket").await);
    report("spend energy", &client.energy.consume(1, "run").await);

    let ticket = client
        .session
        .start(SessionRequest {
            track_id: "downtown".into(),
            client_version: env!("CARGO_PKG_VERSION").into(),
        })
        .await;
    report("start session", &ticket);
    if !ticket.is_success() {
        runtime.shutdown().await;
        bail!("server refused the session");
    }

    // A run collected 30 coins.
    if let Err(e) = client.tasks.increment("collect-coins", 30) {
        warn!(error = %e, "Task progress refused");
    }
    report(
        "report achievement",
        &client.achievements.report_progress("first-run", 1).await,
    );
    report(
        "submit run",
        &client
            .session
            .submit(RunResult {
                score: 12_400,
                distance: 1_850,
                coins: 30,
            })
            .await,
    );
    report("claim achievement", &client.achievements.claim("first-run").await);
    report("sync tasks", &client.tasks.sync().await);
    report("sync currency", &client.currency.sync().await);

    info!(
        soft = client.currency.balance(CurrencyType::SoftCurrency),
        hard = client.currency.balance(CurrencyType::HardCurrency),
        energy = client.energy.current(),
        "Final state"
    );
    info!(calls = backend.calls().len(), "Server calls made");

    if let Ok(metrics) = encode_metrics() {
        println!("{metrics}");
    }

    runtime.shutdown().await;
    Ok(())
}
