//! Shared setup for the integration flows.

use client_runtime::{ClientConfig, ClientContainer, SimulatedBackend, World};
use rl_03_achievements::Achievement;
use rl_04_tasks::Task;
use shared_types::{CurrencyAmount, CurrencyType, ManualTimeSource};
use std::sync::Arc;

/// Energy cap used by every fixture.
pub const MAX_ENERGY: u32 = 5;

/// Player with some currency, one item, one achievement and one task.
pub fn standard_world() -> World {
    let mut world = World::new_player(MAX_ENERGY, 0);
    world.balances.insert(CurrencyType::SoftCurrency, 250);
    world.balances.insert(CurrencyType::HardCurrency, 100);
    world.inventory.owned.insert("board-classic".into());
    world.achievements.insert(
        "first-run".into(),
        Achievement::new(1, CurrencyAmount::hard(5)),
    );
    world
        .tasks
        .insert("collect-7".into(), Task::new(7, CurrencyAmount::soft(10)));
    world.referral_codes.insert("FRIEND2024".into());
    world
}

/// A bootstrapped client and everything needed to poke at it.
pub struct Harness {
    /// Server side.
    pub backend: Arc<SimulatedBackend>,
    /// Client side.
    pub client: Arc<ClientContainer<SimulatedBackend>>,
    /// Clock shared by both.
    pub clock: Arc<ManualTimeSource>,
}

impl Harness {
    /// Client over `world`, not yet synced.
    pub fn new(world: World) -> Self {
        let config = ClientConfig::for_testing();
        let clock = Arc::new(ManualTimeSource::new(0));
        let backend = Arc::new(SimulatedBackend::new(world, clock.clone(), &config.energy));
        let client = ClientContainer::new(config, backend.clone(), clock.clone())
            .expect("test config is valid");
        Self {
            backend,
            client: Arc::new(client),
            clock,
        }
    }

    /// Client over [`standard_world`], synced.
    pub async fn bootstrapped() -> Self {
        let harness = Self::new(standard_world());
        harness
            .client
            .bootstrap()
            .await
            .expect("bootstrap against a healthy backend");
        harness
    }

    /// Server-side balance.
    pub fn server_balance(&self, currency: CurrencyType) -> u64 {
        self.backend
            .world()
            .balances
            .get(&currency)
            .copied()
            .unwrap_or_default()
    }
}
