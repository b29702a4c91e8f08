//! # Adapters
//!
//! Gateway implementations the client can run against.

pub mod simulated;

pub use simulated::{Call, Fault, SimulatedBackend, World};

use rl_01_currency::CurrencyGateway;
use rl_02_inventory::InventoryGateway;
use rl_03_achievements::AchievementsGateway;
use rl_04_tasks::TasksGateway;
use rl_05_energy::EnergyGateway;
use rl_06_referrals::ReferralsGateway;
use rl_07_session::SessionGateway;

/// A server reachable through every domain gateway.
pub trait Backend:
    CurrencyGateway
    + InventoryGateway
    + AchievementsGateway
    + TasksGateway
    + EnergyGateway
    + ReferralsGateway
    + SessionGateway
{
}

impl<T> Backend for T where
    T: CurrencyGateway
        + InventoryGateway
        + AchievementsGateway
        + TasksGateway
        + EnergyGateway
        + ReferralsGateway
        + SessionGateway
{
}
