//! # Service Container
//!
//! Every domain service, wired in dependency order:
//!
//! ```text
//! Level 0: event bus
//! Level 1: currency (the ledger)
//! Level 2: inventory, achievements, tasks, energy, referrals (hold the ledger)
//! Level 2: session (bus only)
//! ```
//!
//! Domains never lock each other's state; claims and purchases go through
//! the currency service's `Ledger` port.

use crate::adapters::Backend;
use crate::container::config::{ClientConfig, ConfigError};
use anyhow::bail;
use rl_01_currency::{CurrencyApi, CurrencyService};
use rl_02_inventory::{InventoryApi, InventoryService};
use rl_03_achievements::{AchievementsApi, AchievementsService};
use rl_04_tasks::{TasksApi, TasksService};
use rl_05_energy::{EnergyApi, EnergyService};
use rl_06_referrals::{ReferralsApi, ReferralsService};
use rl_07_session::{SessionApi, SessionService};
use shared_bus::{EventPublisher, InMemoryEventBus};
use shared_types::{Domain, OperationResult, TimeSource};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The ledger every claiming domain credits and debits through.
pub type LedgerService<B> = CurrencyService<B>;

/// Outcome of syncing one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainReport {
    /// Domain that was synced.
    pub domain: Domain,
    /// Sync outcome.
    pub outcome: OperationResult<()>,
}

/// Central container holding all domain services.
pub struct ClientContainer<B: Backend> {
    /// Event bus every domain publishes on.
    pub bus: Arc<InMemoryEventBus>,
    /// Currency; also the ledger of the other domains.
    pub currency: Arc<LedgerService<B>>,
    /// Inventory.
    pub inventory: Arc<InventoryService<B, LedgerService<B>>>,
    /// Achievements.
    pub achievements: Arc<AchievementsService<B, LedgerService<B>>>,
    /// Tasks.
    pub tasks: Arc<TasksService<B, LedgerService<B>>>,
    /// Energy.
    pub energy: Arc<EnergyService<B, LedgerService<B>>>,
    /// Referrals.
    pub referrals: Arc<ReferralsService<B, LedgerService<B>>>,
    /// Run sessions.
    pub session: Arc<SessionService<B>>,
    config: ClientConfig,
}

impl<B: Backend> ClientContainer<B> {
    /// Validate `config` and build every service against `backend`.
    #[instrument(name = "client_init", skip_all)]
    pub fn new(
        config: ClientConfig,
        backend: Arc<B>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(bus_capacity = config.bus_capacity, "Initializing client container");

        let bus = Arc::new(InMemoryEventBus::with_capacity(config.bus_capacity));
        let publisher: Arc<dyn EventPublisher> = bus.clone();

        let currency = Arc::new(CurrencyService::new(backend.clone(), publisher.clone()));

        let container = Self {
            inventory: Arc::new(InventoryService::new(
                backend.clone(),
                currency.clone(),
                publisher.clone(),
            )),
            achievements: Arc::new(AchievementsService::new(
                backend.clone(),
                currency.clone(),
                publisher.clone(),
            )),
            tasks: Arc::new(TasksService::new(
                &config.tasks,
                backend.clone(),
                currency.clone(),
                publisher.clone(),
            )),
            energy: Arc::new(EnergyService::new(
                &config.energy,
                backend.clone(),
                currency.clone(),
                clock,
                publisher.clone(),
            )),
            referrals: Arc::new(ReferralsService::new(
                backend.clone(),
                currency.clone(),
                publisher.clone(),
            )),
            session: Arc::new(SessionService::new(backend, publisher)),
            currency,
            bus,
            config,
        };
        info!("Client container ready");
        Ok(container)
    }

    /// Configuration the container was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Overwrite one domain with the server's state.
    pub async fn sync_domain(&self, domain: Domain) -> OperationResult<()> {
        match domain {
            Domain::Currency => self.currency.sync().await,
            Domain::Inventory => self.inventory.sync().await,
            Domain::Achievements => self.achievements.sync().await,
            Domain::Tasks => self.tasks.sync().await,
            Domain::Energy => self.energy.sync().await,
            Domain::Referrals => self.referrals.sync().await,
            Domain::Session => OperationResult::ValidationError(
                "session state is never cached locally".to_string(),
            ),
        }
    }

    /// Sync every cached domain concurrently.
    pub async fn sync_all(&self) -> Vec<DomainReport> {
        let (currency, inventory, achievements, tasks, energy, referrals) = tokio::join!(
            self.currency.sync(),
            self.inventory.sync(),
            self.achievements.sync(),
            self.tasks.sync(),
            self.energy.sync(),
            self.referrals.sync(),
        );
        [
            (Domain::Currency, currency),
            (Domain::Inventory, inventory),
            (Domain::Achievements, achievements),
            (Domain::Tasks, tasks),
            (Domain::Energy, energy),
            (Domain::Referrals, referrals),
        ]
        .into_iter()
        .map(|(domain, outcome)| DomainReport { domain, outcome })
        .collect()
    }

    /// Load every domain at sign-in. Fails if any domain could not sync.
    pub async fn bootstrap(&self) -> anyhow::Result<()> {
        let failures: Vec<String> = self
            .sync_all()
            .await
            .into_iter()
            .filter(|report| !report.outcome.is_success())
            .map(|report| {
                let reason = report.outcome.failure_reason().unwrap_or("cancelled");
                warn!(domain = %report.domain, reason, "Bootstrap sync failed");
                format!("{}: {reason}", report.domain)
            })
            .collect();

        if !failures.is_empty() {
            bail!("bootstrap sync failed ({})", failures.join(", "));
        }
        info!("Client bootstrapped");
        Ok(())
    }

    /// Drop every domain's state (sign-out). In-flight operations finish as
    /// `Cancelled`.
    pub fn sign_out(&self) {
        self.session.reset();
        self.tasks.reset();
        self.currency.reset();
        self.inventory.reset();
        self.achievements.reset();
        self.energy.reset();
        self.referrals.reset();
        info!("Signed out; all domain state reset");
    }
}
