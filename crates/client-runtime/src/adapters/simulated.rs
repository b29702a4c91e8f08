//! # Simulated Backend
//!
//! In-memory authoritative server implementing every domain gateway, for
//! offline play and integration tests.
//!
//! The server enforces the same domain rules as the client, so a client that
//! only issues valid requests stays in agreement with it. Rejections,
//! conflicts, transport errors and latency are scripted per [`Call`].

use async_trait::async_trait;
use parking_lot::Mutex;
use rl_01_currency::{BalanceReceipt, BalanceSheet, CurrencyGateway, CurrencyState};
use rl_02_inventory::{
    InventoryError, InventoryGateway, InventoryRecord, InventoryState, Loadout, PurchaseReceipt,
};
use rl_03_achievements::{
    Achievement, AchievementBook, AchievementError, AchievementsGateway, AchievementsState,
};
use rl_04_tasks::{Task, TaskBook, TaskError, TasksGateway, TasksState};
use rl_05_energy::{EnergyConfig, EnergyError, EnergyGateway, EnergyRecord, EnergyState};
use rl_06_referrals::{Referee, ReferralError, ReferralRecord, ReferralState, ReferralsGateway};
use rl_07_session::{
    RunResult, SessionGateway, SessionReceipt, SessionRequest, SessionTicket,
};
use shared_optimistic::DomainState;
use shared_types::{
    CurrencyAmount, CurrencyType, GatewayError, LedgerEntry, RemoteReply, TimeSource,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Gateway calls faults can be scripted for. Variants mirror the gateway
/// method names.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Call {
    AddCurrency,
    SpendCurrency,
    EquipItem,
    UnequipSlot,
    PurchaseItem,
    ReportProgress,
    ClaimAchievement,
    UpdateProgress,
    ClaimTask,
    ConsumeEnergy,
    RefillEnergy,
    ApplyReferralCode,
    ClaimReferralReward,
    RequestSession,
    SubmitSession,
    CancelSession,
    /// Any `fetch_*` call.
    Fetch,
}

/// A scripted failure for the next matching call.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Answer `RemoteReply::Rejected`.
    Reject(String),
    /// Answer `RemoteReply::Conflict`.
    Conflict(String),
    /// Fail in transport.
    Error(GatewayError),
}

/// One player's authoritative records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct World {
    /// Currency balances.
    pub balances: BalanceSheet,
    /// Owned and equipped items.
    pub inventory: InventoryRecord,
    /// Achievement catalog with progress.
    pub achievements: AchievementBook,
    /// Task catalog with progress.
    pub tasks: TaskBook,
    /// Energy counters.
    pub energy: EnergyRecord,
    /// Referral status.
    pub referrals: ReferralRecord,
    /// Codes of other players that can be applied as referrer.
    pub referral_codes: BTreeSet<String>,
    /// Session the server currently considers live.
    pub active_session: Option<String>,
}

impl World {
    /// A fresh player: no currency, full energy.
    pub fn new_player(max_energy: u32, now: u64) -> Self {
        Self {
            energy: EnergyRecord {
                current: max_energy,
                max: max_energy,
                last_regen_at_ms: now,
            },
            ..Self::default()
        }
    }
}

struct Server {
    currency: CurrencyState,
    inventory: InventoryState,
    achievements: AchievementsState,
    tasks: TasksState,
    energy: EnergyState,
    referrals: ReferralState,
    referral_codes: BTreeSet<String>,
    active_session: Option<String>,
    sessions_issued: u64,
}

impl Server {
    fn from_world(world: World, sessions_issued: u64) -> Self {
        Self {
            currency: CurrencyState::from_balances(world.balances),
            inventory: InventoryState::from_record(world.inventory),
            achievements: AchievementsState::from_book(world.achievements),
            tasks: TasksState::from_book(world.tasks),
            energy: EnergyState::from_record(world.energy),
            referrals: ReferralState::from_record(world.referrals),
            referral_codes: world.referral_codes,
            active_session: world.active_session,
            sessions_issued,
        }
    }

    fn to_world(&self) -> World {
        World {
            balances: self.currency.balances().clone(),
            inventory: InventoryRecord {
                owned: self.inventory.owned().clone(),
                equipped: self.inventory.loadout().clone(),
            },
            achievements: self.achievements.book().clone(),
            tasks: self.tasks.book().clone(),
            energy: self.energy.snapshot(),
            referrals: self.referrals.record().clone(),
            referral_codes: self.referral_codes.clone(),
            active_session: self.active_session.clone(),
        }
    }

    fn credit(&mut self, currency: CurrencyType, amount: u64) -> RemoteReply<BalanceReceipt> {
        self.ledger(LedgerEntry::Credit(CurrencyAmount::new(currency, amount)))
    }

    fn debit(&mut self, currency: CurrencyType, amount: u64) -> RemoteReply<BalanceReceipt> {
        self.ledger(LedgerEntry::Debit(CurrencyAmount::new(currency, amount)))
    }

    fn ledger(&mut self, entry: LedgerEntry) -> RemoteReply<BalanceReceipt> {
        match self.currency.apply(&entry) {
            Ok(balance) => RemoteReply::Accepted(BalanceReceipt {
                currency: entry.amount().currency,
                balance,
            }),
            Err(e) => RemoteReply::Rejected(e.to_string()),
        }
    }
}

/// In-memory game server.
pub struct SimulatedBackend {
    server: Mutex<Server>,
    faults: Mutex<HashMap<Call, VecDeque<Fault>>>,
    latency: Mutex<Duration>,
    call_latency: Mutex<HashMap<Call, Duration>>,
    calls: Mutex<Vec<Call>>,
    clock: Arc<dyn TimeSource>,
    regen_interval_ms: u64,
}

impl SimulatedBackend {
    /// Server holding `world`, regenerating energy per `energy`.
    pub fn new(world: World, clock: Arc<dyn TimeSource>, energy: &EnergyConfig) -> Self {
        Self {
            server: Mutex::new(Server::from_world(world, 0)),
            faults: Mutex::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            call_latency: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            clock,
            regen_interval_ms: energy.regen_interval_ms(),
        }
    }

    /// Fail the next `call` with `fault`. Faults for one call queue in order.
    pub fn inject(&self, call: Call, fault: Fault) {
        self.faults.lock().entry(call).or_default().push_back(fault);
    }

    /// Delay every answer by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Delay answers to `call` by `latency`, overriding [`set_latency`](Self::set_latency).
    pub fn set_call_latency(&self, call: Call, latency: Duration) {
        self.call_latency.lock().insert(call, latency);
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// How many times `call` was received.
    pub fn call_count(&self, call: Call) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Copy of the authoritative records.
    pub fn world(&self) -> World {
        self.server.lock().to_world()
    }

    /// Change the authoritative records directly, as another device would.
    pub fn modify(&self, edit: impl FnOnce(&mut World)) {
        let mut server = self.server.lock();
        let mut world = server.to_world();
        edit(&mut world);
        *server = Server::from_world(world, server.sessions_issued);
    }

    async fn gate(&self, call: Call) -> Option<Fault> {
        self.calls.lock().push(call);
        let latency = self
            .call_latency
            .lock()
            .get(&call)
            .copied()
            .unwrap_or_else(|| *self.latency.lock());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let fault = self
            .faults
            .lock()
            .get_mut(&call)
            .and_then(VecDeque::pop_front);
        if let Some(fault) = &fault {
            debug!(?call, ?fault, "Injecting fault");
        }
        fault
    }

    async fn mutate<T>(
        &self,
        call: Call,
        apply: impl FnOnce(&mut Server) -> RemoteReply<T> + Send,
    ) -> Result<RemoteReply<T>, GatewayError> {
        match self.gate(call).await {
            Some(Fault::Reject(reason)) => Ok(RemoteReply::Rejected(reason)),
            Some(Fault::Conflict(reason)) => Ok(RemoteReply::Conflict(reason)),
            Some(Fault::Error(error)) => Err(error),
            None => Ok(apply(&mut self.server.lock())),
        }
    }

    async fn fetch<T>(
        &self,
        read: impl FnOnce(&mut Server) -> T + Send,
    ) -> Result<T, GatewayError> {
        match self.gate(Call::Fetch).await {
            Some(Fault::Error(error)) => Err(error),
            Some(Fault::Reject(reason) | Fault::Conflict(reason)) => {
                Err(GatewayError::Protocol(reason))
            }
            None => Ok(read(&mut self.server.lock())),
        }
    }

    fn regenerate(&self, server: &mut Server) {
        server
            .energy
            .regenerate(self.clock.now(), self.regen_interval_ms);
    }
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[async_trait]
impl CurrencyGateway for SimulatedBackend {
    async fn add_currency(
        &self,
        currency: CurrencyType,
        amount: u64,
        _reason: &str,
    ) -> Result<RemoteReply<BalanceReceipt>, GatewayError> {
        self.mutate(Call::AddCurrency, |s| s.credit(currency, amount))
            .await
    }

    async fn spend_currency(
        &self,
        currency: CurrencyType,
        amount: u64,
        _reason: &str,
    ) -> Result<RemoteReply<BalanceReceipt>, GatewayError> {
        self.mutate(Call::SpendCurrency, |s| s.debit(currency, amount))
            .await
    }

    async fn fetch_balances(&self) -> Result<BalanceSheet, GatewayError> {
        self.fetch(|s| s.currency.balances().clone()).await
    }
}

#[async_trait]
impl InventoryGateway for SimulatedBackend {
    async fn equip_item(
        &self,
        slot: &str,
        item: &str,
    ) -> Result<RemoteReply<Loadout>, GatewayError> {
        self.mutate(Call::EquipItem, |s| match s.inventory.equip(slot, item) {
            Ok(()) => RemoteReply::Accepted(s.inventory.loadout().clone()),
            Err(e @ InventoryError::AlreadyEquipped { .. }) => RemoteReply::Conflict(e.to_string()),
            Err(e) => RemoteReply::Rejected(e.to_string()),
        })
        .await
    }

    async fn unequip_slot(&self, slot: &str) -> Result<RemoteReply<Loadout>, GatewayError> {
        self.mutate(Call::UnequipSlot, |s| match s.inventory.unequip(slot) {
            Ok(_) => RemoteReply::Accepted(s.inventory.loadout().clone()),
            Err(e) => RemoteReply::Rejected(e.to_string()),
        })
        .await
    }

    async fn purchase_item(
        &self,
        item: &str,
        price: CurrencyAmount,
    ) -> Result<RemoteReply<PurchaseReceipt>, GatewayError> {
        self.mutate(Call::PurchaseItem, |s| match s.inventory.grant(item) {
            Ok(()) => RemoteReply::Accepted(PurchaseReceipt {
                item_id: item.to_string(),
                price,
            }),
            Err(e @ InventoryError::AlreadyOwned(_)) => RemoteReply::Conflict(e.to_string()),
            Err(e) => RemoteReply::Rejected(e.to_string()),
        })
        .await
    }

    async fn fetch_inventory(&self) -> Result<InventoryRecord, GatewayError> {
        self.fetch(|s| InventoryRecord {
            owned: s.inventory.owned().clone(),
            equipped: s.inventory.loadout().clone(),
        })
        .await
    }
}

#[async_trait]
impl AchievementsGateway for SimulatedBackend {
    async fn report_progress(
        &self,
        id: &str,
        progress: u32,
    ) -> Result<RemoteReply<Achievement>, GatewayError> {
        self.mutate(Call::ReportProgress, |s| {
            match s.achievements.advance(id, progress) {
                Ok(()) => match s.achievements.get(id) {
                    Some(achievement) => RemoteReply::Accepted(*achievement),
                    None => RemoteReply::Rejected(format!("unknown achievement {id}")),
                },
                Err(e @ AchievementError::NoProgress { .. }) => {
                    RemoteReply::Conflict(e.to_string())
                }
                Err(e) => RemoteReply::Rejected(e.to_string()),
            }
        })
        .await
    }

    async fn claim_achievement(&self, id: &str) -> Result<RemoteReply<Achievement>, GatewayError> {
        self.mutate(Call::ClaimAchievement, |s| {
            match s.achievements.mark_claimed(id) {
                Ok(()) => match s.achievements.get(id) {
                    Some(achievement) => RemoteReply::Accepted(*achievement),
                    None => RemoteReply::Rejected(format!("unknown achievement {id}")),
                },
                Err(e @ AchievementError::AlreadyClaimed(_)) => {
                    RemoteReply::Conflict(e.to_string())
                }
                Err(e) => RemoteReply::Rejected(e.to_string()),
            }
        })
        .await
    }

    async fn fetch_achievements(&self) -> Result<AchievementBook, GatewayError> {
        self.fetch(|s| s.achievements.book().clone()).await
    }
}

#[async_trait]
impl TasksGateway for SimulatedBackend {
    async fn update_progress(
        &self,
        deltas: &BTreeMap<String, u64>,
    ) -> Result<RemoteReply<TaskBook>, GatewayError> {
        self.mutate(Call::UpdateProgress, |s| {
            // All or nothing.
            let mut next = s.tasks.clone();
            for (id, delta) in deltas {
                if let Err(e) = next.increment(id, saturating_u32(*delta)) {
                    return RemoteReply::Rejected(e.to_string());
                }
            }
            s.tasks = next;
            let touched = deltas
                .keys()
                .filter_map(|id| s.tasks.get(id).map(|task| (id.clone(), *task)))
                .collect();
            RemoteReply::Accepted(touched)
        })
        .await
    }

    async fn claim_task(&self, id: &str) -> Result<RemoteReply<Task>, GatewayError> {
        self.mutate(Call::ClaimTask, |s| match s.tasks.mark_claimed(id) {
            Ok(()) => match s.tasks.get(id) {
                Some(task) => RemoteReply::Accepted(*task),
                None => RemoteReply::Rejected(format!("unknown task {id}")),
            },
            Err(e @ TaskError::AlreadyClaimed(_)) => RemoteReply::Conflict(e.to_string()),
            Err(e) => RemoteReply::Rejected(e.to_string()),
        })
        .await
    }

    async fn fetch_tasks(&self) -> Result<TaskBook, GatewayError> {
        self.fetch(|s| s.tasks.book().clone()).await
    }
}

#[async_trait]
impl EnergyGateway for SimulatedBackend {
    async fn consume_energy(
        &self,
        amount: u32,
        _reason: &str,
    ) -> Result<RemoteReply<EnergyRecord>, GatewayError> {
        let now = self.clock.now();
        self.mutate(Call::ConsumeEnergy, |s| {
            self.regenerate(s);
            match s.energy.consume(amount, now) {
                Ok(_) => RemoteReply::Accepted(s.energy.snapshot()),
                Err(e) => RemoteReply::Rejected(e.to_string()),
            }
        })
        .await
    }

    async fn refill_energy(
        &self,
        _price: CurrencyAmount,
    ) -> Result<RemoteReply<EnergyRecord>, GatewayError> {
        let now = self.clock.now();
        self.mutate(Call::RefillEnergy, |s| {
            self.regenerate(s);
            match s.energy.refill(now) {
                Ok(()) => RemoteReply::Accepted(s.energy.snapshot()),
                Err(e @ EnergyError::AlreadyFull) => RemoteReply::Conflict(e.to_string()),
                Err(e) => RemoteReply::Rejected(e.to_string()),
            }
        })
        .await
    }

    async fn fetch_energy(&self) -> Result<EnergyRecord, GatewayError> {
        self.fetch(|s| {
            self.regenerate(s);
            s.energy.snapshot()
        })
        .await
    }
}

#[async_trait]
impl ReferralsGateway for SimulatedBackend {
    async fn apply_referral_code(
        &self,
        code: &str,
    ) -> Result<RemoteReply<ReferralRecord>, GatewayError> {
        self.mutate(Call::ApplyReferralCode, |s| {
            if !s.referral_codes.contains(code) {
                return RemoteReply::Rejected(format!("No player with referral code {code}"));
            }
            match s.referrals.apply_code(code) {
                Ok(()) => RemoteReply::Accepted(s.referrals.record().clone()),
                Err(e @ ReferralError::AlreadyReferred(_)) => RemoteReply::Conflict(e.to_string()),
                Err(e) => RemoteReply::Rejected(e.to_string()),
            }
        })
        .await
    }

    async fn claim_referral_reward(
        &self,
        referee: &str,
    ) -> Result<RemoteReply<Referee>, GatewayError> {
        self.mutate(Call::ClaimReferralReward, |s| {
            match s.referrals.mark_claimed(referee) {
                Ok(()) => match s.referrals.referee(referee) {
                    Some(entry) => RemoteReply::Accepted(*entry),
                    None => RemoteReply::Rejected(format!("unknown referee {referee}")),
                },
                Err(e @ ReferralError::AlreadyClaimed(_)) => RemoteReply::Conflict(e.to_string()),
                Err(e) => RemoteReply::Rejected(e.to_string()),
            }
        })
        .await
    }

    async fn fetch_referrals(&self) -> Result<ReferralRecord, GatewayError> {
        self.fetch(|s| s.referrals.record().clone()).await
    }
}

#[async_trait]
impl SessionGateway for SimulatedBackend {
    async fn request_session(
        &self,
        request: &SessionRequest,
    ) -> Result<RemoteReply<SessionTicket>, GatewayError> {
        let now = self.clock.now();
        self.mutate(Call::RequestSession, |s| {
            if let Some(active) = &s.active_session {
                return RemoteReply::Conflict(format!("session {active} still active"));
            }
            s.sessions_issued += 1;
            let session_id = format!("sim-{}-{}", request.track_id, s.sessions_issued);
            s.active_session = Some(session_id.clone());
            RemoteReply::Accepted(SessionTicket {
                session_id,
                seed: s.sessions_issued.wrapping_mul(0x9E37_79B9_7F4A_7C15),
                issued_at_ms: now,
            })
        })
        .await
    }

    async fn submit_session(
        &self,
        session_id: &str,
        result: &RunResult,
    ) -> Result<RemoteReply<SessionReceipt>, GatewayError> {
        let result = *result;
        self.mutate(Call::SubmitSession, |s| {
            if s.active_session.as_deref() != Some(session_id) {
                return RemoteReply::Rejected(format!("unknown session {session_id}"));
            }
            let reward = CurrencyAmount::soft(u64::from(result.coins));
            if reward.amount > 0 {
                if let RemoteReply::Rejected(reason) =
                    s.credit(reward.currency, reward.amount)
                {
                    return RemoteReply::Rejected(reason);
                }
            }
            s.active_session = None;
            RemoteReply::Accepted(SessionReceipt {
                session_id: session_id.to_string(),
                accepted_score: result.score,
                reward,
            })
        })
        .await
    }

    async fn cancel_session(&self, session_id: &str) -> Result<(), GatewayError> {
        match self.gate(Call::CancelSession).await {
            Some(Fault::Error(error)) => Err(error),
            Some(Fault::Reject(reason) | Fault::Conflict(reason)) => {
                Err(GatewayError::Protocol(reason))
            }
            None => {
                let mut server = self.server.lock();
                if server.active_session.as_deref() == Some(session_id) {
                    server.active_session = None;
                }
                Ok(())
            }
        }
    }
}
