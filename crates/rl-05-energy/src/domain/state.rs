//! # Energy State
//!
//! One unit regenerates per interval up to the cap. Regeneration is derived
//! from `last_regen_at_ms`, so restoring a snapshot also restores the clock
//! and no regeneration is lost.

use super::entities::EnergyRecord;
use super::errors::EnergyError;
use shared_bus::ClientEvent;
use shared_optimistic::DomainState;
use shared_types::{Domain, Timestamp};

/// Mutable energy state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnergyState {
    current: u32,
    max: u32,
    last_regen_at_ms: Timestamp,
}

/// Immutable copy of [`EnergyState`].
pub type EnergySnapshot = EnergyRecord;

impl EnergyState {
    /// Full energy at `now`.
    pub fn full(max: u32, now: Timestamp) -> Self {
        Self {
            current: max,
            max,
            last_regen_at_ms: now,
        }
    }

    /// State mirroring a server record.
    pub fn from_record(record: EnergyRecord) -> Self {
        Self {
            current: record.current,
            max: record.max,
            last_regen_at_ms: record.last_regen_at_ms,
        }
    }

    /// Energy available.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// Energy cap.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// When regeneration was last accounted.
    pub fn last_regen_at_ms(&self) -> Timestamp {
        self.last_regen_at_ms
    }

    /// Credit whole intervals elapsed since the last accounting. Returns the
    /// number of units gained.
    pub fn regenerate(&mut self, now: Timestamp, interval_ms: u64) -> u32 {
        if self.current >= self.max {
            self.last_regen_at_ms = now;
            return 0;
        }
        if interval_ms == 0 || now <= self.last_regen_at_ms {
            return 0;
        }

        let intervals = (now - self.last_regen_at_ms) / interval_ms;
        let room = self.max - self.current;
        let gained = u32::try_from(intervals).unwrap_or(u32::MAX).min(room);
        if gained == 0 {
            return 0;
        }

        self.current += gained;
        if self.current >= self.max {
            self.last_regen_at_ms = now;
        } else {
            // Keep the partial interval already elapsed.
            self.last_regen_at_ms += u64::from(gained) * interval_ms;
        }
        gained
    }

    /// Check that `amount` can be spent.
    pub fn check_consume(&self, amount: u32) -> Result<(), EnergyError> {
        if amount == 0 {
            return Err(EnergyError::ZeroAmount);
        }
        if self.current < amount {
            return Err(EnergyError::Insufficient {
                current: self.current,
                required: amount,
            });
        }
        Ok(())
    }

    /// Spend `amount`. Spending from full starts the regeneration clock.
    pub fn consume(&mut self, amount: u32, now: Timestamp) -> Result<u32, EnergyError> {
        self.check_consume(amount)?;
        if self.current >= self.max {
            self.last_regen_at_ms = now;
        }
        self.current -= amount;
        Ok(self.current)
    }

    /// Check that a refill would add something.
    pub fn check_refill(&self) -> Result<(), EnergyError> {
        if self.current >= self.max {
            return Err(EnergyError::AlreadyFull);
        }
        Ok(())
    }

    /// Fill to the cap.
    pub fn refill(&mut self, now: Timestamp) -> Result<(), EnergyError> {
        self.check_refill()?;
        self.current = self.max;
        self.last_regen_at_ms = now;
        Ok(())
    }

    /// Replace everything with a server record.
    pub fn replace(&mut self, record: EnergyRecord) {
        *self = Self::from_record(record);
    }
}

impl DomainState for EnergyState {
    type Snapshot = EnergySnapshot;
    const DOMAIN: Domain = Domain::Energy;

    fn snapshot(&self) -> EnergySnapshot {
        EnergyRecord {
            current: self.current,
            max: self.max,
            last_regen_at_ms: self.last_regen_at_ms,
        }
    }

    fn restore(&mut self, snapshot: EnergySnapshot) {
        *self = Self::from_record(snapshot);
    }

    fn change_events(
        before: &EnergySnapshot,
        after: &EnergySnapshot,
        is_optimistic: bool,
    ) -> Vec<ClientEvent> {
        // Clock-only changes are not user visible.
        if before.current == after.current && before.max == after.max {
            return Vec::new();
        }
        vec![ClientEvent::EnergyChanged {
            previous: before.current,
            current: after.current,
            max: after.max,
            is_optimistic,
        }]
    }
}
