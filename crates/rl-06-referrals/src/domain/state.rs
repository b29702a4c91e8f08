//! # Referral State

use super::entities::{Referee, ReferralRecord, MAX_CODE_LEN, MIN_CODE_LEN};
use super::errors::ReferralError;
use shared_bus::ClientEvent;
use shared_optimistic::DomainState;
use shared_types::Domain;
use std::collections::BTreeSet;

/// Mutable referral state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferralState {
    record: ReferralRecord,
}

/// Immutable copy of [`ReferralState`].
pub type ReferralSnapshot = ReferralRecord;

/// Check code syntax: 4-16 ASCII letters or digits.
pub fn validate_code(code: &str) -> Result<(), ReferralError> {
    let len = code.chars().count();
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
        return Err(ReferralError::InvalidLength(len));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ReferralError::NotAlphanumeric);
    }
    Ok(())
}

impl ReferralState {
    /// State mirroring a server record.
    pub fn from_record(record: ReferralRecord) -> Self {
        Self { record }
    }

    /// Full local status.
    pub fn record(&self) -> &ReferralRecord {
        &self.record
    }

    /// One referred player.
    pub fn referee(&self, id: &str) -> Option<&Referee> {
        self.record.referees.get(id)
    }

    /// Check that `code` may be applied.
    pub fn check_code(&self, code: &str) -> Result<(), ReferralError> {
        validate_code(code)?;
        if let Some(existing) = &self.record.referred_by {
            return Err(ReferralError::AlreadyReferred(existing.clone()));
        }
        if self
            .record
            .own_code
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(code))
        {
            return Err(ReferralError::OwnCode);
        }
        Ok(())
    }

    /// Record `code` as this player's referrer.
    pub fn apply_code(&mut self, code: &str) -> Result<(), ReferralError> {
        self.check_code(code)?;
        self.record.referred_by = Some(code.to_string());
        Ok(())
    }

    /// Check that the reward for `referee` can be claimed.
    pub fn check_claim(&self, referee: &str) -> Result<&Referee, ReferralError> {
        let entry = self
            .referee(referee)
            .ok_or_else(|| ReferralError::UnknownReferee(referee.to_string()))?;
        if entry.claimed {
            return Err(ReferralError::AlreadyClaimed(referee.to_string()));
        }
        Ok(entry)
    }

    /// Mark the reward for `referee` claimed.
    pub fn mark_claimed(&mut self, referee: &str) -> Result<(), ReferralError> {
        self.check_claim(referee)?;
        if let Some(entry) = self.record.referees.get_mut(referee) {
            entry.claimed = true;
        }
        Ok(())
    }

    /// Overwrite one referee with the server's record.
    pub fn set_referee(&mut self, id: &str, referee: Referee) {
        self.record.referees.insert(id.to_string(), referee);
    }

    /// Replace everything with a server record.
    pub fn replace(&mut self, record: ReferralRecord) {
        self.record = record;
    }
}

impl DomainState for ReferralState {
    type Snapshot = ReferralSnapshot;
    const DOMAIN: Domain = Domain::Referrals;

    fn snapshot(&self) -> ReferralSnapshot {
        self.record.clone()
    }

    fn restore(&mut self, snapshot: ReferralSnapshot) {
        self.record = snapshot;
    }

    fn change_events(
        before: &ReferralSnapshot,
        after: &ReferralSnapshot,
        is_optimistic: bool,
    ) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        if before.referred_by != after.referred_by {
            events.push(ClientEvent::ReferralChanged {
                previous: before.referred_by.clone(),
                current: after.referred_by.clone(),
                is_optimistic,
            });
        }

        let ids: BTreeSet<&String> = before
            .referees
            .keys()
            .chain(after.referees.keys())
            .collect();
        events.extend(ids.into_iter().filter_map(|id| {
            let previous = before.referees.get(id);
            let current = after.referees.get(id);
            (previous != current).then(|| ClientEvent::RefereeChanged {
                referee_id: id.clone(),
                claimed: current.is_some_and(|r| r.claimed),
                is_optimistic,
            })
        }));
        events
    }
}
