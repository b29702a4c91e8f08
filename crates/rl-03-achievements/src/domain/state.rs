//! # Achievements State
//!
//! Progress is monotonic and capped at the target. Reaching the target
//! unlocks the achievement; claiming is only possible once unlocked.

use super::entities::{Achievement, AchievementBook};
use super::errors::AchievementError;
use shared_bus::ClientEvent;
use shared_optimistic::DomainState;
use shared_types::Domain;
use std::collections::BTreeSet;

/// Mutable achievements state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementsState {
    book: AchievementBook,
}

/// Immutable copy of [`AchievementsState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementsSnapshot {
    /// Every achievement by id.
    pub book: AchievementBook,
}

impl AchievementsState {
    /// State holding `book`.
    pub fn from_book(book: AchievementBook) -> Self {
        Self { book }
    }

    /// One achievement.
    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.book.get(id)
    }

    /// Every achievement.
    pub fn book(&self) -> &AchievementBook {
        &self.book
    }

    fn entry(&self, id: &str) -> Result<&Achievement, AchievementError> {
        self.book
            .get(id)
            .ok_or_else(|| AchievementError::Unknown(id.to_string()))
    }

    /// Check that `value` moves `id` forward. Returns the capped progress.
    pub fn check_progress(&self, id: &str, value: u32) -> Result<u32, AchievementError> {
        let achievement = self.entry(id)?;
        let next = value.min(achievement.target);
        if next <= achievement.progress {
            return Err(AchievementError::NoProgress {
                id: id.to_string(),
                current: achievement.progress,
                reported: value,
            });
        }
        Ok(next)
    }

    /// Advance `id` to `value`, unlocking it at the target.
    pub fn advance(&mut self, id: &str, value: u32) -> Result<(), AchievementError> {
        let next = self.check_progress(id, value)?;
        if let Some(achievement) = self.book.get_mut(id) {
            achievement.progress = next;
            achievement.unlocked = next >= achievement.target;
        }
        Ok(())
    }

    /// Check that the reward of `id` can be claimed.
    pub fn check_claim(&self, id: &str) -> Result<&Achievement, AchievementError> {
        let achievement = self.entry(id)?;
        if achievement.claimed {
            return Err(AchievementError::AlreadyClaimed(id.to_string()));
        }
        if !achievement.unlocked {
            return Err(AchievementError::Locked(id.to_string()));
        }
        Ok(achievement)
    }

    /// Mark the reward of `id` claimed.
    pub fn mark_claimed(&mut self, id: &str) -> Result<(), AchievementError> {
        self.check_claim(id)?;
        if let Some(achievement) = self.book.get_mut(id) {
            achievement.claimed = true;
        }
        Ok(())
    }

    /// Overwrite one achievement with the server's record.
    pub fn set(&mut self, id: &str, achievement: Achievement) {
        self.book.insert(id.to_string(), achievement);
    }

    /// Replace every achievement.
    pub fn replace(&mut self, book: AchievementBook) {
        self.book = book;
    }
}

impl DomainState for AchievementsState {
    type Snapshot = AchievementsSnapshot;
    const DOMAIN: Domain = Domain::Achievements;

    fn snapshot(&self) -> AchievementsSnapshot {
        AchievementsSnapshot {
            book: self.book.clone(),
        }
    }

    fn restore(&mut self, snapshot: AchievementsSnapshot) {
        self.book = snapshot.book;
    }

    fn change_events(
        before: &AchievementsSnapshot,
        after: &AchievementsSnapshot,
        is_optimistic: bool,
    ) -> Vec<ClientEvent> {
        let ids: BTreeSet<&String> = before.book.keys().chain(after.book.keys()).collect();
        ids.into_iter()
            .filter_map(|id| {
                let previous = before.book.get(id);
                let current = after.book.get(id);
                if previous == current {
                    return None;
                }
                // A removed achievement reports as zeroed and locked.
                Some(ClientEvent::AchievementChanged {
                    achievement_id: id.clone(),
                    previous_progress: previous.map_or(0, |a| a.progress),
                    current_progress: current.map_or(0, |a| a.progress),
                    unlocked: current.is_some_and(|a| a.unlocked),
                    claimed: current.is_some_and(|a| a.claimed),
                    is_optimistic,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::CurrencyAmount;

    fn state() -> AchievementsState {
        AchievementsState::from_book(AchievementBook::from([
            ("marathon".to_string(), Achievement::new(10, CurrencyAmount::soft(100))),
            ("collector".to_string(), Achievement::new(3, CurrencyAmount::hard(5))),
        ]))
    }

    #[test]
    fn test_progress_caps_and_unlocks() {
        let mut state = state();
        state.advance("marathon", 25).unwrap();

        let marathon = state.get("marathon").unwrap();
        assert_eq!(marathon.progress, 10);
        assert!(marathon.unlocked);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut state = state();
        state.advance("marathon", 4).unwrap();
        assert_eq!(
            state.advance("marathon", 3),
            Err(AchievementError::NoProgress {
                id: "marathon".into(),
                current: 4,
                reported: 3,
            })
        );
    }

    #[test]
    fn test_progress_beyond_unlocked_target_is_rejected() {
        let mut state = state();
        state.advance("collector", 3).unwrap();
        assert!(matches!(
            state.advance("collector", 9),
            Err(AchievementError::NoProgress { .. })
        ));
    }

    #[test]
    fn test_claim_requires_unlock_once() {
        let mut state = state();
        assert_eq!(
            state.mark_claimed("collector"),
            Err(AchievementError::Locked("collector".into()))
        );
        state.advance("collector", 3).unwrap();
        state.mark_claimed("collector").unwrap();
        assert_eq!(
            state.mark_claimed("collector"),
            Err(AchievementError::AlreadyClaimed("collector".into()))
        );
    }

    #[test]
    fn test_unknown_achievement() {
        assert_eq!(
            state().check_progress("ghost", 1),
            Err(AchievementError::Unknown("ghost".into()))
        );
    }

    #[test]
    fn test_change_event_carries_progress() {
        let mut state = state();
        let before = state.snapshot();
        state.advance("collector", 3).unwrap();

        let events = AchievementsState::change_events(&before, &state.snapshot(), true);
        assert_eq!(
            events,
            vec![ClientEvent::AchievementChanged {
                achievement_id: "collector".into(),
                previous_progress: 0,
                current_progress: 3,
                unlocked: true,
                claimed: false,
                is_optimistic: true,
            }]
        );
    }

    proptest! {
        #[test]
        fn prop_snapshot_restore_identity(reports in proptest::collection::vec(0u32..20, 0..10), claim in any::<bool>()) {
            let mut state = state();
            state.advance("marathon", 2).unwrap();
            let original = state.clone();
            let snapshot = state.snapshot();

            for value in reports {
                let _ = state.advance("marathon", value);
                let _ = state.advance("collector", value);
            }
            if claim {
                let _ = state.mark_claimed("collector");
            }

            state.restore(snapshot);
            prop_assert_eq!(state, original);
        }
    }
}
