//! # Tasks State

use super::entities::{Task, TaskBook};
use super::errors::TaskError;
use shared_bus::ClientEvent;
use shared_optimistic::DomainState;
use shared_types::Domain;
use std::collections::{BTreeMap, BTreeSet};

/// Mutable tasks state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TasksState {
    book: TaskBook,
}

/// Immutable copy of [`TasksState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TasksSnapshot {
    /// Every task by id.
    pub book: TaskBook,
}

fn clamp(delta: u64) -> u32 {
    u32::try_from(delta).unwrap_or(u32::MAX)
}

impl TasksState {
    /// State holding `book`.
    pub fn from_book(book: TaskBook) -> Self {
        Self { book }
    }

    /// One task.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.book.get(id)
    }

    /// Every task.
    pub fn book(&self) -> &TaskBook {
        &self.book
    }

    fn entry(&self, id: &str) -> Result<&Task, TaskError> {
        self.book
            .get(id)
            .ok_or_else(|| TaskError::Unknown(id.to_string()))
    }

    /// Add `delta` to the progress of `id`. Returns the new progress.
    pub fn increment(&mut self, id: &str, delta: u32) -> Result<u32, TaskError> {
        if delta == 0 {
            return Err(TaskError::ZeroDelta);
        }
        if self.entry(id)?.claimed {
            return Err(TaskError::AlreadyClaimed(id.to_string()));
        }
        let task = self
            .book
            .get_mut(id)
            .ok_or_else(|| TaskError::Unknown(id.to_string()))?;
        task.progress = task.progress.saturating_add(delta);
        Ok(task.progress)
    }

    /// Subtract refused deltas, flooring at zero.
    pub fn retract(&mut self, deltas: &BTreeMap<String, u64>) {
        for (id, delta) in deltas {
            if let Some(task) = self.book.get_mut(id) {
                task.progress = task.progress.saturating_sub(clamp(*delta));
            }
        }
    }

    /// Adopt the server's records, keeping deltas not yet acknowledged.
    pub fn acknowledge(&mut self, records: TaskBook, still_pending: &BTreeMap<String, u64>) {
        for (id, mut task) in records {
            let unsent = still_pending.get(&id).copied().unwrap_or(0);
            task.progress = task.progress.saturating_add(clamp(unsent));
            self.book.insert(id, task);
        }
    }

    /// Check that the reward of `id` can be claimed.
    pub fn check_claim(&self, id: &str) -> Result<&Task, TaskError> {
        let task = self.entry(id)?;
        if task.claimed {
            return Err(TaskError::AlreadyClaimed(id.to_string()));
        }
        if !task.is_completed() {
            return Err(TaskError::Incomplete {
                id: id.to_string(),
                progress: task.progress,
                target: task.target,
            });
        }
        Ok(task)
    }

    /// Mark the reward of `id` claimed.
    pub fn mark_claimed(&mut self, id: &str) -> Result<(), TaskError> {
        self.check_claim(id)?;
        if let Some(task) = self.book.get_mut(id) {
            task.claimed = true;
        }
        Ok(())
    }

    /// Overwrite one task with the server's record.
    pub fn set(&mut self, id: &str, task: Task) {
        self.book.insert(id.to_string(), task);
    }

    /// Replace every task.
    pub fn replace(&mut self, book: TaskBook) {
        self.book = book;
    }

    /// Replace every task with the server's book, keeping deltas the server
    /// has not seen yet.
    pub fn resync(&mut self, book: TaskBook, unsent: &BTreeMap<String, u64>) {
        self.book.clear();
        self.acknowledge(book, unsent);
    }

    /// Put back the record `id` had in `snapshot`, leaving every other task
    /// as it is now.
    pub fn restore_task(&mut self, id: &str, snapshot: &TasksSnapshot) {
        match snapshot.book.get(id) {
            Some(task) => self.set(id, *task),
            None => {
                self.book.remove(id);
            }
        }
    }
}

impl DomainState for TasksState {
    type Snapshot = TasksSnapshot;
    const DOMAIN: Domain = Domain::Tasks;

    fn snapshot(&self) -> TasksSnapshot {
        TasksSnapshot {
            book: self.book.clone(),
        }
    }

    fn restore(&mut self, snapshot: TasksSnapshot) {
        self.book = snapshot.book;
    }

    fn change_events(
        before: &TasksSnapshot,
        after: &TasksSnapshot,
        is_optimistic: bool,
    ) -> Vec<ClientEvent> {
        let ids: BTreeSet<&String> = before.book.keys().chain(after.book.keys()).collect();
        ids.into_iter()
            .filter_map(|id| {
                let previous = before.book.get(id);
                let current = after.book.get(id);
                (previous != current).then(|| ClientEvent::TaskChanged {
                    task_id: id.clone(),
                    previous_progress: previous.map_or(0, |t| t.progress),
                    current_progress: current.map_or(0, |t| t.progress),
                    completed: current.is_some_and(Task::is_completed),
                    claimed: current.is_some_and(|t| t.claimed),
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

    fn state() -> TasksState {
        TasksState::from_book(TaskBook::from([
            ("T1".to_string(), Task::new(7, CurrencyAmount::soft(20))),
            ("T2".to_string(), Task::new(100, CurrencyAmount::soft(5))),
        ]))
    }

    #[test]
    fn test_increment_sums() {
        let mut state = state();
        assert_eq!(state.increment("T1", 3), Ok(3));
        assert_eq!(state.increment("T1", 4), Ok(7));
        assert!(state.get("T1").unwrap().is_completed());
    }

    #[test]
    fn test_increment_rejects_zero_and_unknown() {
        let mut state = state();
        assert_eq!(state.increment("T1", 0), Err(TaskError::ZeroDelta));
        assert_eq!(
            state.increment("T9", 1),
            Err(TaskError::Unknown("T9".into()))
        );
    }

    #[test]
    fn test_retract_floors_at_zero() {
        let mut state = state();
        state.increment("T2", 2).unwrap();
        state.retract(&BTreeMap::from([("T2".to_string(), 5)]));
        assert_eq!(state.get("T2").unwrap().progress, 0);
    }

    #[test]
    fn test_acknowledge_keeps_unsent_deltas() {
        let mut state = state();
        let mut server = Task::new(100, CurrencyAmount::soft(5));
        server.progress = 10;

        state.acknowledge(
            TaskBook::from([("T2".to_string(), server)]),
            &BTreeMap::from([("T2".to_string(), 3)]),
        );
        assert_eq!(state.get("T2").unwrap().progress, 13);
    }

    #[test]
    fn test_resync_keeps_unsent_deltas() {
        let mut state = state();
        let server = TaskBook::from([("T1".to_string(), Task::new(10, CurrencyAmount::soft(5)))]);

        state.resync(server, &BTreeMap::from([("T1".to_string(), 2)]));

        assert_eq!(state.get("T1").map(|t| t.progress), Some(2));
        assert_eq!(state.book().len(), 1);
    }

    #[test]
    fn test_restore_task_leaves_others() {
        let mut state = state();
        state.increment("T1", 7).unwrap();
        let before = state.snapshot();

        state.mark_claimed("T1").unwrap();
        state.increment("T2", 3).unwrap();
        state.restore_task("T1", &before);

        assert_eq!(state.get("T1"), before.book.get("T1"));
        assert_eq!(state.get("T2").map(|t| t.progress), Some(3));
    }

    #[test]
    fn test_claim_requires_completion() {
        let mut state = state();
        assert!(matches!(
            state.mark_claimed("T1"),
            Err(TaskError::Incomplete { progress: 0, target: 7, .. })
        ));
        state.increment("T1", 7).unwrap();
        state.mark_claimed("T1").unwrap();
        assert_eq!(
            state.increment("T1", 1),
            Err(TaskError::AlreadyClaimed("T1".into()))
        );
    }

    proptest! {
        #[test]
        fn prop_snapshot_restore_identity(deltas in proptest::collection::vec(1u32..50, 0..10)) {
            let mut state = state();
            state.increment("T2", 1).unwrap();
            let original = state.clone();
            let snapshot = state.snapshot();

            for delta in &deltas {
                let _ = state.increment("T1", *delta);
                let _ = state.increment("T2", *delta);
            }
            let _ = state.mark_claimed("T1");

            state.restore(snapshot);
            prop_assert_eq!(state, original);
        }

        #[test]
        fn prop_retract_undoes_increments(start in 0u32..1_000, deltas in proptest::collection::vec(1u32..50, 1..10)) {
            let mut state = state();
            if start > 0 {
                state.increment("T2", start).unwrap();
            }
            let mut sent = BTreeMap::new();
            for delta in &deltas {
                state.increment("T2", *delta).unwrap();
                *sent.entry("T2".to_string()).or_insert(0u64) += u64::from(*delta);
            }

            state.retract(&sent);
            prop_assert_eq!(state.get("T2").unwrap().progress, start);
        }
    }
}
