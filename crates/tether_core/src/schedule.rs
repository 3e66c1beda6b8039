//! Resumable timed tasks advanced once per fixed step.
//!
//! A pending task is a remaining duration plus a continuation value that the
//! owner interprets when the task fires. At most one task is pending per key:
//! scheduling under an occupied key replaces the old task (a restart), and
//! `cancel` removes it. Timing is integer microseconds, like animation
//! playback, so replays fire on identical steps on every platform.

use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Pending<T> {
    remaining_us: u64,
    continuation: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<K: Ord + Copy, T> {
    pending: BTreeMap<K, Pending<T>>,
}

impl<K: Ord + Copy, T> Scheduler<K, T> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
        }
    }

    /// Schedule `continuation` to fire after `duration_us`. Returns the
    /// continuation this replaced, if a task was already pending under `key`.
    pub fn schedule(&mut self, key: K, duration_us: u64, continuation: T) -> Option<T> {
        self.pending
            .insert(
                key,
                Pending {
                    remaining_us: duration_us,
                    continuation,
                },
            )
            .map(|old| old.continuation)
    }

    pub fn cancel(&mut self, key: K) -> Option<T> {
        self.pending.remove(&key).map(|p| p.continuation)
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn remaining_us(&self, key: K) -> Option<u64> {
        self.pending.get(&key).map(|p| p.remaining_us)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Advance every task by `dt_us` and return the continuations that came
    /// due, in key order. A zero-duration task fires on the next advance.
    pub fn advance(&mut self, dt_us: u64) -> Vec<T> {
        let mut due = Vec::new();
        for (key, task) in self.pending.iter_mut() {
            task.remaining_us = task.remaining_us.saturating_sub(dt_us);
            if task.remaining_us == 0 {
                due.push(*key);
            }
        }

        due.into_iter()
            .filter_map(|key| self.pending.remove(&key))
            .map(|task| task.continuation)
            .collect()
    }
}

impl<K: Ord + Copy, T> Default for Scheduler<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    enum Key {
        A,
        B,
    }

    #[test]
    fn task_fires_after_its_duration() {
        let mut scheduler: Scheduler<Key, &str> = Scheduler::new();
        scheduler.schedule(Key::A, 30, "done");
        assert!(scheduler.advance(10).is_empty());
        assert!(scheduler.advance(10).is_empty());
        assert_eq!(scheduler.advance(10), vec!["done"]);
        assert!(!scheduler.is_pending(Key::A));
    }

    #[test]
    fn rescheduling_restarts_instead_of_stacking() {
        let mut scheduler: Scheduler<Key, u32> = Scheduler::new();
        scheduler.schedule(Key::A, 30, 1);
        scheduler.advance(20);
        let replaced = scheduler.schedule(Key::A, 30, 2);
        assert_eq!(replaced, Some(1));
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.advance(20).is_empty());
        assert_eq!(scheduler.remaining_us(Key::A), Some(10));
        assert_eq!(scheduler.advance(10), vec![2]);
    }

    #[test]
    fn cancel_removes_pending_task() {
        let mut scheduler: Scheduler<Key, u32> = Scheduler::new();
        scheduler.schedule(Key::A, 5, 1);
        assert_eq!(scheduler.cancel(Key::A), Some(1));
        assert_eq!(scheduler.cancel(Key::A), None);
        assert!(scheduler.advance(100).is_empty());
    }

    #[test]
    fn due_tasks_fire_in_key_order() {
        let mut scheduler: Scheduler<Key, &str> = Scheduler::new();
        scheduler.schedule(Key::B, 10, "b");
        scheduler.schedule(Key::A, 5, "a");
        assert_eq!(scheduler.advance(10), vec!["a", "b"]);
        assert!(scheduler.is_empty());
    }
}
