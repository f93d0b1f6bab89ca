//! Virtual timers for simulation.
//!
//! Holds the timers armed through the driver and fires them against the
//! simulated clock. Deadlines are in milliseconds since simulation start.

use std::{collections::BTreeMap, time::Duration};

use safeline_core::{TimerId, TimerMode};

#[derive(Debug, Clone, Copy)]
struct Entry {
    deadline_ms: u64,
    period_ms: u64,
    mode: TimerMode,
}

/// Armed timers keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TimerWheel {
    timers: BTreeMap<TimerId, Entry>,
    fired: u64,
}

impl TimerWheel {
    /// Empty wheel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `id` to fire `period` after `now_ms`. Re-arming replaces.
    pub fn arm(&mut self, id: TimerId, now_ms: u64, period: Duration, mode: TimerMode) {
        // A zero period would fire forever at the same instant.
        let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX).max(1);
        self.timers.insert(id, Entry { deadline_ms: now_ms.saturating_add(period_ms), period_ms, mode });
    }

    /// Disarm `id`. Unknown ids are ignored.
    pub fn cancel(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }

    /// Earliest deadline, if any timer is armed.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.values().map(|e| e.deadline_ms).min()
    }

    /// Fire every timer due at `now_ms`, earliest first.
    ///
    /// Each timer fires at most once per call; repeating timers are
    /// rescheduled one period later, one-shot timers are removed.
    pub fn pop_due(&mut self, now_ms: u64) -> Vec<TimerId> {
        let mut due: Vec<(u64, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, e)| e.deadline_ms <= now_ms)
            .map(|(id, e)| (e.deadline_ms, *id))
            .collect();
        due.sort();

        for (_, id) in &due {
            let Some(entry) = self.timers.get_mut(id) else { continue };
            match entry.mode {
                TimerMode::Repeating => entry.deadline_ms = entry.deadline_ms.saturating_add(entry.period_ms),
                TimerMode::OneShot => {
                    self.timers.remove(id);
                },
            }
        }

        self.fired += due.len() as u64;
        due.into_iter().map(|(_, id)| id).collect()
    }

    /// Armed timer ids.
    pub fn armed(&self) -> Vec<TimerId> {
        self.timers.keys().copied().collect()
    }

    /// Whether nothing is armed.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Total ticks delivered.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}
