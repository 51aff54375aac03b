//! Deferred tasks keyed by match time, and the match countdown.
//!
//! Wall-clock callbacks (the one-second countdown, the attack-window close)
//! are modelled as entries in a [`TimerQueue`]. The match controller drains
//! due entries at the start of each frame, so nothing runs behind its back
//! and tearing a match down is a single [`TimerQueue::clear`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::input::Side;

/// Interval between countdown ticks.
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

/// Frame rate of the virtual clock used for deterministic runs.
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Match time at which frame `index` runs under a fixed `rate_hz` clock.
///
/// Computed from the index rather than accumulated, so there is no drift.
#[must_use]
pub fn frame_timestamp(index: u64, rate_hz: u32) -> Duration {
    let nanos = u128::from(index) * 1_000_000_000 / u128::from(rate_hz.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// Work the match controller can defer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchTask {
    /// Decrement the countdown and reschedule.
    CountdownTick,
    /// End a fighter's attack window.
    CloseAttackWindow(Side),
}

/// Opaque handle returned by [`TimerQueue::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
struct Entry<T> {
    due: Duration,
    seq: u64,
    task: T,
}

/// Cancellable queue of tasks ordered by deadline.
///
/// Entries with equal deadlines fire in scheduling order. The queue only
/// ever holds a handful of entries, so a linear scan is used instead of a
/// heap; this keeps cancellation trivial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerQueue<T> {
    entries: Vec<Entry<T>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `task` to become due at `due`.
    pub fn schedule(&mut self, due: Duration, task: T) -> TimerHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { due, seq, task });
        TimerHandle(seq)
    }

    /// Cancel a pending task. Returns false if it already fired, was
    /// already cancelled, or never existed.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.iter().position(|e| e.seq == handle.0) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove and return the earliest task due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.seq))
            .map(|(idx, _)| idx)?;
        let entry = self.entries.remove(idx);
        Some((entry.due, entry.task))
    }

    /// Deadline of the earliest pending task.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Whether `handle` is still pending.
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.seq == handle.0)
    }

    /// Number of pending tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending task.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Seconds-remaining countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Countdown {
    remaining: u32,
}

impl Countdown {
    /// Start a countdown at `seconds`.
    #[must_use]
    pub const fn new(seconds: u32) -> Self {
        Self { remaining: seconds }
    }

    /// Seconds left.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether the countdown has reached zero.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Apply one tick. Returns the new value if it changed; at zero the
    /// tick is a no-op.
    pub fn tick(&mut self) -> Option<u32> {
        if self.remaining > 0 {
            self.remaining -= 1;
            Some(self.remaining)
        } else {
            None
        }
    }
}
