//! Serial wake-up queue.
//!
//! Time is a monotonic offset from the moment the queue was created. The
//! queue never fires anything itself: a driver (the simulated clock in
//! `SessionController::advance` or the tokio loop in `SessionDriver`) pops
//! due wake-ups and hands them back to the session one at a time.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Generation number for one sequencing run.
///
/// Tokens only grow. `RunToken::NONE` never names a live run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunToken(u64);

impl RunToken {
    pub const NONE: RunToken = RunToken(0);

    pub(crate) fn from_raw(raw: u64) -> Self {
        RunToken(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> RunToken {
        RunToken(self.0.wrapping_add(1).max(1))
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// A scheduled phase advance.
///
/// Ordered by due time, then by scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Wakeup {
    pub due: Duration,
    seq: u64,
    pub token: RunToken,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    seq: u64,
    pending: BinaryHeap<Reverse<Wakeup>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule a one-shot wake-up `after` from now.
    pub fn schedule(&mut self, after: Duration, token: RunToken) -> Wakeup {
        self.seq += 1;
        let wakeup = Wakeup {
            due: self.now.saturating_add(after),
            seq: self.seq,
            token,
        };
        self.pending.push(Reverse(wakeup));
        wakeup
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.pending.peek().map(|Reverse(w)| w.due)
    }

    /// Pop the earliest wake-up due at or before `until`, moving `now` to
    /// its due time.
    pub fn pop_due(&mut self, until: Duration) -> Option<Wakeup> {
        if self.next_due()? > until {
            return None;
        }
        let Reverse(wakeup) = self.pending.pop()?;
        self.now = self.now.max(wakeup.due);
        Some(wakeup)
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, t: Duration) {
        self.now = self.now.max(t);
    }

    /// Number of pending wake-ups still carrying `token`.
    pub fn outstanding(&self, token: RunToken) -> usize {
        self.pending
            .iter()
            .filter(|Reverse(w)| w.token == token)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: RunToken = RunToken(1);

    #[test]
    fn pops_in_due_order() {
        let mut q = TimerQueue::new();
        q.schedule(Duration::from_secs(7), T1);
        q.schedule(Duration::from_secs(4), T1);
        assert_eq!(q.next_due(), Some(Duration::from_secs(4)));

        let first = q.pop_due(Duration::from_secs(10)).unwrap();
        assert_eq!(first.due, Duration::from_secs(4));
        assert_eq!(q.now(), Duration::from_secs(4));

        let second = q.pop_due(Duration::from_secs(10)).unwrap();
        assert_eq!(second.due, Duration::from_secs(7));
        assert!(q.pop_due(Duration::from_secs(10)).is_none());
    }

    #[test]
    fn nothing_pops_before_due() {
        let mut q = TimerQueue::new();
        q.schedule(Duration::from_secs(5), T1);
        assert!(q.pop_due(Duration::from_millis(4_999)).is_none());
        assert!(q.pop_due(Duration::from_secs(5)).is_some());
    }

    #[test]
    fn equal_due_keeps_scheduling_order() {
        let mut q = TimerQueue::new();
        q.schedule(Duration::from_secs(1), RunToken(1));
        q.schedule(Duration::from_secs(1), RunToken(2));
        assert_eq!(q.pop_due(Duration::MAX).unwrap().token, RunToken(1));
        assert_eq!(q.pop_due(Duration::MAX).unwrap().token, RunToken(2));
    }

    #[test]
    fn schedule_is_relative_to_now() {
        let mut q = TimerQueue::new();
        q.advance_to(Duration::from_secs(3));
        let w = q.schedule(Duration::from_secs(4), T1);
        assert_eq!(w.due, Duration::from_secs(7));
        q.advance_to(Duration::from_secs(1));
        assert_eq!(q.now(), Duration::from_secs(3));
    }

    #[test]
    fn token_next_skips_none() {
        assert_eq!(RunToken::NONE.next(), RunToken(1));
        assert_eq!(RunToken(u64::MAX).next(), RunToken(1));
    }
}
