//! Phase sequencer.
//!
//! Turns a [`PhaseCycle`] into a live, cancellable chain of one-shot
//! wake-ups. Phases have heterogeneous durations (4-7-8 is 4s, 7s, 8s), so
//! there is no fixed period: every wake-up schedules the next one using the
//! duration of the phase it just entered.
//!
//! ```text
//! start ──► enter 0 ──(d0)──► enter 1 ──(d1)──► ... ──► enter 0 ──► ...
//! ```
//!
//! Cancellation is by generation token. A wake-up is only honoured if its
//! token is still the live one, so a wake-up that was already queued when
//! the run was cancelled or replaced is dropped at the top of [`on_wake`].
//!
//! [`on_wake`]: PhaseSequencer::on_wake

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::catalog::{PhaseCycle, PhaseSpec};
use super::clock::{RunToken, TimerQueue, Wakeup};

/// Notification produced each time a phase is entered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseEntry {
    pub phase: PhaseSpec,
    pub index: usize,
    /// Completed cycles before this entry.
    pub cycle: u64,
    pub first_of_cycle: bool,
    pub token: RunToken,
}

/// Cancellable token for one running chain of phase advances.
#[derive(Debug, Clone)]
pub struct SequenceHandle {
    token: RunToken,
    live: Arc<AtomicU64>,
}

impl SequenceHandle {
    pub fn token(&self) -> RunToken {
        self.token
    }

    /// Invalidate the run. Returns false if it was already cancelled or
    /// superseded; calling twice is harmless.
    pub fn cancel(&self) -> bool {
        self.live
            .compare_exchange(
                self.token.get(),
                RunToken::NONE.get(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire) == self.token.get()
    }
}

#[derive(Debug)]
struct Run {
    token: RunToken,
    cycle: PhaseCycle,
    position: usize,
    cycles_completed: u64,
}

impl Run {
    fn entry(&self) -> Option<PhaseEntry> {
        let phase = *self.cycle.get(self.position)?;
        Some(PhaseEntry {
            phase,
            index: self.position,
            cycle: self.cycles_completed,
            first_of_cycle: self.position == 0,
            token: self.token,
        })
    }
}

#[derive(Debug, Default)]
pub struct PhaseSequencer {
    live: Arc<AtomicU64>,
    last_token: RunToken,
    run: Option<Run>,
}

impl PhaseSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn live_token(&self) -> RunToken {
        RunToken::from_raw(self.live.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        match &self.run {
            Some(run) => run.token == self.live_token(),
            None => false,
        }
    }

    /// Index of the current phase, while running.
    pub fn position(&self) -> Option<usize> {
        self.live_run().map(|run| run.position)
    }

    pub fn cycles_completed(&self) -> u64 {
        self.run.as_ref().map(|run| run.cycles_completed).unwrap_or(0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a new run at phase 0.
    ///
    /// Any previous run is cancelled first. The entry for phase 0 is
    /// returned immediately so the caller can render it with no latency;
    /// the first wake-up is scheduled after phase 0's duration.
    pub fn start(&mut self, cycle: PhaseCycle, timers: &mut TimerQueue) -> (SequenceHandle, PhaseEntry) {
        self.cancel();

        let token = self.last_token.next();
        self.last_token = token;
        self.live.store(token.get(), Ordering::Release);

        let first = cycle.phases()[0];
        let run = Run {
            token,
            cycle,
            position: 0,
            cycles_completed: 0,
        };
        timers.schedule(first.duration(), token);
        tracing::debug!(token = %token, phases = run.cycle.len(), "sequencer started");

        let entry = PhaseEntry {
            phase: first,
            index: 0,
            cycle: 0,
            first_of_cycle: true,
            token,
        };
        self.run = Some(run);
        (
            SequenceHandle {
                token,
                live: Arc::clone(&self.live),
            },
            entry,
        )
    }

    /// Cancel the live run, if any.
    pub fn cancel(&mut self) -> bool {
        let token = self.live.swap(RunToken::NONE.get(), Ordering::AcqRel);
        token != RunToken::NONE.get()
    }

    /// Handle a fired wake-up.
    ///
    /// Stale wake-ups (cancelled or superseded runs) are no-ops. Otherwise
    /// the run advances one phase, schedules the next wake-up with the new
    /// phase's own duration, and returns the entry.
    pub fn on_wake(&mut self, wakeup: Wakeup, timers: &mut TimerQueue) -> Option<PhaseEntry> {
        let live = self.live_token();
        if wakeup.token != live || live == RunToken::NONE {
            tracing::debug!(token = %wakeup.token, live = %live, "dropping stale wake-up");
            return None;
        }
        let run = self.run.as_mut().filter(|run| run.token == live)?;

        run.position = run.cycle.next_index(run.position);
        if run.position == 0 {
            run.cycles_completed += 1;
        }
        let entry = run.entry()?;
        timers.schedule(entry.phase.duration(), run.token);
        Some(entry)
    }

    fn live_run(&self) -> Option<&Run> {
        let live = self.live_token();
        self.run.as_ref().filter(|run| run.token == live)
    }
}
