//! Session controller.
//!
//! Owns the lifecycle of one breathing session per display surface and is
//! the only component callers talk to. It bridges sequencer phase entries to
//! side effects: instruction text, scale transition, haptic pulse.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Stopped -> Running -> ...
//!            \__ select_pattern: Running -> Stopped -> Running (new token)
//! ```
//!
//! Redundant control calls (start while running, stop while not running)
//! are no-ops returning `None`, so UI re-renders can call them freely.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::display::{DisplayChannel, DisplayFrame};
use super::haptics::HapticPort;
use crate::error::InvalidPatternError;
use crate::events::Event;
use crate::storage::Config;
use crate::timer::{
    BreathingPattern, PatternCatalog, PatternId, PhaseEntry, PhaseSequencer, RunToken,
    SequenceHandle, TimerQueue, Wakeup,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Idle,
    Running,
    Stopped,
}

/// Mutable session state, owned by exactly one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub active_pattern: PatternId,
    pub haptics_enabled: bool,
    /// Index into the active pattern's phases. Valid while running.
    pub cycle_position: usize,
    /// `RunToken::NONE` unless running.
    pub run_token: RunToken,
    pub status: SessionStatus,
}

pub struct SessionController {
    state: SessionState,
    catalog: &'static PatternCatalog,
    sequencer: PhaseSequencer,
    handle: Option<SequenceHandle>,
    timers: TimerQueue,
    /// Timer offset at which the current phase was entered.
    phase_started_at: Duration,
    /// `PhaseEntered` for the phase in progress; `None` unless running.
    current_phase: Option<Event>,
    haptics: Box<dyn HapticPort>,
    display: DisplayChannel,
}

impl SessionController {
    pub fn new(pattern: PatternId, haptics_enabled: bool, haptics: impl HapticPort + 'static) -> Self {
        Self {
            state: SessionState {
                active_pattern: pattern,
                haptics_enabled,
                cycle_position: 0,
                run_token: RunToken::NONE,
                status: SessionStatus::Idle,
            },
            catalog: PatternCatalog::builtin(),
            sequencer: PhaseSequencer::new(),
            handle: None,
            timers: TimerQueue::new(),
            phase_started_at: Duration::ZERO,
            current_phase: None,
            haptics: Box::new(haptics),
            display: DisplayChannel::new(),
        }
    }

    /// Controller seeded with the user's saved preferences.
    pub fn from_config(config: &Config, haptics: impl HapticPort + 'static) -> Self {
        Self::new(config.pattern, config.haptics_enabled, haptics)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.state.status
    }

    pub fn is_running(&self) -> bool {
        self.state.status == SessionStatus::Running
    }

    pub fn active_pattern(&self) -> &BreathingPattern {
        self.catalog.get(self.state.active_pattern)
    }

    /// Latest frame published to display surfaces.
    pub fn display(&self) -> &DisplayFrame {
        self.display.current()
    }

    /// Receive a frame on every phase change and on stop.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplayFrame> {
        self.display.subscribe()
    }

    /// The `PhaseEntered` event of the phase in progress.
    ///
    /// Phase 0 is entered inside `start_session` and `select_pattern`, which
    /// report the lifecycle event instead; this is where callers find it.
    pub fn current_phase_event(&self) -> Option<&Event> {
        self.current_phase.as_ref()
    }

    /// Scale the surface should be showing right now.
    pub fn current_scale(&self) -> f64 {
        let elapsed = self.timers.now().saturating_sub(self.phase_started_at);
        self.display.current().scale_at(elapsed.as_secs_f64())
    }

    /// Session clock: offset since the controller was created.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    pub fn cycles_completed(&self) -> u64 {
        if self.is_running() {
            self.sequencer.cycles_completed()
        } else {
            0
        }
    }

    /// Wake-ups still queued for the live run. At most one while running.
    pub fn outstanding_wakeups(&self) -> usize {
        self.timers.outstanding(self.state.run_token)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Make `id` the active pattern. A running session restarts on it at
    /// phase 0 with a fresh run token.
    pub fn select_pattern(&mut self, id: PatternId) -> Option<Event> {
        let changed = id != self.state.active_pattern;
        self.state.active_pattern = id;

        if self.is_running() {
            tracing::info!(pattern = %id, "restarting session on new pattern");
            self.halt();
            self.begin_run();
            return Some(Event::PatternSelected {
                pattern: id,
                restarted: true,
                at: Utc::now(),
            });
        }

        changed.then(|| Event::PatternSelected {
            pattern: id,
            restarted: false,
            at: Utc::now(),
        })
    }

    /// Select a pattern from free text.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPatternError`] if `name` is not a catalog pattern;
    /// the session is left untouched.
    pub fn select_pattern_named(&mut self, name: &str) -> Result<Option<Event>, InvalidPatternError> {
        let id = name.parse::<PatternId>()?;
        Ok(self.select_pattern(id))
    }

    /// Flip the haptics preference. Read at each phase entry; the schedule
    /// is left running as is.
    pub fn set_haptics_enabled(&mut self, enabled: bool) -> Option<Event> {
        if self.state.haptics_enabled == enabled {
            return None;
        }
        self.state.haptics_enabled = enabled;
        tracing::debug!(enabled, "haptics preference changed");
        Some(Event::HapticsChanged {
            enabled,
            at: Utc::now(),
        })
    }

    pub fn start_session(&mut self) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        tracing::info!(pattern = %self.state.active_pattern, "breathing session started");
        self.begin_run();
        Some(Event::SessionStarted {
            pattern: self.state.active_pattern,
            haptics_enabled: self.state.haptics_enabled,
            at: Utc::now(),
        })
    }

    pub fn stop_session(&mut self) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        let cycles_completed = self.sequencer.cycles_completed();
        let from = self.current_scale();
        self.halt();
        self.phase_started_at = self.timers.now();
        self.display.publish(DisplayFrame::idle(from));
        tracing::info!(
            pattern = %self.state.active_pattern,
            cycles_completed,
            "breathing session stopped"
        );
        Some(Event::SessionStopped {
            pattern: self.state.active_pattern,
            cycles_completed,
            at: Utc::now(),
        })
    }

    /// Deliver one fired wake-up. Stale wake-ups produce nothing.
    pub fn handle_wakeup(&mut self, wakeup: Wakeup) -> Option<Event> {
        let entry = self.sequencer.on_wake(wakeup, &mut self.timers)?;
        Some(self.enter_phase(entry))
    }

    /// Simulated clock: move time forward by `by`, delivering every wake-up
    /// that falls due, in order.
    pub fn advance(&mut self, by: Duration) -> Vec<Event> {
        let until = self.timers.now().saturating_add(by);
        self.advance_to(until)
    }

    /// Deliver every wake-up due at or before `until`.
    ///
    /// Each handler runs to completion before the next wake-up is looked
    /// at, so wake-ups it schedules inside the window are delivered too.
    pub fn advance_to(&mut self, until: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(wakeup) = self.timers.pop_due(until) {
            events.extend(self.handle_wakeup(wakeup));
        }
        self.timers.advance_to(until);
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_run(&mut self) -> Event {
        let cycle = self.catalog.get(self.state.active_pattern).cycle.clone();
        let (handle, entry) = self.sequencer.start(cycle, &mut self.timers);
        self.state.run_token = handle.token();
        self.state.status = SessionStatus::Running;
        self.handle = Some(handle);
        self.enter_phase(entry)
    }

    fn halt(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
        self.state.status = SessionStatus::Stopped;
        self.state.cycle_position = 0;
        self.state.run_token = RunToken::NONE;
        self.current_phase = None;
    }

    fn enter_phase(&mut self, entry: PhaseEntry) -> Event {
        let from = self.current_scale();
        self.state.cycle_position = entry.index;
        self.phase_started_at = self.timers.now();
        self.display.publish(DisplayFrame::for_phase(&entry, from));

        if self.state.haptics_enabled {
            self.haptics.pulse();
        }

        tracing::debug!(
            pattern = %self.state.active_pattern,
            phase = entry.phase.kind.instruction(),
            index = entry.index,
            cycle = entry.cycle,
            "phase entered"
        );

        let event = Event::PhaseEntered {
            pattern: self.state.active_pattern,
            phase: entry.phase.kind,
            phase_index: entry.index,
            cycle: entry.cycle,
            duration_secs: entry.phase.duration_secs,
            target_scale: entry.phase.target_scale,
            first_of_cycle: entry.first_of_cycle,
            at: Utc::now(),
        };
        self.current_phase = Some(event.clone());
        event
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.sequencer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::display::{IDENTITY_SCALE, IDLE_INSTRUCTION};
    use crate::session::haptics::NoHaptics;
    use crate::timer::PhaseKind;

    fn controller(pattern: PatternId) -> SessionController {
        SessionController::new(pattern, true, NoHaptics)
    }

    #[test]
    fn starts_idle() {
        let ctl = controller(PatternId::Coherence);
        assert_eq!(ctl.status(), SessionStatus::Idle);
        assert_eq!(ctl.display().instruction_text, IDLE_INSTRUCTION);
        assert_eq!(ctl.state().run_token, RunToken::NONE);
    }

    #[test]
    fn start_updates_display_immediately() {
        let mut ctl = controller(PatternId::Relax478);
        assert!(ctl.start_session().is_some());
        assert_eq!(ctl.status(), SessionStatus::Running);
        assert_eq!(ctl.display().instruction_text, "Inhale");
        assert_eq!(ctl.display().scale_target, 1.5);
        assert_eq!(ctl.display().transition_duration_seconds, 4.0);
        assert_eq!(ctl.outstanding_wakeups(), 1);
    }

    #[test]
    fn current_phase_event_tracks_the_run() {
        let mut ctl = controller(PatternId::Coherence);
        assert!(ctl.current_phase_event().is_none());

        ctl.start_session();
        assert!(matches!(
            ctl.current_phase_event(),
            Some(Event::PhaseEntered { phase: PhaseKind::Inhale, phase_index: 0, .. })
        ));

        ctl.advance(Duration::from_secs(5));
        assert!(matches!(
            ctl.current_phase_event(),
            Some(Event::PhaseEntered { phase: PhaseKind::Exhale, phase_index: 1, .. })
        ));

        ctl.stop_session();
        assert!(ctl.current_phase_event().is_none());
    }

    #[test]
    fn double_start_and_stop_are_noops() {
        let mut ctl = controller(PatternId::Coherence);
        assert!(ctl.stop_session().is_none());
        assert!(ctl.start_session().is_some());
        let token = ctl.state().run_token;
        assert!(ctl.start_session().is_none());
        assert_eq!(ctl.state().run_token, token);
        assert!(ctl.stop_session().is_some());
        assert!(ctl.stop_session().is_none());
        assert_eq!(ctl.status(), SessionStatus::Stopped);
    }

    #[test]
    fn stop_resets_display_and_silences_timers() {
        let mut ctl = controller(PatternId::BoxFocus);
        ctl.start_session();
        ctl.advance(Duration::from_secs(5));
        ctl.stop_session();

        assert_eq!(ctl.display().instruction_text, IDLE_INSTRUCTION);
        assert_eq!(ctl.display().scale_target, IDENTITY_SCALE);
        assert_eq!(ctl.current_scale(), IDENTITY_SCALE);
        assert!(ctl.advance(Duration::from_secs(60)).is_empty());
        assert_eq!(ctl.display().instruction_text, IDLE_INSTRUCTION);
    }

    #[test]
    fn select_while_idle_does_not_start() {
        let mut ctl = controller(PatternId::Coherence);
        let event = ctl.select_pattern(PatternId::BoxFocus);
        assert!(matches!(event, Some(Event::PatternSelected { restarted: false, .. })));
        assert!(ctl.select_pattern(PatternId::BoxFocus).is_none());
        assert_eq!(ctl.status(), SessionStatus::Idle);
        assert_eq!(ctl.next_due(), None);
    }

    #[test]
    fn select_while_running_issues_fresh_token() {
        let mut ctl = controller(PatternId::Coherence);
        ctl.start_session();
        let first = ctl.state().run_token;
        ctl.advance(Duration::from_secs(6));
        assert_eq!(ctl.state().cycle_position, 1);

        let event = ctl.select_pattern(PatternId::Relax478);
        assert!(matches!(event, Some(Event::PatternSelected { restarted: true, .. })));
        assert_ne!(ctl.state().run_token, first);
        assert_eq!(ctl.state().cycle_position, 0);
        assert_eq!(ctl.outstanding_wakeups(), 1);
    }

    #[test]
    fn select_named_rejects_unknown_without_side_effects() {
        let mut ctl = controller(PatternId::Coherence);
        ctl.start_session();
        let token = ctl.state().run_token;
        let err = ctl.select_pattern_named("wim-hof").unwrap_err();
        assert_eq!(err.input, "wim-hof");
        assert_eq!(ctl.state().active_pattern, PatternId::Coherence);
        assert_eq!(ctl.state().run_token, token);
    }

    #[test]
    fn restart_interpolates_from_visible_scale() {
        let mut ctl = controller(PatternId::BoxFocus);
        ctl.start_session();
        ctl.advance(Duration::from_secs(2));
        ctl.select_pattern(PatternId::Coherence);
        // Linear 1.0 -> 1.5 over 4s, halfway.
        assert_eq!(ctl.display().scale_from, 1.25);
        assert_eq!(ctl.display().scale_target, 1.5);
    }

    #[test]
    fn haptics_toggle_is_idempotent() {
        let mut ctl = controller(PatternId::Coherence);
        assert!(ctl.set_haptics_enabled(true).is_none());
        assert!(ctl.set_haptics_enabled(false).is_some());
        assert!(!ctl.state().haptics_enabled);
    }
}
