//! Display frames and the subscription point for render surfaces.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::timer::{Easing, PhaseEntry};

/// Instruction shown while no session is running.
pub const IDLE_INSTRUCTION: &str = "Ready...";

/// Scale of the breathing shape at rest.
pub const IDENTITY_SCALE: f64 = 1.0;

const CHANNEL_CAPACITY: usize = 64;

/// What a display surface should render after a phase change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayFrame {
    pub instruction_text: String,
    /// Scale at the start of the transition (the previous target).
    pub scale_from: f64,
    pub scale_target: f64,
    pub transition_duration_seconds: f64,
    pub easing: Easing,
    /// `None` for the idle frame.
    pub phase_index: Option<usize>,
    pub cycle: u64,
}

impl DisplayFrame {
    /// Resting frame: placeholder text, snapped back to the identity scale.
    pub fn idle(scale_from: f64) -> Self {
        Self {
            instruction_text: IDLE_INSTRUCTION.to_string(),
            scale_from,
            scale_target: IDENTITY_SCALE,
            transition_duration_seconds: 0.0,
            easing: Easing::Linear,
            phase_index: None,
            cycle: 0,
        }
    }

    pub fn for_phase(entry: &PhaseEntry, scale_from: f64) -> Self {
        Self {
            instruction_text: entry.phase.kind.instruction().to_string(),
            scale_from,
            scale_target: entry.phase.target_scale,
            transition_duration_seconds: entry.phase.duration_secs,
            easing: entry.phase.easing,
            phase_index: Some(entry.index),
            cycle: entry.cycle,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase_index.is_none()
    }

    /// Interpolated scale `elapsed_secs` into the transition.
    pub fn scale_at(&self, elapsed_secs: f64) -> f64 {
        if self.transition_duration_seconds <= 0.0 {
            return self.scale_target;
        }
        let t = self.easing.apply(elapsed_secs / self.transition_duration_seconds);
        self.scale_from + (self.scale_target - self.scale_from) * t
    }
}

impl Default for DisplayFrame {
    fn default() -> Self {
        Self::idle(IDENTITY_SCALE)
    }
}

/// Latest frame plus a broadcast to any number of render surfaces.
///
/// Publishing never blocks and never fails: a surface that is absent or
/// lagging simply misses frames.
#[derive(Debug)]
pub struct DisplayChannel {
    current: DisplayFrame,
    tx: broadcast::Sender<DisplayFrame>,
}

impl DisplayChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            current: DisplayFrame::default(),
            tx,
        }
    }

    pub fn current(&self) -> &DisplayFrame {
        &self.current
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DisplayFrame> {
        self.tx.subscribe()
    }

    pub fn publish(&mut self, frame: DisplayFrame) {
        // No receivers is not an error for the engine.
        let _ = self.tx.send(frame.clone());
        self.current = frame;
    }
}

impl Default for DisplayChannel {
    fn default() -> Self {
        Self::new()
    }
}
