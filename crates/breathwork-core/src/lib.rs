//! # Breathwork Core Library
//!
//! This library provides the session engine behind guided breathing. Given
//! a breathing pattern, it drives a repeating sequence of timed phases
//! (inhale, hold, exhale, hold). Each phase entry publishes an instruction
//! and a scale target to the display and optionally fires a haptic pulse.
//!
//! ## Architecture
//!
//! - **Pattern Catalog**: the fixed set of patterns and their phase tables
//! - **Phase Sequencer**: one-shot wake-up chain rescheduled per phase, with
//!   generation tokens so cancelled runs can never fire again
//! - **Session Controller**: start/stop/restart lifecycle and side effects
//! - **Driver**: tokio loop that feeds wall-clock wake-ups to the controller
//!
//! ## Key Components
//!
//! - [`SessionController`]: the control surface callers talk to
//! - [`PhaseSequencer`]: the phase state machine
//! - [`PatternCatalog`]: pattern registry
//! - [`Config`]: persisted preferences

pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, InvalidPatternError, ValidationError};
pub use events::Event;
pub use session::{
    DisplayFrame, HapticPort, NoHaptics, SessionController, SessionDriver, SessionState,
    SessionStatus, TracingHaptics,
};
pub use storage::Config;
pub use timer::{
    BreathingPattern, Easing, PatternCatalog, PatternId, PhaseCycle, PhaseKind, PhaseSequencer,
    PhaseSpec, RunToken,
};
