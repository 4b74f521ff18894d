mod catalog;
mod clock;
mod sequencer;

pub use catalog::{
    BreathingPattern, Easing, PatternCatalog, PatternId, PhaseCycle, PhaseKind, PhaseSpec,
    MAX_PHASE_DURATION, MIN_PHASE_DURATION,
};
pub use clock::{RunToken, TimerQueue, Wakeup};
pub use sequencer::{PhaseEntry, PhaseSequencer, SequenceHandle};
