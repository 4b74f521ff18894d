use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{PatternId, PhaseKind};

/// Every state change of a breathing session produces an Event.
/// Control operations return `None` instead when they were no-ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        pattern: PatternId,
        haptics_enabled: bool,
        at: DateTime<Utc>,
    },
    PhaseEntered {
        pattern: PatternId,
        phase: PhaseKind,
        phase_index: usize,
        cycle: u64,
        duration_secs: f64,
        target_scale: f64,
        first_of_cycle: bool,
        at: DateTime<Utc>,
    },
    /// The active pattern changed. `restarted` is true when a running
    /// session was moved onto the new pattern.
    PatternSelected {
        pattern: PatternId,
        restarted: bool,
        at: DateTime<Utc>,
    },
    HapticsChanged {
        enabled: bool,
        at: DateTime<Utc>,
    },
    SessionStopped {
        pattern: PatternId,
        cycles_completed: u64,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::HapticsChanged {
            enabled: false,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "HapticsChanged");
        assert_eq!(json["enabled"], false);
    }

    #[test]
    fn phase_entered_serializes_ids() {
        let event = Event::PhaseEntered {
            pattern: PatternId::Relax478,
            phase: PhaseKind::HoldAfterInhale,
            phase_index: 1,
            cycle: 0,
            duration_secs: 7.0,
            target_scale: 1.5,
            first_of_cycle: false,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["pattern"], "relax-478");
        assert_eq!(json["phase"], "hold_after_inhale");
    }
}
