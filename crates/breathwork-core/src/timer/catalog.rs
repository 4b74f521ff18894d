//! Fixed registry of breathing patterns.
//!
//! Three patterns are supported. Each is a cyclic list of phases: after the
//! last phase, the first repeats.
//!
//! | Pattern   | Phases (kind, seconds, target scale)                      |
//! |-----------|-----------------------------------------------------------|
//! | Coherence | Inhale 5 -> 1.5, Exhale 5 -> 1.0                          |
//! | Relax478  | Inhale 4 -> 1.5, Hold 7 -> 1.5, Exhale 8 -> 1.0           |
//! | BoxFocus  | Inhale 4 -> 1.5, Hold 4 -> 1.5, Exhale 4 -> 1.0, Hold 4 -> 1.0 |

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InvalidPatternError, ValidationError};
use Easing::{EaseIn, EaseInOut, EaseOut, Linear};
use PhaseKind::{Exhale, HoldAfterExhale, HoldAfterInhale, Inhale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternId {
    #[default]
    Coherence,
    #[serde(rename = "relax-478")]
    Relax478,
    BoxFocus,
}

impl PatternId {
    pub const ALL: [PatternId; 3] = [PatternId::Coherence, PatternId::Relax478, PatternId::BoxFocus];

    /// Stable identifier used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternId::Coherence => "coherence",
            PatternId::Relax478 => "relax-478",
            PatternId::BoxFocus => "box-focus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PatternId::Coherence => "Coherence",
            PatternId::Relax478 => "4-7-8 Relax",
            PatternId::BoxFocus => "Box Focus",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PatternId::Coherence => "Balance your nervous system.",
            PatternId::Relax478 => "Deep calm and anxiety relief.",
            PatternId::BoxFocus => "Heightened concentration.",
        }
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternId {
    type Err = InvalidPatternError;

    /// Accepts the stable identifier or the display label, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        PatternId::ALL
            .into_iter()
            .find(|id| {
                id.as_str().eq_ignore_ascii_case(needle) || id.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| InvalidPatternError {
                input: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Inhale,
    HoldAfterInhale,
    Exhale,
    HoldAfterExhale,
}

impl PhaseKind {
    /// Text shown to the user while this phase is active.
    pub fn instruction(&self) -> &'static str {
        match self {
            PhaseKind::Inhale => "Inhale",
            PhaseKind::HoldAfterInhale | PhaseKind::HoldAfterExhale => "Hold",
            PhaseKind::Exhale => "Exhale",
        }
    }
}

/// Animation curve for the scale transition of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// Map linear progress `t` (clamped to 0..=1) onto the curve.
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Shortest phase a cycle accepts; anything shorter would let wake-ups
/// fire without the clock moving.
pub const MIN_PHASE_DURATION: Duration = Duration::from_millis(1);
/// Longest phase a cycle accepts.
pub const MAX_PHASE_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// One timed segment of a breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub kind: PhaseKind,
    pub duration_secs: f64,
    /// Visual expansion reached by the end of the phase.
    pub target_scale: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl PhaseSpec {
    pub const fn new(kind: PhaseKind, duration_secs: f64, target_scale: f64, easing: Easing) -> Self {
        Self {
            kind,
            duration_secs,
            target_scale,
            easing,
        }
    }

    /// Zero for a duration that is not representable; validated phases never are.
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs).unwrap_or_default()
    }

    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        let in_range = Duration::try_from_secs_f64(self.duration_secs)
            .is_ok_and(|d| (MIN_PHASE_DURATION..=MAX_PHASE_DURATION).contains(&d));
        if !in_range {
            return Err(ValidationError::InvalidPhase {
                index,
                message: format!(
                    "duration must be between {}s and {}s, got {}",
                    MIN_PHASE_DURATION.as_secs_f64(),
                    MAX_PHASE_DURATION.as_secs(),
                    self.duration_secs
                ),
            });
        }
        if !self.target_scale.is_finite() || self.target_scale <= 0.0 {
            return Err(ValidationError::InvalidPhase {
                index,
                message: format!("target scale must be positive, got {}", self.target_scale),
            });
        }
        Ok(())
    }
}

/// A validated, non-empty, cyclic list of phases.
///
/// Cloning is cheap; the phases are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCycle {
    phases: Arc<[PhaseSpec]>,
}

impl PhaseCycle {
    pub fn new(phases: Vec<PhaseSpec>) -> Result<Self, ValidationError> {
        if phases.is_empty() {
            return Err(ValidationError::EmptyPattern);
        }
        for (index, phase) in phases.iter().enumerate() {
            phase.validate(index)?;
        }
        Ok(Self {
            phases: phases.into(),
        })
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always false: construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PhaseSpec> {
        self.phases.get(index)
    }

    /// Index of the phase that follows `index`, wrapping to 0.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.phases.len()
    }

    pub fn cycle_secs(&self) -> f64 {
        self.phases.iter().map(|p| p.duration_secs).sum()
    }

    pub fn cycle_duration(&self) -> Duration {
        self.phases.iter().map(PhaseSpec::duration).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreathingPattern {
    pub id: PatternId,
    pub cycle: PhaseCycle,
}

impl BreathingPattern {
    pub fn label(&self) -> &'static str {
        self.id.label()
    }

    pub fn description(&self) -> &'static str {
        self.id.description()
    }

    pub fn phases(&self) -> &[PhaseSpec] {
        self.cycle.phases()
    }

    pub fn cycle_secs(&self) -> f64 {
        self.cycle.cycle_secs()
    }

    pub fn breaths_per_minute(&self) -> f64 {
        60.0 / self.cycle_secs()
    }
}

const COHERENCE: [PhaseSpec; 2] = [
    PhaseSpec::new(Inhale, 5.0, 1.5, EaseInOut),
    PhaseSpec::new(Exhale, 5.0, 1.0, EaseInOut),
];

const RELAX_478: [PhaseSpec; 3] = [
    PhaseSpec::new(Inhale, 4.0, 1.5, EaseOut),
    PhaseSpec::new(HoldAfterInhale, 7.0, 1.5, Linear),
    PhaseSpec::new(Exhale, 8.0, 1.0, EaseIn),
];

const BOX_FOCUS: [PhaseSpec; 4] = [
    PhaseSpec::new(Inhale, 4.0, 1.5, Linear),
    PhaseSpec::new(HoldAfterInhale, 4.0, 1.5, Linear),
    PhaseSpec::new(Exhale, 4.0, 1.0, Linear),
    PhaseSpec::new(HoldAfterExhale, 4.0, 1.0, Linear),
];

/// The fixed set of supported patterns.
#[derive(Debug)]
pub struct PatternCatalog {
    patterns: Vec<BreathingPattern>,
}

impl PatternCatalog {
    /// The process-wide catalog.
    pub fn builtin() -> &'static PatternCatalog {
        static CATALOG: OnceLock<PatternCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| PatternCatalog {
            patterns: PatternId::ALL
                .into_iter()
                .map(|id| BreathingPattern {
                    id,
                    cycle: PhaseCycle {
                        phases: Self::table(id).into(),
                    },
                })
                .collect(),
        })
    }

    fn table(id: PatternId) -> &'static [PhaseSpec] {
        match id {
            PatternId::Coherence => &COHERENCE,
            PatternId::Relax478 => &RELAX_478,
            PatternId::BoxFocus => &BOX_FOCUS,
        }
    }

    pub fn get(&self, id: PatternId) -> &BreathingPattern {
        // `patterns` is built in `PatternId::ALL` order.
        &self.patterns[id as usize]
    }

    pub fn phases_for(&self, id: PatternId) -> &[PhaseSpec] {
        self.get(id).phases()
    }

    /// Resolve a pattern from free text (identifier or label).
    pub fn lookup(&self, name: &str) -> Result<&BreathingPattern, InvalidPatternError> {
        name.parse::<PatternId>().map(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BreathingPattern> {
        self.patterns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_cycle_lengths() {
        let catalog = PatternCatalog::builtin();
        assert_eq!(catalog.get(PatternId::Coherence).cycle_secs(), 10.0);
        assert_eq!(catalog.get(PatternId::Relax478).cycle_secs(), 19.0);
        assert_eq!(catalog.get(PatternId::BoxFocus).cycle_secs(), 16.0);
    }

    #[test]
    fn catalog_entries_pass_validation() {
        for pattern in PatternCatalog::builtin().iter() {
            let rebuilt = PhaseCycle::new(pattern.phases().to_vec()).unwrap();
            assert_eq!(rebuilt, pattern.cycle);
        }
    }

    #[test]
    fn get_matches_requested_id() {
        let catalog = PatternCatalog::builtin();
        for id in PatternId::ALL {
            assert_eq!(catalog.get(id).id, id);
        }
    }

    #[test]
    fn relax_hold_keeps_scale() {
        let phases = PatternCatalog::builtin().phases_for(PatternId::Relax478);
        assert_eq!(phases[1].kind, PhaseKind::HoldAfterInhale);
        assert_eq!(phases[0].target_scale, phases[1].target_scale);
        assert_eq!(phases[2].target_scale, 1.0);
    }

    #[test]
    fn parse_accepts_ids_and_labels() {
        assert_eq!("box-focus".parse::<PatternId>(), Ok(PatternId::BoxFocus));
        assert_eq!("4-7-8 Relax".parse::<PatternId>(), Ok(PatternId::Relax478));
        assert_eq!(" COHERENCE ".parse::<PatternId>(), Ok(PatternId::Coherence));
        let err = "tummo".parse::<PatternId>().unwrap_err();
        assert_eq!(err.input, "tummo");
    }

    #[test]
    fn lookup_rejects_unknown() {
        assert!(PatternCatalog::builtin().lookup("triangle").is_err());
    }

    #[test]
    fn serde_uses_stable_ids() {
        let json = serde_json::to_string(&PatternId::Relax478).unwrap();
        assert_eq!(json, "\"relax-478\"");
        let back: PatternId = serde_json::from_str("\"box-focus\"").unwrap();
        assert_eq!(back, PatternId::BoxFocus);
    }

    #[test]
    fn empty_cycle_rejected() {
        assert_eq!(PhaseCycle::new(vec![]), Err(ValidationError::EmptyPattern));
    }

    #[test]
    fn non_positive_duration_rejected() {
        let err = PhaseCycle::new(vec![
            PhaseSpec::new(Inhale, 4.0, 1.5, Linear),
            PhaseSpec::new(Exhale, 0.0, 1.0, Linear),
        ])
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPhase { index: 1, .. }));
    }

    #[test]
    fn sub_millisecond_duration_rejected() {
        let err = PhaseCycle::new(vec![PhaseSpec::new(Inhale, 1e-10, 1.2, Linear)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPhase { index: 0, .. }));
        assert!(PhaseCycle::new(vec![PhaseSpec::new(Inhale, 0.001, 1.2, Linear)]).is_ok());
    }

    #[test]
    fn unrepresentable_duration_rejected() {
        for secs in [1e20, f64::INFINITY, f64::NAN, 86_401.0] {
            let err = PhaseCycle::new(vec![PhaseSpec::new(Inhale, secs, 1.2, Linear)]).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidPhase { index: 0, .. }), "{secs}");
        }
        assert_eq!(PhaseSpec::new(Inhale, 1e20, 1.2, Linear).duration(), Duration::ZERO);
    }

    #[test]
    fn next_index_wraps() {
        let cycle = PatternCatalog::builtin().get(PatternId::Relax478).cycle.clone();
        assert_eq!(cycle.next_index(0), 1);
        assert_eq!(cycle.next_index(2), 0);
    }

    #[test]
    fn easing_endpoints() {
        for easing in [Linear, EaseIn, EaseOut, EaseInOut] {
            assert_eq!(easing.apply(0.0), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert_eq!(easing.apply(2.0), 1.0);
        }
        assert_eq!(EaseInOut.apply(0.5), 0.5);
        assert!(EaseIn.apply(0.25) < 0.25);
        assert!(EaseOut.apply(0.25) > 0.25);
    }
}
