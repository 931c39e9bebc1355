use crate::chart::Chord;
use crate::squeeze::{ActivationSqueeze, BoundarySqueeze};
use crate::timeline::TimePoint;
use serde::Serialize;

/// How the activation's resource span related to the phrase that ended on
/// its boundary, when the two coincided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PhraseBoundary {
    #[default]
    NotApplicable,
    /// Phrase-end hit early enough to extend the expiring resource.
    ExtendedEarly,
    /// Phrase allowed to lapse past the resource runout.
    EndedLate,
}

/// Meter state captured the instant the resource reached 50% while
/// inactive. Replaced wholesale on the next crossing, cleared by
/// activation; never updated field-by-field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadySnapshot {
    pub tick: u32,
    pub seconds: f64,
    pub measure: f64,
    pub beat: f64,
    pub early_s: f64,
    pub late_s: f64,
}

impl ReadySnapshot {
    pub fn capture(t: &TimePoint) -> Self {
        ReadySnapshot {
            tick: t.tick,
            seconds: t.seconds,
            measure: t.measure,
            beat: t.beat,
            early_s: t.early_s,
            late_s: t.late_s,
        }
    }
}

/// One committed resource activation. Immutable once its span closes;
/// shared between sibling paths via Arc, so late edits (boundary squeezes,
/// phrase markers) go through Arc::make_mut on the owning path's tail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activation {
    pub chord: Chord,
    /// Fills passed over since the previous activation.
    pub skips: u32,
    /// The skip count depends on a sub-50ms input somewhere behind it.
    pub skips_timing_sensitive: bool,
    /// Meter level at the activation instant.
    pub meter: f64,
    /// Lead-time margin when the fill sat within the 50ms critical window
    /// (negative: the fill had to be forced by an early hit).
    pub calibration_ms: Option<f64>,
    pub entry_squeeze: Option<ActivationSqueeze>,
    pub boundary_squeezes: Vec<BoundarySqueeze>,
    pub phrase_boundary: PhraseBoundary,
    pub seconds: f64,
    pub measure: f64,
    pub beat: f64,
}
