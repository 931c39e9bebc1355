// ===== starpath/src/clock.rs =====
use crate::error::{SpResult, StarPathError};
use serde::{Deserialize, Serialize};

/// A tempo change anchored at a tick position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub tick: u32,
    pub bpm: f64,
}

/// A time-signature change anchored at a tick position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignatureChange {
    pub tick: u32,
    pub numerator: u32,
    pub denominator: u32,
}

/// Tick -> seconds/beat/measure conversion. Upstream parsers normally stamp
/// derived time onto every event; the map exists for inputs that omit stamps
/// and for placing synthetic fill windows on measure boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawTempoMap")]
pub struct TempoMap {
    /// Ticks per quarter note.
    pub resolution: u32,
    pub tempos: Vec<TempoChange>,
    pub signatures: Vec<SignatureChange>,
}

/// Deserialization funnels through `TempoMap::new` so a loaded map carries
/// the same guarantees as a constructed one.
#[derive(Debug, Deserialize)]
struct RawTempoMap {
    resolution: u32,
    tempos: Vec<TempoChange>,
    #[serde(default)]
    signatures: Vec<SignatureChange>,
}

impl TryFrom<RawTempoMap> for TempoMap {
    type Error = StarPathError;

    fn try_from(raw: RawTempoMap) -> Result<Self, Self::Error> {
        TempoMap::new(raw.resolution, raw.tempos, raw.signatures)
    }
}

impl TempoMap {
    pub fn new(
        resolution: u32,
        mut tempos: Vec<TempoChange>,
        mut signatures: Vec<SignatureChange>,
    ) -> SpResult<Self> {
        if resolution == 0 {
            return Err(StarPathError::Validation(
                "tempo map resolution must be > 0".to_string(),
            ));
        }
        if tempos.is_empty() {
            return Err(StarPathError::Validation(
                "tempo map requires at least one tempo change".to_string(),
            ));
        }
        for t in &tempos {
            if !(t.bpm > 0.0) {
                return Err(StarPathError::Validation(format!(
                    "bpm must be > 0 (got {} at tick {})",
                    t.bpm, t.tick
                )));
            }
        }
        for s in &signatures {
            if s.numerator == 0 || s.denominator == 0 {
                return Err(StarPathError::Validation(format!(
                    "invalid time signature {}/{} at tick {}",
                    s.numerator, s.denominator, s.tick
                )));
            }
        }
        tempos.sort_by_key(|t| t.tick);
        signatures.sort_by_key(|s| s.tick);
        if tempos[0].tick != 0 {
            return Err(StarPathError::Validation(
                "first tempo change must sit at tick 0".to_string(),
            ));
        }
        if signatures.is_empty() {
            signatures.push(SignatureChange {
                tick: 0,
                numerator: 4,
                denominator: 4,
            });
        } else if signatures[0].tick != 0 {
            return Err(StarPathError::Validation(
                "first signature change must sit at tick 0".to_string(),
            ));
        }
        Ok(TempoMap {
            resolution,
            tempos,
            signatures,
        })
    }

    /// Constant-tempo map, 4/4.
    pub fn constant(resolution: u32, bpm: f64) -> SpResult<Self> {
        TempoMap::new(resolution, vec![TempoChange { tick: 0, bpm }], Vec::new())
    }

    /// Wall-clock seconds at a tick, accumulated across tempo segments.
    pub fn seconds_at(&self, tick: u32) -> f64 {
        let mut seconds = 0.0;
        let mut prev = self.tempos[0];
        for t in &self.tempos[1..] {
            if t.tick >= tick {
                break;
            }
            seconds += self.segment_seconds(prev.bpm, t.tick - prev.tick);
            prev = *t;
        }
        seconds + self.segment_seconds(prev.bpm, tick.saturating_sub(prev.tick))
    }

    /// Quarter-note beats at a tick.
    pub fn beat_at(&self, tick: u32) -> f64 {
        tick as f64 / self.resolution as f64
    }

    /// Fractional measure index at a tick, accumulated across signature
    /// segments (a 4/4 measure spans 4 quarter beats, a 3/4 measure 3).
    pub fn measure_at(&self, tick: u32) -> f64 {
        let mut measures = 0.0;
        let mut prev = self.signatures[0];
        for s in &self.signatures[1..] {
            if s.tick >= tick {
                break;
            }
            measures += self.segment_measures(&prev, s.tick - prev.tick);
            prev = *s;
        }
        measures + self.segment_measures(&prev, tick.saturating_sub(prev.tick))
    }

    /// First tick at or after the given (whole) measure index.
    pub fn tick_at_measure(&self, measure: u32) -> u32 {
        let mut remaining = measure as f64;
        let mut tick = 0u32;
        let mut prev = self.signatures[0];
        for s in &self.signatures[1..] {
            let span = self.segment_measures(&prev, s.tick - prev.tick);
            if span >= remaining {
                break;
            }
            remaining -= span;
            tick = s.tick;
            prev = *s;
        }
        let ticks_per_measure =
            self.resolution as f64 * 4.0 * prev.numerator as f64 / prev.denominator as f64;
        tick + (remaining * ticks_per_measure).round() as u32
    }

    fn segment_seconds(&self, bpm: f64, ticks: u32) -> f64 {
        // 60/bpm seconds per quarter note.
        (ticks as f64 / self.resolution as f64) * (60.0 / bpm)
    }

    fn segment_measures(&self, sig: &SignatureChange, ticks: u32) -> f64 {
        let ticks_per_measure =
            self.resolution as f64 * 4.0 * sig.numerator as f64 / sig.denominator as f64;
        ticks as f64 / ticks_per_measure
    }
}
