// ===== starpath/src/timeline.rs =====
use crate::chart::{Chord, Dynamic, Note, Surface};
use crate::clock::TempoMap;
use crate::error::{SpResult, StarPathError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Half-width of the legal early/late hit window.
pub const HIT_WINDOW_MS: f64 = 70.0;

/// Synthetic fill cadence when a chart authors none.
pub const DEFAULT_FILL_CADENCE: u32 = 4;

// === EVENT MODEL ===

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimePoint {
    pub tick: u32,
    pub seconds: f64,
    pub measure: f64,
    pub beat: f64,
    /// Earliest legal hit instant (seconds - 70ms unless the parser stamped
    /// a tighter bound).
    pub early_s: f64,
    /// Latest legal hit instant.
    pub late_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FillContext {
    pub start_seconds: f64,
    pub start_measure: f64,
    pub start_beat: f64,
}

/// One instant of the chart. Created once by the upstream parser (here:
/// deserialized and contract-checked); read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub chord: Chord,
    /// This instant closes a resource-granting phrase (+25% meter).
    pub phrase_end: bool,
    /// This instant sits inside a solo span.
    pub solo: bool,
    /// Some iff this instant terminates a fill window.
    pub fill: Option<FillContext>,
    pub time: TimePoint,
    pub bpm: Option<f64>,
    pub signature: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Timeline {
    events: Vec<Event>,
    tempo: Option<TempoMap>,
}

// === RAW INPUT DOCUMENT ===

#[derive(Debug, Deserialize)]
struct RawTimeline {
    #[serde(default)]
    tempo_map: Option<TempoMap>,
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    tick: u32,
    #[serde(default)]
    seconds: Option<f64>,
    #[serde(default)]
    measure: Option<f64>,
    #[serde(default)]
    beat: Option<f64>,
    #[serde(default)]
    early_seconds: Option<f64>,
    #[serde(default)]
    late_seconds: Option<f64>,
    notes: Vec<RawNote>,
    #[serde(default)]
    phrase_end: bool,
    #[serde(default)]
    solo: bool,
    #[serde(default)]
    fill: Option<RawFill>,
}

#[derive(Debug, Deserialize)]
struct RawNote {
    lane: crate::chart::Lane,
    #[serde(default)]
    dynamic: Dynamic,
    #[serde(default)]
    surface: Surface,
    #[serde(default)]
    double_kick: bool,
}

#[derive(Debug, Deserialize)]
struct RawFill {
    #[serde(default)]
    start_tick: Option<u32>,
    #[serde(default)]
    start_seconds: Option<f64>,
    #[serde(default)]
    start_measure: Option<f64>,
    #[serde(default)]
    start_beat: Option<f64>,
}

// === TIMELINE ===

impl Timeline {
    pub fn new(events: Vec<Event>, tempo: Option<TempoMap>) -> SpResult<Self> {
        let tl = Timeline { events, tempo };
        tl.validate()?;
        Ok(tl)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> SpResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let raw: RawTimeline = serde_json::from_str(&content)?;
        info!(
            "Timeline: {} raw events from {}",
            raw.events.len(),
            path.as_ref().display()
        );
        Timeline::from_raw(raw)
    }

    pub fn load_from_str(content: &str) -> SpResult<Self> {
        let raw: RawTimeline = serde_json::from_str(content)?;
        Timeline::from_raw(raw)
    }

    fn from_raw(raw: RawTimeline) -> SpResult<Self> {
        let tempo = raw.tempo_map;
        let mut events = Vec::with_capacity(raw.events.len());
        let mut stamped = 0usize;

        for (i, re) in raw.events.into_iter().enumerate() {
            let notes: SpResult<Vec<Note>> = re
                .notes
                .into_iter()
                .map(|n| Note::new(n.lane, n.dynamic, n.surface, n.double_kick))
                .collect();
            let chord = Chord::new(notes?)?;
            if chord.is_empty() {
                return Err(StarPathError::Validation(format!(
                    "event {} carries an empty chord; empty instants must not reach the engine",
                    i
                )));
            }

            let seconds = match (re.seconds, &tempo) {
                (Some(s), _) => s,
                (None, Some(map)) => map.seconds_at(re.tick),
                (None, None) => {
                    return Err(StarPathError::Validation(format!(
                        "event {} has no seconds stamp and no tempo map to derive one",
                        i
                    )))
                }
            };
            let measure = match (re.measure, &tempo) {
                (Some(m), _) => m,
                (None, Some(map)) => map.measure_at(re.tick),
                (None, None) => {
                    return Err(StarPathError::Validation(format!(
                        "event {} has no measure stamp and no tempo map to derive one",
                        i
                    )))
                }
            };
            let beat = match (re.beat, &tempo) {
                (Some(b), _) => b,
                (None, Some(map)) => map.beat_at(re.tick),
                (None, None) => re.tick as f64,
            };

            if re.early_seconds.is_none() || re.late_seconds.is_none() {
                stamped += 1;
            }
            let early_s = re.early_seconds.unwrap_or(seconds - HIT_WINDOW_MS / 1000.0);
            let late_s = re.late_seconds.unwrap_or(seconds + HIT_WINDOW_MS / 1000.0);

            let fill = match re.fill {
                None => None,
                Some(rf) => {
                    let start_seconds = match (rf.start_seconds, rf.start_tick, &tempo) {
                        (Some(s), _, _) => s,
                        (None, Some(t), Some(map)) => map.seconds_at(t),
                        _ => {
                            return Err(StarPathError::Validation(format!(
                                "fill terminus at event {} has no resolvable start time",
                                i
                            )))
                        }
                    };
                    let start_measure = match (rf.start_measure, rf.start_tick, &tempo) {
                        (Some(m), _, _) => m,
                        (None, Some(t), Some(map)) => map.measure_at(t),
                        _ => {
                            return Err(StarPathError::Validation(format!(
                                "fill terminus at event {} has no resolvable start measure",
                                i
                            )))
                        }
                    };
                    let start_beat = match (rf.start_beat, rf.start_tick, &tempo) {
                        (Some(b), _, _) => b,
                        (None, Some(t), Some(map)) => map.beat_at(t),
                        _ => start_measure * 4.0,
                    };
                    Some(FillContext {
                        start_seconds,
                        start_measure,
                        start_beat,
                    })
                }
            };

            let (bpm, signature) = match &tempo {
                Some(map) => {
                    let bpm = map
                        .tempos
                        .iter()
                        .rev()
                        .find(|t| t.tick <= re.tick)
                        .map(|t| t.bpm);
                    let sig = map
                        .signatures
                        .iter()
                        .rev()
                        .find(|s| s.tick <= re.tick)
                        .map(|s| (s.numerator, s.denominator));
                    (bpm, sig)
                }
                None => (None, None),
            };

            events.push(Event {
                chord,
                phrase_end: re.phrase_end,
                solo: re.solo,
                fill,
                time: TimePoint {
                    tick: re.tick,
                    seconds,
                    measure,
                    beat,
                    early_s,
                    late_s,
                },
                bpm,
                signature,
            });
        }

        if stamped > 0 {
            warn!(
                "Timeline: stamped default ±{}ms hit bounds on {} events",
                HIT_WINDOW_MS, stamped
            );
        }
        Timeline::new(events, tempo)
    }

    /// Upstream parser contract. Malformed input fails here, never inside
    /// the engine.
    fn validate(&self) -> SpResult<()> {
        for (i, ev) in self.events.iter().enumerate() {
            if ev.chord.is_empty() {
                return Err(StarPathError::Validation(format!(
                    "event {} carries an empty chord",
                    i
                )));
            }
            let t = &ev.time;
            if !(t.early_s <= t.seconds && t.seconds <= t.late_s) {
                return Err(StarPathError::Validation(format!(
                    "event {} hit bounds do not bracket its time ({:.4} / {:.4} / {:.4})",
                    i, t.early_s, t.seconds, t.late_s
                )));
            }
            if let Some(fill) = &ev.fill {
                if fill.start_seconds >= t.seconds {
                    return Err(StarPathError::Validation(format!(
                        "fill terminus at event {} starts at/after its own terminus \
                         ({:.4} >= {:.4})",
                        i, fill.start_seconds, t.seconds
                    )));
                }
                if fill.start_measure >= t.measure {
                    return Err(StarPathError::Validation(format!(
                        "fill terminus at event {} has an unordered start measure",
                        i
                    )));
                }
            }
        }
        for (i, pair) in self.events.windows(2).enumerate() {
            let (a, b) = (&pair[0].time, &pair[1].time);
            if b.tick <= a.tick || b.seconds <= a.seconds || b.measure <= a.measure {
                return Err(StarPathError::Validation(format!(
                    "events {} and {} are not strictly time-ordered",
                    i,
                    i + 1
                )));
            }
        }
        Ok(())
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn tempo(&self) -> Option<&TempoMap> {
        self.tempo.as_ref()
    }

    pub fn has_fills(&self) -> bool {
        self.events.iter().any(|e| e.fill.is_some())
    }

    /// Normalize a chart with no authored fill windows: every `cadence`
    /// measures, the first eligible event at/after the boundary becomes a
    /// fill terminus whose window opens one measure earlier. Authored fills
    /// suppress synthesis entirely. Returns the number of fills added.
    pub fn synthesize_fills(&mut self, cadence: u32) -> usize {
        if cadence == 0 || self.has_fills() || self.events.is_empty() {
            return 0;
        }
        let last_measure = self.events.last().map(|e| e.time.measure).unwrap_or(0.0);
        let anchors: Vec<(f64, f64, f64)> = self
            .events
            .iter()
            .map(|e| (e.time.measure, e.time.seconds, e.time.beat))
            .collect();

        let mut added = 0;
        let mut boundary = cadence as f64;
        let mut cursor = 0usize;
        while boundary <= last_measure {
            while cursor < self.events.len() && self.events[cursor].time.measure < boundary {
                cursor += 1;
            }
            // Skip already-marked or phrase-closing instants; take the next one.
            let mut idx = cursor;
            while idx < self.events.len()
                && (self.events[idx].fill.is_some() || self.events[idx].phrase_end)
            {
                idx += 1;
            }
            if idx >= self.events.len() {
                break;
            }
            let start_measure = (boundary - 1.0).max(0.0);
            let start_seconds = match &self.tempo {
                Some(map) => map.seconds_at(map.tick_at_measure(start_measure as u32)),
                None => interpolate(&anchors, start_measure, |a| a.1),
            };
            let start_beat = match &self.tempo {
                Some(map) => map.beat_at(map.tick_at_measure(start_measure as u32)),
                None => interpolate(&anchors, start_measure, |a| a.2),
            };
            self.events[idx].fill = Some(FillContext {
                start_seconds,
                start_measure,
                start_beat,
            });
            added += 1;
            boundary += cadence as f64;
        }
        if added > 0 {
            info!(
                "Timeline: synthesized {} periodic fill windows (every {} measures)",
                added, cadence
            );
        }
        added
    }

    pub fn stats(&self) -> ChartStats {
        let mut s = ChartStats::default();
        s.events = self.events.len();
        for ev in &self.events {
            s.notes += ev.chord.len();
            s.ghosts += ev.chord.ghost_count();
            s.accents += ev.chord.accent_count();
            s.cymbals += ev
                .chord
                .notes()
                .iter()
                .filter(|n| n.surface == Surface::Cymbal)
                .count();
            if ev.phrase_end {
                s.phrase_ends += 1;
            }
            if ev.fill.is_some() {
                s.fills += 1;
            }
            if ev.solo {
                s.solo_events += 1;
            }
        }
        if let (Some(first), Some(last)) = (self.events.first(), self.events.last()) {
            s.duration_s = last.time.seconds - first.time.seconds;
            s.measures = last.time.measure;
        }
        s
    }
}

/// Piecewise-linear lookup over per-event anchors keyed by measure,
/// extrapolating from the nearest segment outside the span.
fn interpolate<F: Fn(&(f64, f64, f64)) -> f64>(
    anchors: &[(f64, f64, f64)],
    measure: f64,
    value: F,
) -> f64 {
    match anchors.len() {
        0 => 0.0,
        1 => value(&anchors[0]),
        _ => {
            let idx = anchors
                .iter()
                .position(|a| a.0 >= measure)
                .unwrap_or(anchors.len() - 1)
                .max(1);
            let (a, b) = (&anchors[idx - 1], &anchors[idx]);
            let span = b.0 - a.0;
            if span <= 0.0 {
                return value(a);
            }
            let frac = (measure - a.0) / span;
            value(a) + (value(b) - value(a)) * frac
        }
    }
}

// === CHART STATISTICS ===

#[derive(Debug, Default, Clone, Serialize)]
pub struct ChartStats {
    pub events: usize,
    pub notes: usize,
    pub ghosts: usize,
    pub accents: usize,
    pub cymbals: usize,
    pub phrase_ends: usize,
    pub fills: usize,
    pub solo_events: usize,
    pub duration_s: f64,
    pub measures: f64,
}
