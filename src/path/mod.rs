// ===== starpath/src/path/mod.rs =====
pub mod activation;

pub use self::activation::{Activation, PhraseBoundary, ReadySnapshot};

use crate::chart::{multiplier_at, score_chord};
use crate::error::{SpResult, StarPathError};
use crate::squeeze::{self, BoundaryKind, BoundarySqueeze, MultiplierSqueeze};
use crate::timeline::Event;
use serde::Serialize;
use std::sync::Arc;

// === ENGINE CONSTANTS ===

/// A full meter drains over 8 measures of active resource.
pub const SP_FULL_MEASURES: f64 = 8.0;
/// Runout tolerance: 1/128 of a measure, expressed in meter units.
pub const SP_METER_EPSILON: f64 = (1.0 / 128.0) / SP_FULL_MEASURES;
/// One resource phrase grants a quarter meter.
pub const SP_PHRASE_GRANT: f64 = 0.25;
/// Half meter arms the next fill window.
pub const SP_READY_METER: f64 = 0.5;
/// Fills within this lead-time window are timing-critical (and below it,
/// forceable by an early hit).
pub const FILL_CRITICAL_MS: f64 = 50.0;
/// Solo spans pay a flat bonus per note.
pub const SOLO_NOTE_BONUS: u32 = 100;

// === SCORE BREAKDOWN ===

/// The host game's six-way score breakdown. The engine keeps the categories
/// separate the whole way through; `total` is always their sum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub base: u32,
    pub combo_bonus: u32,
    pub resource: u32,
    pub solo: u32,
    pub accent: u32,
    pub ghost: u32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u32 {
        self.base + self.combo_bonus + self.resource + self.solo + self.accent + self.ghost
    }
}

/// Interpolated instant at which the meter ran dry, carried from step 1 to
/// the boundary-squeeze bookkeeping of the same consume call.
#[derive(Debug, Clone, Copy)]
struct BoundaryContext {
    sp_end_seconds: f64,
}

// === PATH ===

/// One hypothesized playthrough. Mutable only through `consume`; forking
/// copies the scalar state and shares history records (`Arc`), so siblings
/// diverge in O(history) pointer copies.
#[derive(Debug, Clone)]
pub struct Path {
    pub scores: ScoreBreakdown,
    pub combo: u32,
    /// Resource meter, always within [0, 1].
    pub meter: f64,
    pub sp_active: bool,
    pub activations: Vec<Arc<Activation>>,
    pub squeezes: Vec<Arc<MultiplierSqueeze>>,
    pub ready: Option<ReadySnapshot>,
    /// Fills passed over since the last activation; resets exactly when an
    /// Activation is recorded.
    pub skips: u32,
    pub skips_timing_sensitive: bool,
    /// Index of the latest consumed event. Forked siblings carry their
    /// parent's stamp so the driver never re-feeds them the forking event.
    pub last_event: Option<usize>,
    cursor: Option<(f64, f64)>,
}

impl Default for Path {
    fn default() -> Self {
        Path::new()
    }
}

impl Path {
    pub fn new() -> Self {
        Path {
            scores: ScoreBreakdown::default(),
            combo: 0,
            meter: 0.0,
            sp_active: false,
            activations: Vec::new(),
            squeezes: Vec::new(),
            ready: None,
            skips: 0,
            skips_timing_sensitive: false,
            last_event: None,
            cursor: None,
        }
    }

    pub fn total_score(&self) -> u32 {
        self.scores.total()
    }

    /// Unguaranteed boundary-squeeze points still on the table.
    pub fn boundary_points(&self) -> u32 {
        self.activations
            .iter()
            .flat_map(|a| a.boundary_squeezes.iter())
            .map(|s| s.points)
            .sum()
    }

    /// Unguaranteed activation-entry squeeze points.
    pub fn entry_points(&self) -> u32 {
        self.activations
            .iter()
            .filter_map(|a| a.entry_squeeze.as_ref())
            .map(|s| s.gain)
            .sum()
    }

    /// Pruning comparator key: guaranteed score plus everything a perfect
    /// set of squeezed hits could still add.
    pub fn best_case_score(&self) -> u32 {
        self.total_score() + self.boundary_points() + self.entry_points()
    }

    /// Tightest input the path demands, in milliseconds of precision.
    pub fn max_difficulty_ms(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for a in &self.activations {
            if let Some(c) = a.calibration_ms {
                worst = worst.max(c.abs());
            }
            for b in &a.boundary_squeezes {
                worst = worst.max(b.difficulty_ms());
            }
        }
        worst
    }

    /// Feed one event through the state machine. `self` is the default
    /// continuation, mutated in place; returned paths are forked siblings
    /// (0-2), already stamped with this event.
    pub fn consume(&mut self, idx: usize, event: &Event) -> SpResult<Vec<Path>> {
        let combo_before = self.combo;

        // 1. Meter depletion; a crossing marks a resource boundary here.
        let boundary = self.deplete(event)?;

        // 2. Multiplier squeeze, unless this event can itself activate (the
        // activation squeeze wins that tie, see DESIGN.md).
        let fill_margin = self.fill_margin(event);
        let can_activate = fill_margin.map_or(false, |m| m > -FILL_CRITICAL_MS);
        if !can_activate {
            if let Some(sq) =
                squeeze::multiplier_squeeze(&event.chord, combo_before, self.sp_active)
            {
                self.squeezes.push(Arc::new(sq));
            }
        }

        // 3. Score the chord; boundary events bank the resource surplus as
        // a squeeze instead of scoring it.
        self.score_event(event, combo_before, boundary.as_ref())?;

        // 4. Fill decision.
        let mut forks: Vec<Path> = Vec::new();
        if let Some(margin_ms) = fill_margin {
            if let Some(fork) = self.fill_decision(event, combo_before, margin_ms)? {
                forks.push(fork);
            }
        }

        // 5-7. Phrase grant, solo credit, bookkeeping — on every branch.
        // Step-4 forks can never carry a boundary: a boundary needs the
        // resource active at entry, which rules the fill decision out.
        for f in &mut forks {
            if f.finish(idx, event, None)?.is_some() {
                return Err(StarPathError::Invariant(
                    "fill fork produced a nested boundary fork".to_string(),
                ));
            }
        }
        if let Some(fork) = self.finish(idx, event, boundary)? {
            forks.push(fork);
        }
        Ok(forks)
    }

    // --- Step 1 ---

    fn deplete(&mut self, event: &Event) -> SpResult<Option<BoundaryContext>> {
        if !self.sp_active {
            return Ok(None);
        }
        if self.meter < 0.0 {
            return Err(StarPathError::Invariant(format!(
                "negative resource meter ({})",
                self.meter
            )));
        }
        let (prev_s, prev_m) = match self.cursor {
            Some(c) => c,
            None => return Ok(None),
        };
        let elapsed = event.time.measure - prev_m;
        let remaining = self.meter - elapsed / SP_FULL_MEASURES;
        if remaining > SP_METER_EPSILON {
            self.meter = remaining;
            return Ok(None);
        }

        // Crossed (or grazed) zero: interpolate the runout instant between
        // the previous event and this one by measure fraction.
        let end_measure = prev_m + self.meter * SP_FULL_MEASURES;
        let frac = if elapsed > 0.0 {
            ((end_measure - prev_m) / elapsed).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let sp_end_seconds = prev_s + frac * (event.time.seconds - prev_s);
        self.meter = 0.0;
        self.sp_active = false;
        Ok(Some(BoundaryContext { sp_end_seconds }))
    }

    // --- Step 3 ---

    fn score_event(
        &mut self,
        event: &Event,
        combo_before: u32,
        boundary: Option<&BoundaryContext>,
    ) -> SpResult<()> {
        let sp_scored = self.sp_active || boundary.is_some();
        let cs = score_chord(&event.chord, combo_before, sp_scored);

        self.scores.base += cs.base;
        self.scores.combo_bonus += cs.combo_bonus;
        self.scores.accent += cs.accent;
        self.scores.ghost += cs.ghost;

        if let Some(b) = boundary {
            let offset_ms = (event.time.seconds - b.sp_end_seconds) * 1000.0;
            let sq = BoundarySqueeze::new(
                BoundaryKind::In,
                event.chord.clone(),
                cs.sp_surplus,
                offset_ms,
            );
            self.push_boundary_squeeze(sq)?;
        } else if self.sp_active {
            self.scores.resource += cs.sp_surplus;
        }

        self.combo += event.chord.len() as u32;
        Ok(())
    }

    // --- Step 4 ---

    /// Lead time from the armed ready snapshot to the fill's start, in ms.
    /// None when the event is not a usable fill terminus for this path.
    fn fill_margin(&self, event: &Event) -> Option<f64> {
        if self.sp_active {
            return None;
        }
        let fill = event.fill.as_ref()?;
        let ready = self.ready.as_ref()?;
        Some((fill.start_seconds - ready.early_s) * 1000.0)
    }

    fn fill_decision(
        &mut self,
        event: &Event,
        combo_before: u32,
        margin_ms: f64,
    ) -> SpResult<Option<Path>> {
        if margin_ms >= 0.0 {
            // Fill appears normally: fork passes it up, continuation takes it.
            let mut skip = self.clone();
            skip.skips += 1;
            if margin_ms < FILL_CRITICAL_MS {
                skip.skips_timing_sensitive = true;
            }
            let calibration = (margin_ms < FILL_CRITICAL_MS).then_some(margin_ms);
            self.activate(event, combo_before, calibration)?;
            Ok(Some(skip))
        } else if margin_ms > -FILL_CRITICAL_MS {
            // Fill needs forcing: continuation stays put but the skip is now
            // timing-sensitive; the fork forces the fill and activates.
            let mut act = self.clone();
            act.activate(event, combo_before, Some(margin_ms))?;
            self.skips += 1;
            self.skips_timing_sensitive = true;
            Ok(Some(act))
        } else {
            // Too far ahead of the meter: the fill never appears.
            Ok(None)
        }
    }

    fn activate(
        &mut self,
        event: &Event,
        combo_before: u32,
        calibration_ms: Option<f64>,
    ) -> SpResult<()> {
        let act_note = event.chord.activation_note().ok_or_else(|| {
            StarPathError::Invariant("activation on an empty chord".to_string())
        })?;
        // The auto-hit lands at the chord's top combo position.
        let m = multiplier_at(combo_before + event.chord.len() as u32 - 1);
        self.scores.resource += act_note.base_score() * m;

        let record = Activation {
            chord: event.chord.clone(),
            skips: self.skips,
            skips_timing_sensitive: self.skips_timing_sensitive,
            meter: self.meter,
            calibration_ms,
            entry_squeeze: squeeze::activation_squeeze(&event.chord, combo_before),
            boundary_squeezes: Vec::new(),
            phrase_boundary: PhraseBoundary::NotApplicable,
            seconds: event.time.seconds,
            measure: event.time.measure,
            beat: event.time.beat,
        };
        self.activations.push(Arc::new(record));
        self.skips = 0;
        self.skips_timing_sensitive = false;
        self.ready = None;
        self.sp_active = true;
        Ok(())
    }

    // --- Steps 5-7 ---

    fn finish(
        &mut self,
        idx: usize,
        event: &Event,
        boundary: Option<BoundaryContext>,
    ) -> SpResult<Option<Path>> {
        let mut fork = None;

        if event.phrase_end {
            if let Some(b) = boundary {
                // Phrase end on the runout instant: squeeze-out lets it
                // lapse, the continuation squeezes back in at a quarter bar.
                let mut out = self.clone();
                out.mark_squeeze_out(event, &b)?;
                self.mark_squeeze_in()?;
                fork = Some(out);
            } else {
                let before = self.meter;
                self.meter = (self.meter + SP_PHRASE_GRANT).min(1.0);
                if !self.sp_active && before < SP_READY_METER && self.meter >= SP_READY_METER {
                    self.ready = Some(ReadySnapshot::capture(&event.time));
                }
            }
        }

        if event.solo {
            let bonus = SOLO_NOTE_BONUS * event.chord.len() as u32;
            self.scores.solo += bonus;
            if let Some(f) = &mut fork {
                f.scores.solo += bonus;
            }
        }

        self.stamp(idx, event);
        if let Some(f) = &mut fork {
            f.stamp(idx, event);
        }
        Ok(fork)
    }

    fn mark_squeeze_in(&mut self) -> SpResult<()> {
        self.sp_active = true;
        self.meter = SP_PHRASE_GRANT;
        let last = self.activations.last_mut().ok_or_else(|| {
            StarPathError::Invariant("phrase extension with no recorded activation".to_string())
        })?;
        Arc::make_mut(last).phrase_boundary = PhraseBoundary::ExtendedEarly;
        Ok(())
    }

    fn mark_squeeze_out(&mut self, event: &Event, b: &BoundaryContext) -> SpResult<()> {
        // The lapsing phrase surrenders the cheapest note of the boundary
        // chord, at the chord's entry multiplier.
        let give_back = event.chord.min_note_score()
            * multiplier_at(self.combo.saturating_sub(event.chord.len() as u32));
        let out_offset_ms = (b.sp_end_seconds - event.time.seconds) * 1000.0;

        let last = self.activations.last_mut().ok_or_else(|| {
            StarPathError::Invariant("phrase lapse with no recorded activation".to_string())
        })?;
        let last = Arc::make_mut(last);
        last.phrase_boundary = PhraseBoundary::EndedLate;
        let sq = last.boundary_squeezes.last_mut().ok_or_else(|| {
            StarPathError::Invariant("phrase lapse with no boundary squeeze".to_string())
        })?;
        *sq = BoundarySqueeze::new(
            BoundaryKind::Out,
            sq.chord.clone(),
            sq.points.saturating_sub(give_back),
            out_offset_ms,
        );
        Ok(())
    }

    fn push_boundary_squeeze(&mut self, sq: BoundarySqueeze) -> SpResult<()> {
        let last = self.activations.last_mut().ok_or_else(|| {
            StarPathError::Invariant("resource boundary with no recorded activation".to_string())
        })?;
        Arc::make_mut(last).boundary_squeezes.push(sq);
        Ok(())
    }

    fn stamp(&mut self, idx: usize, event: &Event) {
        self.last_event = Some(idx);
        self.cursor = Some((event.time.seconds, event.time.measure));
    }

    /// Activation histories shared up to which index? Arc pointer identity
    /// first, content equality as the slow path.
    pub fn shared_prefix_len(&self, other: &Path) -> usize {
        shared_prefix(&self.activations, &other.activations)
    }
}

pub(crate) fn shared_prefix(a: &[Arc<Activation>], b: &[Arc<Activation>]) -> usize {
    let mut n = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        if Arc::ptr_eq(x, y) || x == y {
            n += 1;
        } else {
            break;
        }
    }
    n
}
