// ===== starpath/src/squeeze.rs =====
use crate::chart::{multiplier_at, ordered_total, Chord, Note};
use serde::Serialize;
use strum_macros::{Display, EnumIter};

// === TIMING DIFFICULTY ===

/// Input-timing difficulty for a boundary squeeze, banded from the signed
/// millisecond offset. Bands are strictly less-than on the upper edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Display, EnumIter)]
pub enum Rating {
    Free,
    Easy,
    Normal,
    Hard,
    Insane,
    Impossible,
}

impl Rating {
    pub fn from_offset_ms(offset_ms: f64) -> Self {
        if offset_ms < -100.0 {
            Rating::Free
        } else if offset_ms < -25.0 {
            Rating::Easy
        } else if offset_ms < 25.0 {
            Rating::Normal
        } else if offset_ms < 70.0 {
            Rating::Hard
        } else if offset_ms < 140.0 {
            Rating::Insane
        } else {
            Rating::Impossible
        }
    }
}

// === VALUE OBJECTS ===

/// Extra points available by ordering a chord's notes across a multiplier
/// threshold: best assignment puts the cheapest notes at the lowest combo
/// positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MultiplierSqueeze {
    pub chord: Chord,
    pub combo: u32,
    pub gain: u32,
}

impl MultiplierSqueeze {
    /// Human hint derived from the ordering guide, e.g. "R first, then Yc".
    pub fn hint(&self) -> String {
        let pairs = guide_chords(&self.chord, self.combo);
        if pairs.is_empty() {
            return format!("order {} for +{}", self.chord, self.gain);
        }
        let parts: Vec<String> = pairs
            .iter()
            .map(|p| format!("{} first, then {}", p.early, p.late))
            .collect();
        parts.join(" / ")
    }
}

/// Ordered halves of a chord for a multiplier squeeze: hit `early` before
/// the threshold, `late` after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidePair {
    pub early: Chord,
    pub late: Chord,
}

/// Extra points available at an activation: everything except the auto-hit
/// activation note can be delayed to land under the fresh resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationSqueeze {
    pub chord: Chord,
    pub combo: u32,
    pub gain: u32,
}

impl ActivationSqueeze {
    pub fn hint(&self) -> String {
        match self.chord.activation_note() {
            Some(act) => format!("tap {} to activate, drag the rest of {} late", act, self.chord),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum BoundaryKind {
    /// Hit early enough to land inside the expiring resource window.
    In,
    /// Hit late, surrendering the phrase note, salvaging the remainder.
    Out,
}

/// Unguaranteed points hanging on a timed hit at a resource boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundarySqueeze {
    pub kind: BoundaryKind,
    pub chord: Chord,
    pub points: u32,
    pub offset_ms: f64,
    pub rating: Rating,
}

impl BoundarySqueeze {
    pub fn new(kind: BoundaryKind, chord: Chord, points: u32, offset_ms: f64) -> Self {
        BoundarySqueeze {
            kind,
            chord,
            points,
            offset_ms,
            rating: Rating::from_offset_ms(offset_ms),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self.kind {
            BoundaryKind::In => "<<",
            BoundaryKind::Out => ">>",
        }
    }

    pub fn description(&self) -> String {
        match self.kind {
            BoundaryKind::In => format!(
                "hit {} {:+.0}ms against the meter runout for +{} ({})",
                self.chord, self.offset_ms, self.points, self.rating
            ),
            BoundaryKind::Out => format!(
                "late-hit {} past the meter runout for +{} ({})",
                self.chord, self.points, self.rating
            ),
        }
    }

    /// Milliseconds of precision the squeeze demands; slack counts as zero.
    pub fn difficulty_ms(&self) -> f64 {
        self.offset_ms.max(0.0)
    }
}

// === CALCULATORS ===

/// Best-vs-worst ordering differential for a chord entering at `combo`.
/// None when no threshold falls inside the chord or all notes are equal.
pub fn multiplier_squeeze(
    chord: &Chord,
    combo: u32,
    resource_active: bool,
) -> Option<MultiplierSqueeze> {
    if chord.len() < 2 {
        return None;
    }
    let best = ordered_total(&chord.notes_ascending(), combo, resource_active);
    let worst = ordered_total(&chord.notes_descending(), combo, resource_active);
    if best == worst {
        return None;
    }
    Some(MultiplierSqueeze {
        chord: chord.clone(),
        combo,
        gain: best - worst,
    })
}

/// Ordering guides for a multiplier squeeze. For 2-note chords, the two
/// single-note halves. For larger chords, one pair per note tied at the
/// extreme value: isolate-first when the extreme is the chord's lowest,
/// isolate-last when it is the highest. The scarcer extreme is the one the
/// player has to isolate; equal scarcity falls back to the minimum.
pub fn guide_chords(chord: &Chord, _combo: u32) -> Vec<GuidePair> {
    let asc = chord.notes_ascending();
    if asc.len() < 2 {
        return Vec::new();
    }
    let lo = asc.first().map(Note::base_score).unwrap_or(0);
    let hi = asc.last().map(Note::base_score).unwrap_or(0);
    if lo == hi {
        return Vec::new();
    }

    if asc.len() == 2 {
        let early = Chord::new(vec![asc[0]]).expect("single note is a valid chord");
        let late = Chord::new(vec![asc[1]]).expect("single note is a valid chord");
        return vec![GuidePair { early, late }];
    }

    let lo_count = asc.iter().filter(|n| n.base_score() == lo).count();
    let hi_count = asc.iter().filter(|n| n.base_score() == hi).count();
    let isolate_high = hi_count < lo_count;
    let extreme = if isolate_high { hi } else { lo };

    let mut pairs = Vec::new();
    for (i, note) in asc.iter().enumerate() {
        if note.base_score() != extreme {
            continue;
        }
        let rest: Vec<Note> = asc
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, n)| *n)
            .collect();
        let isolated = Chord::new(vec![*note]).expect("single note is a valid chord");
        let remainder = Chord::new(rest).expect("chord subset stays valid");
        if isolate_high {
            pairs.push(GuidePair {
                early: remainder,
                late: isolated,
            });
        } else {
            pairs.push(GuidePair {
                early: isolated,
                late: remainder,
            });
        }
    }
    pairs
}

/// Differential between the whole chord scored under the resource and only
/// the auto-hit activation note scored under it.
pub fn activation_squeeze(chord: &Chord, combo: u32) -> Option<ActivationSqueeze> {
    if chord.len() < 2 {
        return None;
    }
    let asc = chord.notes_ascending();
    // The activation note sits last in ascending order; every other note's
    // doubling surplus is its base value at its combo position.
    let gain: u32 = asc[..asc.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, n)| n.base_score() * multiplier_at(combo + i as u32))
        .sum();
    if gain == 0 {
        return None;
    }
    Some(ActivationSqueeze {
        chord: chord.clone(),
        combo,
        gain,
    })
}
