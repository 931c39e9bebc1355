// ===== starpath/src/chart.rs =====
use crate::error::{SpResult, StarPathError};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

// === SCORING CONSTANTS ===

pub const DRUM_NOTE_SCORE: u32 = 50;
pub const CYMBAL_NOTE_SCORE: u32 = 65;

/// Combo positions per multiplier tier (10 notes -> next tier).
pub const COMBO_PER_TIER: u32 = 10;
pub const MULTIPLIER_CAP: u32 = 4;

/// 1x-4x multiplier for a note landing at the given combo position.
#[inline(always)]
pub fn multiplier_at(combo: u32) -> u32 {
    (combo / COMBO_PER_TIER + 1).min(MULTIPLIER_CAP)
}

// === NOTE MODEL ===

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Kick,
    Red,
    Yellow,
    Blue,
    Green,
}

impl Lane {
    /// Yellow/Blue/Green carry the cymbal/tom distinction; Red and Kick never do.
    pub fn supports_cymbal(self) -> bool {
        matches!(self, Lane::Yellow | Lane::Blue | Lane::Green)
    }

    pub fn short_code(self) -> &'static str {
        match self {
            Lane::Kick => "K",
            Lane::Red => "R",
            Lane::Yellow => "Y",
            Lane::Blue => "B",
            Lane::Green => "G",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Dynamic {
    #[default]
    Normal,
    Ghost,
    Accent,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    #[default]
    Drum,
    Cymbal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Note {
    pub lane: Lane,
    #[serde(default)]
    pub dynamic: Dynamic,
    #[serde(default)]
    pub surface: Surface,
    #[serde(default)]
    pub double_kick: bool,
}

impl Note {
    pub fn new(lane: Lane, dynamic: Dynamic, surface: Surface, double_kick: bool) -> SpResult<Self> {
        if surface == Surface::Cymbal && !lane.supports_cymbal() {
            return Err(StarPathError::Validation(format!(
                "cymbal surface is not valid on lane '{}'",
                lane
            )));
        }
        if double_kick && lane != Lane::Kick {
            return Err(StarPathError::Validation(format!(
                "double-kick flag is not valid on lane '{}'",
                lane
            )));
        }
        Ok(Note {
            lane,
            dynamic,
            surface,
            double_kick,
        })
    }

    pub fn drum(lane: Lane) -> Self {
        Note {
            lane,
            dynamic: Dynamic::Normal,
            surface: Surface::Drum,
            double_kick: false,
        }
    }

    pub fn cymbal(lane: Lane) -> Self {
        Note {
            lane,
            dynamic: Dynamic::Normal,
            surface: Surface::Cymbal,
            double_kick: false,
        }
    }

    /// Base points without the ghost/accent doubling.
    #[inline(always)]
    pub fn plain_score(&self) -> u32 {
        match self.surface {
            Surface::Drum => DRUM_NOTE_SCORE,
            Surface::Cymbal => CYMBAL_NOTE_SCORE,
        }
    }

    /// Base points including the ghost/accent doubling.
    #[inline(always)]
    pub fn base_score(&self) -> u32 {
        match self.dynamic {
            Dynamic::Normal => self.plain_score(),
            Dynamic::Ghost | Dynamic::Accent => self.plain_score() * 2,
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.double_kick {
            write!(f, "2K")?;
        } else {
            write!(f, "{}", self.lane.short_code())?;
        }
        if self.surface == Surface::Cymbal {
            write!(f, "c")?;
        }
        match self.dynamic {
            Dynamic::Normal => Ok(()),
            Dynamic::Accent => write!(f, "!"),
            Dynamic::Ghost => write!(f, "~"),
        }
    }
}

// === CHORD MODEL ===

/// Simultaneous notes at one instant, at most one per lane.
/// The kick lane is the exception: it may hold a normal kick plus a
/// double-kick note at the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Chord {
    notes: Vec<Note>,
}

impl Chord {
    pub fn new(mut notes: Vec<Note>) -> SpResult<Self> {
        for n in &notes {
            // Re-run the per-note checks; notes may arrive from deserialization.
            Note::new(n.lane, n.dynamic, n.surface, n.double_kick)?;
        }
        notes.sort_by_key(|n| (n.lane, n.double_kick));
        for pair in notes.windows(2) {
            if pair[0].lane == pair[1].lane {
                let kick_pair = pair[0].lane == Lane::Kick
                    && !pair[0].double_kick
                    && pair[1].double_kick;
                if !kick_pair {
                    return Err(StarPathError::Validation(format!(
                        "duplicate assignment on lane '{}'",
                        pair[0].lane
                    )));
                }
            }
        }
        Ok(Chord { notes })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn ghost_count(&self) -> usize {
        self.notes
            .iter()
            .filter(|n| n.dynamic == Dynamic::Ghost)
            .count()
    }

    pub fn accent_count(&self) -> usize {
        self.notes
            .iter()
            .filter(|n| n.dynamic == Dynamic::Accent)
            .count()
    }

    /// Notes ordered lowest base score first; lane order breaks ties.
    pub fn notes_ascending(&self) -> Vec<Note> {
        let mut v = self.notes.clone();
        v.sort_by_key(|n| (n.base_score(), n.lane, n.double_kick));
        v
    }

    /// Notes ordered highest base score first; lane order breaks ties.
    pub fn notes_descending(&self) -> Vec<Note> {
        let mut v = self.notes_ascending();
        v.reverse();
        v
    }

    pub fn plain_total(&self) -> u32 {
        self.notes.iter().map(|n| n.plain_score()).sum()
    }

    pub fn base_total(&self) -> u32 {
        self.notes.iter().map(|n| n.base_score()).sum()
    }

    pub fn min_note_score(&self) -> u32 {
        self.notes.iter().map(|n| n.base_score()).min().unwrap_or(0)
    }

    pub fn max_note_score(&self) -> u32 {
        self.notes.iter().map(|n| n.base_score()).max().unwrap_or(0)
    }

    /// The note the game auto-hits when this chord activates a fill:
    /// highest base score, lane order breaking ties.
    pub fn activation_note(&self) -> Option<Note> {
        self.notes_descending().into_iter().next()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, n) in self.notes.iter().enumerate() {
            if i > 0 {
                write!(f, "+")?;
            }
            write!(f, "{}", n)?;
        }
        Ok(())
    }
}

// === CHORD SCORING ===

/// Points a single chord contributes, decomposed into the host game's
/// breakdown categories. `sp_surplus` is the doubling the resource adds on
/// top of everything else; callers route it to the resource accumulator or
/// to a boundary squeeze.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChordScore {
    pub base: u32,
    pub combo_bonus: u32,
    pub accent: u32,
    pub ghost: u32,
    pub sp_surplus: u32,
}

impl ChordScore {
    pub fn guaranteed(&self) -> u32 {
        self.base + self.combo_bonus + self.accent + self.ghost
    }

    pub fn total(&self) -> u32 {
        self.guaranteed() + self.sp_surplus
    }
}

/// Score a chord entering at `combo`, notes assigned to combo positions in
/// best-case order (lowest value at the lowest position). Each note advances
/// the combo by one, so a chord can straddle a multiplier threshold.
pub fn score_chord(chord: &Chord, combo: u32, sp_active: bool) -> ChordScore {
    let mut out = ChordScore::default();
    for (i, note) in chord.notes_ascending().iter().enumerate() {
        let m = multiplier_at(combo + i as u32);
        let plain = note.plain_score();
        let full = note.base_score();

        out.base += plain;
        out.combo_bonus += plain * (m - 1);
        let dyn_extra = (full - plain) * m;
        match note.dynamic {
            Dynamic::Accent => out.accent += dyn_extra,
            Dynamic::Ghost => out.ghost += dyn_extra,
            Dynamic::Normal => {}
        }
        if sp_active {
            out.sp_surplus += full * m;
        }
    }
    out
}

/// Raw points for notes hit in the given order at `combo`, resource factored in.
pub fn ordered_total(notes: &[Note], combo: u32, sp_active: bool) -> u32 {
    let sp = if sp_active { 2 } else { 1 };
    notes
        .iter()
        .enumerate()
        .map(|(i, n)| n.base_score() * multiplier_at(combo + i as u32) * sp)
        .sum()
}
