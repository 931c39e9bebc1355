#![allow(dead_code)]
use starpath::chart::{Chord, Dynamic, Lane, Note, Surface};
use starpath::timeline::{Event, FillContext, TimePoint, Timeline};

/// Fixture clock: 120 BPM in 4/4, so one measure lasts two seconds and a
/// 192-resolution chart puts 768 ticks in a measure.
pub const SECS_PER_MEASURE: f64 = 2.0;
pub const TICKS_PER_MEASURE: u32 = 768;

pub fn tp(measure: f64) -> TimePoint {
    let seconds = measure * SECS_PER_MEASURE;
    TimePoint {
        tick: (measure * TICKS_PER_MEASURE as f64) as u32,
        seconds,
        measure,
        beat: measure * 4.0,
        early_s: seconds - 0.070,
        late_s: seconds + 0.070,
    }
}

pub fn tom(lane: Lane) -> Note {
    Note::drum(lane)
}

pub fn cym(lane: Lane) -> Note {
    Note::cymbal(lane)
}

pub fn accent(lane: Lane) -> Note {
    Note::new(lane, Dynamic::Accent, Surface::Drum, false).unwrap()
}

pub fn ghost(lane: Lane) -> Note {
    Note::new(lane, Dynamic::Ghost, Surface::Drum, false).unwrap()
}

pub fn chord(notes: Vec<Note>) -> Chord {
    Chord::new(notes).unwrap()
}

pub fn ev(measure: f64, notes: Vec<Note>) -> Event {
    Event {
        chord: chord(notes),
        phrase_end: false,
        solo: false,
        fill: None,
        time: tp(measure),
        bpm: None,
        signature: None,
    }
}

pub fn phrase_ev(measure: f64, notes: Vec<Note>) -> Event {
    let mut e = ev(measure, notes);
    e.phrase_end = true;
    e
}

pub fn solo_ev(measure: f64, notes: Vec<Note>) -> Event {
    let mut e = ev(measure, notes);
    e.solo = true;
    e
}

pub fn fill_ev(measure: f64, start_measure: f64, notes: Vec<Note>) -> Event {
    let mut e = ev(measure, notes);
    e.fill = Some(FillContext {
        start_seconds: start_measure * SECS_PER_MEASURE,
        start_measure,
        start_beat: start_measure * 4.0,
    });
    e
}

/// A fill terminus whose window opens exactly on the given instant,
/// for margin-controlled tests.
pub fn fill_ev_at(measure: f64, start_seconds: f64, notes: Vec<Note>) -> Event {
    let mut e = ev(measure, notes);
    e.fill = Some(FillContext {
        start_seconds,
        start_measure: measure - 0.5,
        start_beat: (measure - 0.5) * 4.0,
    });
    e
}

pub fn timeline(events: Vec<Event>) -> Timeline {
    Timeline::new(events, None).expect("fixture timeline must be valid")
}

/// Four quarter-note phrase grants filling the meter, starting at `measure`.
/// The ready snapshot lands on the second grant.
pub fn grant_block(measure: f64) -> Vec<Event> {
    (0..4)
        .map(|i| phrase_ev(measure + i as f64 * 0.25, vec![tom(Lane::Red)]))
        .collect()
}
