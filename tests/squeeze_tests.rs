mod common;

use common::{chord, cym, ghost, tom};
use rstest::rstest;
use starpath::chart::{multiplier_at, score_chord, Lane};
use starpath::squeeze::{
    activation_squeeze, guide_chords, multiplier_squeeze, BoundaryKind, BoundarySqueeze, Rating,
};

// --- MULTIPLIER SCHEDULE ---
#[rstest]
#[case(0, 1)] // Opening note
#[case(9, 1)] // Last 1x position
#[case(10, 2)] // First 2x position
#[case(19, 2)]
#[case(20, 3)]
#[case(29, 3)]
#[case(30, 4)] // Cap
#[case(500, 4)] // Stays capped
fn test_multiplier_schedule(#[case] combo: u32, #[case] expected: u32) {
    assert_eq!(multiplier_at(combo), expected);
}

// --- MULTIPLIER SQUEEZE ---

#[test]
fn test_two_note_straddle_is_exactly_fifteen() {
    // Cymbal (65) + tom (50) entering at combo 9: the second note lands on
    // the 2x threshold. Best = 50*1 + 65*2 = 180, worst = 65*1 + 50*2 = 165.
    let c = chord(vec![cym(Lane::Yellow), tom(Lane::Red)]);
    let sq = multiplier_squeeze(&c, 9, false).expect("straddle must squeeze");
    assert_eq!(sq.gain, 15);

    let pairs = guide_chords(&c, 9);
    assert_eq!(pairs.len(), 1, "two-note chord yields exactly one pair");
    // Oriented "hit the tom first".
    assert_eq!(pairs[0].early.notes()[0].lane, Lane::Red);
    assert_eq!(pairs[0].late.notes()[0].lane, Lane::Yellow);
}

#[test]
fn test_squeeze_doubles_under_resource() {
    let c = chord(vec![cym(Lane::Yellow), tom(Lane::Red)]);
    let plain = multiplier_squeeze(&c, 9, false).unwrap().gain;
    let doubled = multiplier_squeeze(&c, 9, true).unwrap().gain;
    assert_eq!(doubled, plain * 2);
}

#[rstest]
#[case(0)] // Deep inside the 1x tier
#[case(12)] // Deep inside the 2x tier
#[case(40)] // Past the cap
fn test_no_squeeze_away_from_thresholds(#[case] combo: u32) {
    let c = chord(vec![cym(Lane::Yellow), tom(Lane::Red)]);
    assert!(multiplier_squeeze(&c, combo, false).is_none());
}

#[test]
fn test_equal_notes_never_squeeze() {
    let c = chord(vec![tom(Lane::Red), tom(Lane::Blue)]);
    assert!(multiplier_squeeze(&c, 9, false).is_none());
    assert!(guide_chords(&c, 9).is_empty());
}

// --- GUIDE CHORDS, 3+ NOTES ---

#[test]
fn test_guide_isolates_unique_high_note_last() {
    // R(50) + Y(50) + Gc(65): the crash is the scarce extreme, hit it last.
    let c = chord(vec![tom(Lane::Red), tom(Lane::Yellow), cym(Lane::Green)]);
    let pairs = guide_chords(&c, 9);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].early.len(), 2);
    assert_eq!(pairs[0].late.notes()[0].lane, Lane::Green);
}

#[test]
fn test_guide_isolates_unique_low_note_first() {
    // R(50) + Yc(65) + Gc(65): the tom is the scarce extreme, hit it first.
    let c = chord(vec![tom(Lane::Red), cym(Lane::Yellow), cym(Lane::Green)]);
    let pairs = guide_chords(&c, 9);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].early.notes()[0].lane, Lane::Red);
    assert_eq!(pairs[0].late.len(), 2);
}

#[test]
fn test_guide_pairs_multiply_on_extreme_ties() {
    // Two toms tie at the low extreme: one pair per isolation.
    let c = chord(vec![
        tom(Lane::Red),
        tom(Lane::Blue),
        cym(Lane::Yellow),
        cym(Lane::Green),
    ]);
    let pairs = guide_chords(&c, 9);
    assert_eq!(pairs.len(), 2);
    for p in &pairs {
        assert_eq!(p.early.len(), 1);
        assert_eq!(p.early.notes()[0].plain_score(), 50);
        assert_eq!(p.late.len(), 3);
    }
}

// --- ACTIVATION SQUEEZE ---

#[test]
fn test_activation_squeeze_excludes_auto_hit() {
    // Gc(65) auto-hits; only the tom can be dragged under the resource.
    let c = chord(vec![tom(Lane::Red), cym(Lane::Green)]);
    let sq = activation_squeeze(&c, 0).expect("two notes must squeeze");
    assert_eq!(sq.gain, 50);
    assert!(activation_squeeze(&chord(vec![cym(Lane::Green)]), 0).is_none());
}

#[test]
fn test_activation_squeeze_counts_positions() {
    // R(50) + B(50) + Gc(65) at combo 9: the two toms sit at 1x and 2x.
    let c = chord(vec![tom(Lane::Red), tom(Lane::Blue), cym(Lane::Green)]);
    let sq = activation_squeeze(&c, 9).unwrap();
    assert_eq!(sq.gain, 50 + 100);
}

// --- BOUNDARY RATING TABLE (strictly less-than bands) ---
#[rstest]
#[case(-140.0, Rating::Free)]
#[case(-100.5, Rating::Free)]
#[case(-100.0, Rating::Easy)] // Band edge belongs to the harder side
#[case(-26.0, Rating::Easy)]
#[case(-25.0, Rating::Normal)]
#[case(2.0, Rating::Normal)]
#[case(24.9, Rating::Normal)]
#[case(25.0, Rating::Hard)]
#[case(69.9, Rating::Hard)]
#[case(70.0, Rating::Insane)]
#[case(139.9, Rating::Insane)]
#[case(140.0, Rating::Impossible)]
#[case(500.0, Rating::Impossible)]
fn test_rating_bands(#[case] offset_ms: f64, #[case] expected: Rating) {
    assert_eq!(Rating::from_offset_ms(offset_ms), expected);
}

#[test]
fn test_boundary_squeeze_difficulty_ignores_slack() {
    let c = chord(vec![tom(Lane::Red)]);
    let free = BoundarySqueeze::new(BoundaryKind::In, c.clone(), 100, -180.0);
    assert_eq!(free.rating, Rating::Free);
    assert_eq!(free.difficulty_ms(), 0.0);

    let tight = BoundarySqueeze::new(BoundaryKind::Out, c, 100, 45.0);
    assert_eq!(tight.rating, Rating::Hard);
    assert_eq!(tight.difficulty_ms(), 45.0);
}

// --- CHORD SCORE DECOMPOSITION ---

#[test]
fn test_breakdown_sums_to_raw_total() {
    // Ghost snare (100) + yellow cymbal (65) straddling 2x at combo 9.
    // Best-case order puts the cymbal at 1x and the ghost at 2x.
    let c = chord(vec![ghost(Lane::Red), cym(Lane::Yellow)]);
    let cs = score_chord(&c, 9, false);
    assert_eq!(cs.base, 65 + 50);
    assert_eq!(cs.combo_bonus, 50); // plain snare surplus at 2x
    assert_eq!(cs.ghost, 100); // (100-50) * 2x
    assert_eq!(cs.accent, 0);
    assert_eq!(cs.sp_surplus, 0);
    assert_eq!(cs.total(), 65 * 1 + 100 * 2);
}

#[test]
fn test_resource_surplus_equals_doubling() {
    let c = chord(vec![tom(Lane::Red), cym(Lane::Green)]);
    let plain = score_chord(&c, 0, false);
    let sp = score_chord(&c, 0, true);
    assert_eq!(sp.sp_surplus, plain.total());
    assert_eq!(sp.total(), plain.total() * 2);
}
