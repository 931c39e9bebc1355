mod common;

use common::*;
use starpath::api;
use starpath::chart::Lane;
use starpath::config::AnalysisParams;
use starpath::optimizer::Optimizer;
use starpath::path::Path;
use starpath::records::RecordForest;
use starpath::timeline::Timeline;
use starpath::verifier::Verifier;

/// Decision-rich chart: two usable fills, a mid-song phrase batch, and a
/// phrase end close to the meter runout.
fn branching_timeline() -> Timeline {
    let mut events = grant_block(1.0);
    events.push(fill_ev(3.0, 2.5, vec![cym(Lane::Green)]));
    events.extend((0..6).map(|i| ev(3.5 + i as f64 * 0.5, vec![tom(Lane::Red)])));
    events.extend(grant_block(6.5));
    events.push(fill_ev(8.0, 7.5, vec![cym(Lane::Green), tom(Lane::Red)]));
    events.extend((0..4).map(|i| ev(8.5 + i as f64 * 0.5, vec![tom(Lane::Blue)])));
    events.push(phrase_ev(11.0, vec![tom(Lane::Red)]));
    timeline(events)
}

fn run(tl: &Timeline, exhaustive: bool) -> Vec<Path> {
    let params = AnalysisParams {
        exhaustive,
        ..AnalysisParams::default()
    };
    Optimizer::new(params).run(tl).expect("search must complete")
}

#[test]
fn test_pruned_search_matches_brute_force_optimum() {
    let tl = branching_timeline();

    let exhaustive = run(&tl, true);
    let pruned = run(&tl, false);

    let brute_best = exhaustive.iter().map(Path::total_score).max().unwrap();
    let pruned_best = pruned.iter().map(Path::total_score).max().unwrap();

    assert_eq!(pruned_best, brute_best, "pruning must never lose the optimum");
    assert!(pruned.len() <= exhaustive.len());
}

#[test]
fn test_forks_produce_multiple_terminal_paths() {
    let tl = branching_timeline();
    let exhaustive = run(&tl, true);
    // Two fill decisions (the second unreachable on one branch) plus the
    // boundary fork keep several futures alive.
    assert!(
        exhaustive.len() >= 3,
        "expected a branching search, got {} paths",
        exhaustive.len()
    );
}

#[test]
fn test_reruns_are_bit_identical() {
    let tl = branching_timeline();
    let params = AnalysisParams::default();

    let a = api::analyze_timeline(&tl, &params).unwrap();
    let b = api::analyze_timeline(&tl, &params).unwrap();

    let ja = serde_json::to_string(&a).unwrap();
    let jb = serde_json::to_string(&b).unwrap();
    assert_eq!(ja, jb, "same timeline must produce bit-identical reports");
}

#[test]
fn test_replay_from_activation_log_reproduces_every_score() {
    let tl = branching_timeline();
    let report = api::analyze_timeline(
        &tl,
        &AnalysisParams {
            score_depth: Some(u32::MAX),
            ..AnalysisParams::default()
        },
    )
    .unwrap();

    let verifier = Verifier::new(&tl);
    assert!(!report.forest.is_empty());
    for record in report.forest.records() {
        let replayed = verifier.replay(&record.activations).unwrap();
        assert_eq!(replayed.total_score(), record.total_score);
        assert_eq!(replayed.scores, record.breakdown);
    }
}

#[test]
fn test_terminal_paths_share_the_accumulator_identity() {
    let tl = branching_timeline();
    for path in run(&tl, true) {
        let b = &path.scores;
        let sum = b.base + b.combo_bonus + b.resource + b.solo + b.accent + b.ghost;
        assert_eq!(path.total_score(), sum);
        assert!((0.0..=1.0).contains(&path.meter));
    }
}

#[test]
fn test_synthetic_fills_behave_like_authored_ones() {
    // Same chart twice: one relies on synthesis, one authors the fills the
    // synthesizer would have placed (wide margins, so regime choices match).
    let base_events = || {
        let mut events = grant_block(0.5);
        events.extend((0..17).map(|i| ev(1.5 + i as f64 * 0.5, vec![tom(Lane::Red)])));
        events
    };

    let mut synthesized = timeline(base_events());
    assert!(!synthesized.has_fills());
    assert!(synthesized.synthesize_fills(4) > 0);

    let mut authored_events = base_events();
    for e in authored_events.iter_mut() {
        let m = e.time.measure;
        if m == 4.0 || m == 8.0 {
            *e = fill_ev(m, m - 1.0, vec![tom(Lane::Red)]);
        }
    }
    let authored = timeline(authored_events);
    assert!(authored.has_fills());

    let params = AnalysisParams::default();
    let a = api::analyze_timeline(&synthesized, &params).unwrap();
    let b = api::analyze_timeline(&authored, &params).unwrap();
    assert_eq!(
        serde_json::to_string(&a.forest).unwrap(),
        serde_json::to_string(&b.forest).unwrap()
    );
}

#[test]
fn test_admission_filters_exclude_without_steering_the_search() {
    // A forced fill: the only activation needs a sub-50ms input.
    let mut events = grant_block(1.0);
    let start = tp(1.25).early_s - 0.025;
    events.push(fill_ev_at(3.0, start, vec![cym(Lane::Green)]));
    events.extend((0..4).map(|i| ev(3.5 + i as f64 * 0.5, vec![tom(Lane::Red)])));
    let tl = timeline(events);

    let unfiltered = api::analyze_timeline(&tl, &AnalysisParams::default()).unwrap();
    let filtered = api::analyze_timeline(
        &tl,
        &AnalysisParams {
            score_depth: Some(u32::MAX),
            max_squeeze_ms: Some(10.0),
            ..AnalysisParams::default()
        },
    )
    .unwrap();

    // The searched optimum is identical; only the report shrinks.
    assert_eq!(filtered.optimal_score, unfiltered.optimal_score);
    assert!(filtered.admitted_paths < filtered.searched_paths);
    assert!(filtered.forest.best_score() < filtered.optimal_score);
}

#[test]
fn test_score_tied_paths_link_as_variants() {
    use starpath::path::{Activation, PhraseBoundary};
    use std::sync::Arc;

    let act = |seconds: f64| {
        Arc::new(Activation {
            chord: chord(vec![cym(Lane::Green)]),
            skips: 0,
            skips_timing_sensitive: false,
            meter: 1.0,
            calibration_ms: None,
            entry_squeeze: None,
            boundary_squeezes: Vec::new(),
            phrase_boundary: PhraseBoundary::NotApplicable,
            seconds,
            measure: seconds / 2.0,
            beat: seconds * 2.0,
        })
    };

    let mut short = Path::new();
    short.scores.base = 1000;
    short.activations = vec![act(6.0)];

    let mut long = Path::new();
    long.scores.base = 1000;
    long.activations = vec![short.activations[0].clone(), act(16.0)];

    let mut other = Path::new();
    other.scores.base = 900;
    other.activations = vec![act(20.0)];

    let forest = RecordForest::assemble(vec![long, other, short]).unwrap();

    assert_eq!(forest.len(), 3);
    assert_eq!(forest.roots().len(), 2, "tied pair folds under one root");

    let dfs = forest.depth_first();
    assert_eq!(dfs[0].1, 0);
    assert_eq!(dfs[1].1, 1, "variant hangs under the shorter form");
    let variant = &forest.nodes()[dfs[1].0];
    assert_eq!(variant.divergence, Some(1));
    assert_eq!(variant.parent, Some(dfs[0].0));
}
