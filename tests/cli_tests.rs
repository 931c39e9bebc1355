use regex::Regex;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

struct TestContext {
    _dir: TempDir,
    timeline_path: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let timeline_path = dir.path().join("chart.json");

        // Four phrase grants, one authored fill, a tail of toms.
        let doc = serde_json::json!({
            "tempo_map": { "resolution": 192, "tempos": [{ "tick": 0, "bpm": 120.0 }] },
            "events": [
                { "tick": 768,  "notes": [{ "lane": "red" }], "phrase_end": true },
                { "tick": 960,  "notes": [{ "lane": "red" }], "phrase_end": true },
                { "tick": 1152, "notes": [{ "lane": "red" }], "phrase_end": true },
                { "tick": 1344, "notes": [{ "lane": "red" }], "phrase_end": true },
                { "tick": 2304, "notes": [{ "lane": "green", "surface": "cymbal" }],
                  "fill": { "start_tick": 1920 } },
                { "tick": 2688, "notes": [{ "lane": "blue" }] },
                { "tick": 3072, "notes": [{ "lane": "red" }, { "lane": "kick" }] },
                { "tick": 3456, "notes": [{ "lane": "yellow", "surface": "cymbal" }] }
            ]
        });
        fs::write(&timeline_path, doc.to_string()).unwrap();

        Self {
            _dir: dir,
            timeline_path,
        }
    }

    fn run(&self, args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_starpath"))
            .args(args)
            .output()
            .expect("binary must run")
    }
}

#[test]
fn test_validate_prints_chart_stats() {
    let ctx = TestContext::new();
    let out = ctx.run(&["validate", ctx.timeline_path.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Events"), "stats table header missing");
    assert!(stdout.contains("Fills"));
}

#[test]
fn test_analyze_reports_an_optimum() {
    let ctx = TestContext::new();
    let out = ctx.run(&["analyze", ctx.timeline_path.to_str().unwrap()]);
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    let optimal = Regex::new(r"Optimal (\d+) pts").unwrap();
    let caps = optimal.captures(&stdout).expect("summary line missing");
    let score: u32 = caps[1].parse().unwrap();
    assert!(score > 0);
    assert!(stdout.contains("Best Case"));
}

#[test]
fn test_analyze_exports_csv_and_json() {
    let ctx = TestContext::new();
    let csv_path = ctx._dir.path().join("paths.csv");
    let json_path = ctx._dir.path().join("report.json");

    let out = ctx.run(&[
        "analyze",
        ctx.timeline_path.to_str().unwrap(),
        "--csv",
        csv_path.to_str().unwrap(),
        "--json",
        json_path.to_str().unwrap(),
    ]);
    assert!(out.status.success());

    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("rank,total,best_case"));
    assert!(csv.lines().count() >= 2, "at least one path row");

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert!(report["optimalScore"].as_u64().unwrap() > 0);
    assert!(report["forest"]["nodes"].is_array());
}

#[test]
fn test_malformed_timeline_fails_loudly() {
    let ctx = TestContext::new();
    let bad_path = ctx._dir.path().join("bad.json");
    fs::write(
        &bad_path,
        serde_json::json!({
            "events": [
                { "tick": 0, "seconds": 1.0, "measure": 0.5,
                  "notes": [{ "lane": "red" }, { "lane": "red" }] }
            ]
        })
        .to_string(),
    )
    .unwrap();

    let out = ctx.run(&["validate", bad_path.to_str().unwrap()]);
    assert!(!out.status.success(), "duplicate lanes must fail the run");
}
