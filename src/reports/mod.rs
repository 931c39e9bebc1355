// ===== starpath/src/reports/mod.rs =====
use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use starpath::api::AnalysisReport;
use starpath::error::SpResult;
use starpath::path::PhraseBoundary;
use starpath::records::{PathRecord, RecordForest};
use starpath::timeline::ChartStats;
use std::fs::File;

pub fn print_chart_stats(stats: &ChartStats) {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    table.add_row(vec![
        Cell::new("Events"),
        Cell::new("Notes"),
        Cell::new("Cymbals"),
        Cell::new("Accents"),
        Cell::new("Ghosts"),
        Cell::new("Phrases"),
        Cell::new("Fills"),
        Cell::new("Solo"),
        Cell::new("Measures"),
        Cell::new("Length"),
    ]);
    table.add_row(vec![
        Cell::new(stats.events),
        Cell::new(stats.notes),
        Cell::new(stats.cymbals),
        Cell::new(stats.accents),
        Cell::new(stats.ghosts),
        Cell::new(stats.phrase_ends),
        Cell::new(stats.fills),
        Cell::new(stats.solo_events),
        Cell::new(format!("{:.1}", stats.measures)),
        Cell::new(format!("{:.0}s", stats.duration_s)),
    ]);
    println!("\n{}", table);
}

/// Color banding for input tightness, matching the rating bands.
fn difficulty_cell(ms: f64) -> Cell {
    let text = format!("{:.0}", ms);
    if ms < 25.0 {
        Cell::new(text).fg(Color::Green)
    } else if ms < 70.0 {
        Cell::new(text).fg(Color::Yellow)
    } else {
        Cell::new(text).fg(Color::Red)
    }
}

pub fn print_ranked_paths(report: &AnalysisReport) {
    let forest = &report.forest;
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("Path").add_attribute(Attribute::Bold),
        Cell::new("Total").fg(Color::Cyan),
        Cell::new("Best Case"),
        Cell::new("Base"),
        Cell::new("Combo"),
        Cell::new("SP").fg(Color::Green),
        Cell::new("Solo"),
        Cell::new("Accent"),
        Cell::new("Ghost"),
        Cell::new("Acts"),
        Cell::new("Skips"),
        Cell::new("Diff ms"),
    ]);
    for i in 1..=11 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for (rank, (idx, depth)) in forest.depth_first().into_iter().enumerate() {
        let node = &forest.nodes()[idx];
        let r = &node.record;
        let label = if depth == 0 {
            format!("#{}", rank + 1)
        } else {
            // Variant rows show where they peel off the parent.
            format!(
                "{}#{} (var @{})",
                "  ".repeat(depth),
                rank + 1,
                node.divergence.unwrap_or(0)
            )
        };
        let b = &r.breakdown;
        table.add_row(vec![
            Cell::new(label).add_attribute(Attribute::Bold),
            Cell::new(r.total_score).fg(Color::Cyan),
            Cell::new(r.best_case_score),
            Cell::new(b.base),
            Cell::new(b.combo_bonus),
            Cell::new(b.resource).fg(Color::Green),
            Cell::new(b.solo),
            Cell::new(b.accent),
            Cell::new(b.ghost),
            Cell::new(r.activations.len()),
            Cell::new(r.skip_notation()),
            difficulty_cell(r.max_difficulty_ms),
        ]);
    }
    println!("\n{}", table);
    println!(
        "Optimal {} pts; {} of {} searched paths admitted.",
        report.optimal_score, report.admitted_paths, report.searched_paths
    );
}

fn phrase_marker(p: PhraseBoundary) -> &'static str {
    match p {
        PhraseBoundary::NotApplicable => "",
        PhraseBoundary::ExtendedEarly => "ext-early",
        PhraseBoundary::EndedLate => "end-late",
    }
}

pub fn print_path_details(forest: &RecordForest, top: usize) {
    for (shown, (idx, _)) in forest.depth_first().into_iter().take(top).enumerate() {
        let record = &forest.nodes()[idx].record;
        print_one_path(shown + 1, record);
    }
}

fn print_one_path(rank: usize, record: &PathRecord) {
    println!(
        "\n=== Path #{} — {} pts ({}) ===",
        rank,
        record.total_score,
        record.skip_notation()
    );

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![
        Cell::new("Act").add_attribute(Attribute::Bold),
        Cell::new("Measure"),
        Cell::new("Chord"),
        Cell::new("Meter"),
        Cell::new("Skips"),
        Cell::new("Calib ms"),
        Cell::new("Entry Squeeze"),
        Cell::new("Phrase"),
    ]);
    for (i, a) in record.activations.iter().enumerate() {
        let calib = a
            .calibration_ms
            .map(|c| format!("{:+.0}", c))
            .unwrap_or_default();
        let entry = a
            .entry_squeeze
            .as_ref()
            .map(|s| format!("+{} ({})", s.gain, s.hint()))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{:.2}", a.measure)),
            Cell::new(a.chord.to_string()),
            Cell::new(format!("{:.0}%", a.meter * 100.0)),
            Cell::new(if a.skips_timing_sensitive {
                format!("{}*", a.skips)
            } else {
                a.skips.to_string()
            }),
            Cell::new(calib),
            Cell::new(entry),
            Cell::new(phrase_marker(a.phrase_boundary)),
        ]);
    }
    println!("{}", table);

    let boundaries: Vec<String> = record
        .activations
        .iter()
        .flat_map(|a| a.boundary_squeezes.iter())
        .map(|b| format!("  {} {}", b.symbol(), b.description()))
        .collect();
    if !boundaries.is_empty() {
        println!("Boundary squeezes:");
        for line in boundaries {
            println!("{}", line);
        }
    }

    if !record.squeezes.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(ASCII_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new("Multiplier Squeeze").add_attribute(Attribute::Bold),
            Cell::new("Combo"),
            Cell::new("Gain").fg(Color::Green),
            Cell::new("Hint"),
        ]);
        for s in &record.squeezes {
            table.add_row(vec![
                Cell::new(s.chord.to_string()),
                Cell::new(s.combo),
                Cell::new(format!("+{}", s.gain)).fg(Color::Green),
                Cell::new(s.hint()),
            ]);
        }
        println!("{}", table);
    }
}

pub fn export_csv(path: &str, forest: &RecordForest) -> SpResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "rank",
        "total",
        "best_case",
        "base",
        "combo_bonus",
        "resource",
        "solo",
        "accent",
        "ghost",
        "activations",
        "skips",
        "difficulty_ms",
    ])?;
    for (rank, (idx, _)) in forest.depth_first().into_iter().enumerate() {
        let r = &forest.nodes()[idx].record;
        let b = &r.breakdown;
        writer.write_record([
            (rank + 1).to_string(),
            r.total_score.to_string(),
            r.best_case_score.to_string(),
            b.base.to_string(),
            b.combo_bonus.to_string(),
            b.resource.to_string(),
            b.solo.to_string(),
            b.accent.to_string(),
            b.ghost.to_string(),
            r.activations.len().to_string(),
            r.skip_notation(),
            format!("{:.1}", r.max_difficulty_ms),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_json(path: &str, report: &AnalysisReport) -> SpResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
