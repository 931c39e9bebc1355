// ===== starpath/src/api.rs =====
use crate::config::AnalysisParams;
use crate::error::SpResult;
use crate::optimizer::Optimizer;
use crate::path::Path;
use crate::records::RecordForest;
use crate::timeline::{ChartStats, Timeline};
use serde::Serialize;
use tracing::{info, warn};

/// Everything a run produces: the ranked forest plus the chart statistics
/// and admission bookkeeping. Write-once; downstream persistence serializes
/// it as-is.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub stats: ChartStats,
    pub forest: RecordForest,
    /// Terminal paths the search produced before admission filtering.
    pub searched_paths: usize,
    /// Paths that made it into the forest.
    pub admitted_paths: usize,
    pub optimal_score: u32,
}

/// Service: run the full path search over a loaded timeline.
pub fn analyze_timeline(timeline: &Timeline, params: &AnalysisParams) -> SpResult<AnalysisReport> {
    let optimizer = Optimizer::new(params.clone());
    let live = optimizer.run(timeline)?;
    let searched = live.len();
    let optimal = live.iter().map(Path::total_score).max().unwrap_or(0);

    // Admission filters are reporting-only; the search above already ran on
    // the unfiltered set.
    let admitted: Vec<Path> = live
        .into_iter()
        .filter(|p| match params.score_depth {
            Some(depth) => optimal - p.total_score() <= depth,
            None => p.total_score() == optimal,
        })
        .filter(|p| match params.max_squeeze_ms {
            Some(cap) => p.max_difficulty_ms() <= cap,
            None => true,
        })
        .collect();

    if admitted.is_empty() {
        warn!(
            "Admission filters excluded every path (searched {}); \
             relax --score-depth / --max-squeeze-ms",
            searched
        );
    }
    let admitted_count = admitted.len();
    let forest = RecordForest::assemble(admitted)?;
    info!(
        "Analysis: optimal {} points, {} of {} paths admitted",
        optimal, admitted_count, searched
    );

    Ok(AnalysisReport {
        stats: timeline.stats(),
        forest,
        searched_paths: searched,
        admitted_paths: admitted_count,
        optimal_score: optimal,
    })
}

/// Service: load, normalize and contract-check a timeline file.
pub fn load_timeline(path: &str, params: &AnalysisParams) -> SpResult<Timeline> {
    let mut timeline = Timeline::load_from_file(path)?;
    if !timeline.has_fills() && params.fill_cadence > 0 {
        timeline.synthesize_fills(params.fill_cadence);
    }
    Ok(timeline)
}
