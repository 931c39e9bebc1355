use crate::reports;
use clap::Args;
use starpath::api;
use starpath::config::AnalysisParams;
use starpath::error::SpResult;
use starpath::verifier::Verifier;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Timeline JSON produced by the chart parser.
    pub timeline: String,

    #[command(flatten)]
    pub params: AnalysisParams,

    /// Print activation detail for this many top paths.
    #[arg(short = 't', long, default_value_t = 3)]
    pub top: usize,

    /// Export path summaries as CSV.
    #[arg(long)]
    pub csv: Option<String>,

    /// Export the full report as JSON.
    #[arg(long)]
    pub json: Option<String>,
}

pub fn run(args: AnalyzeArgs, debug: bool) -> SpResult<()> {
    info!("🥁 Loading timeline: {}", args.timeline);
    let timeline = api::load_timeline(&args.timeline, &args.params)?;

    let start = Instant::now();
    let report = api::analyze_timeline(&timeline, &args.params)?;
    info!(
        "🔍 Searched {} paths in {:.2?}",
        report.searched_paths,
        start.elapsed()
    );

    if debug {
        // Replay the optimum from its own activation log before trusting it.
        let verifier = Verifier::new(&timeline);
        for node_idx in report.forest.roots() {
            let record = &report.forest.nodes()[*node_idx].record;
            let replayed = verifier.replay(&record.activations)?;
            if replayed.total_score() != record.total_score {
                warn!(
                    "replay disagrees with recorded score: {} vs {}",
                    replayed.total_score(),
                    record.total_score
                );
            }
            break;
        }
    }

    reports::print_chart_stats(&report.stats);
    reports::print_ranked_paths(&report);
    reports::print_path_details(&report.forest, args.top);

    if let Some(path) = &args.csv {
        reports::export_csv(path, &report.forest)?;
        info!("📄 CSV written to {}", path);
    }
    if let Some(path) = &args.json {
        reports::export_json(path, &report)?;
        info!("📄 JSON written to {}", path);
    }
    Ok(())
}
