use crate::timeline::DEFAULT_FILL_CADENCE;
use clap::Args;

/// Knobs a run call accepts. Chart-mode rules (difficulty, disco flips,
/// cymbal marks) are resolved by the upstream parser before the timeline
/// reaches us; the engine itself only takes the two optimizer knobs plus
/// the fill-normalization cadence.
#[derive(Args, Debug, Clone)]
pub struct AnalysisParams {
    /// Keep reported paths within this many points of the best one.
    /// Omitted: only score-ties with the optimum are reported.
    #[arg(long)]
    pub score_depth: Option<u32>,

    /// Drop paths demanding tighter inputs than this from the report
    /// (milliseconds). Reporting-only: filtered paths still take part in
    /// dominance pruning.
    #[arg(long)]
    pub max_squeeze_ms: Option<f64>,

    /// Disable dominance pruning and keep every fork alive. Slow; intended
    /// for debugging and for cross-checking the pruned search.
    #[arg(long, default_value_t = false)]
    pub exhaustive: bool,

    /// Synthetic fill cadence, in measures, for charts with no authored
    /// fill windows. 0 disables synthesis.
    #[arg(long, default_value_t = DEFAULT_FILL_CADENCE)]
    pub fill_cadence: u32,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        AnalysisParams {
            score_depth: None,
            max_squeeze_ms: None,
            exhaustive: false,
            fill_cadence: DEFAULT_FILL_CADENCE,
        }
    }
}
