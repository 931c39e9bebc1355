use crate::reports;
use clap::Args;
use starpath::error::SpResult;
use starpath::timeline::Timeline;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Timeline JSON produced by the chart parser.
    pub timeline: String,

    /// Also check what synthetic fills would be added at this cadence.
    #[arg(long, default_value_t = 0)]
    pub fill_cadence: u32,
}

pub fn run(args: ValidateArgs) -> SpResult<()> {
    let mut timeline = Timeline::load_from_file(&args.timeline)?;
    info!("✅ Timeline OK: {} events", timeline.len());

    if args.fill_cadence > 0 && !timeline.has_fills() {
        let added = timeline.synthesize_fills(args.fill_cadence);
        info!(
            "Synthesis preview: {} fills at a {}-measure cadence",
            added, args.fill_cadence
        );
    }

    reports::print_chart_stats(&timeline.stats());
    Ok(())
}
