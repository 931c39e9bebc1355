// ===== starpath/src/optimizer/mod.rs =====
use crate::config::AnalysisParams;
use crate::error::SpResult;
use crate::path::Path;
use crate::timeline::Timeline;
use rayon::prelude::*;
use tracing::{debug, info};

/// Drives the live Path set across a Timeline: every live path consumes the
/// current event (in parallel — paths share no mutable state), forks are
/// merged in path order, dominated paths are discarded, and the terminal
/// prune leaves only the competitive set.
pub struct Optimizer {
    params: AnalysisParams,
}

impl Optimizer {
    pub fn new(params: AnalysisParams) -> Self {
        Optimizer { params }
    }

    /// Run the full search. Returns the terminal live set, descending by
    /// best-case score; deterministic for a fixed timeline.
    pub fn run(&self, timeline: &Timeline) -> SpResult<Vec<Path>> {
        let mut live = vec![Path::new()];
        let mut peak = 1usize;

        for (idx, event) in timeline.events().iter().enumerate() {
            // Barrier semantics: every path finishes this event before any
            // path sees the next; forks land after the parallel section, in
            // parent order, already stamped with this event.
            let forks: Vec<Vec<Path>> = live
                .par_iter_mut()
                .map(|p| p.consume(idx, event))
                .collect::<SpResult<_>>()?;
            for siblings in forks {
                live.extend(siblings);
            }
            peak = peak.max(live.len());

            if !self.params.exhaustive {
                prune_dominated(&mut live, false);
            }
        }

        if !self.params.exhaustive {
            prune_dominated(&mut live, true);
        } else {
            // Exhaustive runs still want the ranked order.
            sort_by_best_case(&mut live);
        }

        info!(
            "Optimizer: {} events, {} terminal paths (peak live set {})",
            timeline.len(),
            live.len(),
            peak
        );
        Ok(live)
    }
}

fn sort_by_best_case(live: &mut [Path]) {
    // Stable: ties keep their fork order, which keeps reruns bit-identical.
    live.sort_by(|a, b| b.best_case_score().cmp(&a.best_case_score()));
}

/// Discard every path provably no better than another. Two paths at the
/// same event with the same resource-active state are future-equivalent
/// except for score and remaining meter; strictly worse on both loses.
/// Terminal mode ignores the meter (there is no future left to fuel).
pub fn prune_dominated(live: &mut Vec<Path>, terminal: bool) {
    if live.len() < 2 {
        return;
    }
    sort_by_best_case(live);

    let before = live.len();
    let mut kept: Vec<Path> = Vec::with_capacity(live.len());
    for p in live.drain(..) {
        let dominated = kept.iter().any(|q| {
            q.sp_active == p.sp_active
                && q.last_event == p.last_event
                && q.best_case_score() > p.best_case_score()
                && (terminal || q.meter >= p.meter)
        });
        if !dominated {
            kept.push(p);
        }
    }
    if kept.len() != before {
        debug!(
            "prune: {} -> {} paths{}",
            before,
            kept.len(),
            if terminal { " (terminal)" } else { "" }
        );
    }
    *live = kept;
}
