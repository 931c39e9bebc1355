// ===== starpath/src/verifier.rs =====
use crate::error::{SpResult, StarPathError};
use crate::path::{Activation, Path, PhraseBoundary};
use crate::timeline::Timeline;
use tracing::{info, warn};

/// Re-simulates a single path from its activation log and checks the
/// claimed score. The log pins every decision the search made: activation
/// instants select the fill branches, phrase-boundary markers select the
/// squeeze-in/out branches.
pub struct Verifier<'a> {
    timeline: &'a Timeline,
}

impl<'a> Verifier<'a> {
    pub fn new(timeline: &'a Timeline) -> Self {
        Verifier { timeline }
    }

    pub fn verify(&self, path: &Path) -> SpResult<bool> {
        let log: Vec<Activation> = path.activations.iter().map(|a| (**a).clone()).collect();
        let replayed = self.replay(&log)?;
        let claimed = path.total_score();
        let computed = replayed.total_score();
        if claimed == computed {
            info!("Verification passed ({} points)", claimed);
            Ok(true)
        } else {
            warn!(
                "Score verification mismatch. Claimed: {}, Replayed: {}",
                claimed, computed
            );
            Ok(false)
        }
    }

    /// Drive one path across the timeline, resolving every fork against
    /// the log instead of keeping siblings.
    pub fn replay(&self, log: &[Activation]) -> SpResult<Path> {
        let mut current = Path::new();

        for (idx, event) in self.timeline.events().iter().enumerate() {
            let base_len = current.activations.len();
            let want_activation = log
                .get(base_len)
                .map_or(false, |a| (a.seconds - event.time.seconds).abs() < 1e-9);

            let forks = current.consume(idx, event)?;
            if forks.is_empty() {
                continue;
            }

            let mut pool = Vec::with_capacity(1 + forks.len());
            pool.push(current);
            pool.extend(forks);
            current = Self::pick(pool, base_len, want_activation, log)?;
        }
        Ok(current)
    }

    fn pick(
        pool: Vec<Path>,
        base_len: usize,
        want_activation: bool,
        log: &[Activation],
    ) -> SpResult<Path> {
        let target_len = base_len + usize::from(want_activation);
        let fill_fork = pool.iter().any(|p| p.activations.len() != base_len);

        if fill_fork {
            return pool
                .into_iter()
                .find(|p| p.activations.len() == target_len)
                .ok_or_else(|| {
                    StarPathError::Invariant(
                        "replay found no branch matching the activation log".to_string(),
                    )
                });
        }

        // Boundary fork: the log's marker on the span that just ran out
        // says whether the phrase extended it.
        let marker = log
            .get(base_len.wrapping_sub(1))
            .map(|a| a.phrase_boundary)
            .ok_or_else(|| {
                StarPathError::Invariant(
                    "boundary fork replayed with an empty activation log".to_string(),
                )
            })?;
        let want_in = marker == PhraseBoundary::ExtendedEarly;
        pool.into_iter()
            .find(|p| p.sp_active == want_in)
            .ok_or_else(|| {
                StarPathError::Invariant(
                    "replay found no branch matching the phrase-boundary marker".to_string(),
                )
            })
    }
}
