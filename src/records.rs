// ===== starpath/src/records.rs =====
use crate::error::{SpResult, StarPathError};
use crate::path::{Activation, Path, ScoreBreakdown};
use crate::squeeze::MultiplierSqueeze;
use serde::Serialize;

/// One surviving path, stripped of simulation-only state (meter, active
/// flag, cursors). Write-once output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathRecord {
    pub total_score: u32,
    pub best_case_score: u32,
    pub breakdown: ScoreBreakdown,
    pub activations: Vec<Activation>,
    pub squeezes: Vec<MultiplierSqueeze>,
    /// Fills still pending after the final activation.
    pub trailing_skips: u32,
    pub max_difficulty_ms: f64,
}

impl PathRecord {
    /// Conventional skip notation, one figure per activation: "2-0-1",
    /// a trailing "*" marking a timing-sensitive count.
    pub fn skip_notation(&self) -> String {
        if self.activations.is_empty() {
            return "-".to_string();
        }
        self.activations
            .iter()
            .map(|a| {
                if a.skips_timing_sensitive {
                    format!("{}*", a.skips)
                } else {
                    a.skips.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordNode {
    pub record: PathRecord,
    pub parent: Option<usize>,
    /// Index into the parent's activation list where this variant diverges.
    /// Always present on non-roots.
    pub divergence: Option<usize>,
    pub children: Vec<usize>,
}

/// Terminal forest: score-tied paths sharing an activation-history prefix
/// hang as variants under the shorter form instead of being duplicated.
/// Arena storage; traversal is iterative.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordForest {
    nodes: Vec<RecordNode>,
    roots: Vec<usize>,
}

impl RecordForest {
    /// Fold the terminal live set into the forest. Paths must already be
    /// admission-filtered; assembly only groups and links.
    pub fn assemble(mut paths: Vec<Path>) -> SpResult<RecordForest> {
        // Score-descending; within a score group shorter histories first so
        // parents exist before their variants.
        paths.sort_by(|a, b| {
            b.total_score()
                .cmp(&a.total_score())
                .then(a.activations.len().cmp(&b.activations.len()))
                .then_with(|| cmp_activation_times(a, b))
        });

        let mut forest = RecordForest::default();
        let mut group_start = 0usize;
        let mut group_score = None;

        for path in paths {
            let score = path.total_score();
            if group_score != Some(score) {
                group_score = Some(score);
                group_start = forest.nodes.len();
            }

            // Longest shared activation prefix wins; zero shared history
            // means an independent root even inside the group.
            let mut best: Option<(usize, usize)> = None;
            for idx in group_start..forest.nodes.len() {
                let shared = shared_prefix_with_record(&path, &forest.nodes[idx].record);
                if shared > 0 && best.map_or(true, |(_, s)| shared > s) {
                    best = Some((idx, shared));
                }
            }

            let node_idx = forest.nodes.len();
            match best {
                Some((parent, shared)) => {
                    if shared > forest.nodes[parent].record.activations.len() {
                        return Err(StarPathError::Invariant(
                            "variant divergence index past its parent's history".to_string(),
                        ));
                    }
                    forest.nodes[parent].children.push(node_idx);
                    forest.nodes.push(RecordNode {
                        record: strip(path),
                        parent: Some(parent),
                        divergence: Some(shared),
                        children: Vec::new(),
                    });
                }
                None => {
                    forest.roots.push(node_idx);
                    forest.nodes.push(RecordNode {
                        record: strip(path),
                        parent: None,
                        divergence: None,
                        children: Vec::new(),
                    });
                }
            }
        }
        Ok(forest)
    }

    pub fn nodes(&self) -> &[RecordNode] {
        &self.nodes
    }

    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn best_score(&self) -> u32 {
        self.roots
            .first()
            .map(|&i| self.nodes[i].record.total_score)
            .unwrap_or(0)
    }

    /// Iterative depth-first order over every node: (index, depth).
    pub fn depth_first(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&i| (i, 0)).collect();
        while let Some((idx, depth)) = stack.pop() {
            out.push((idx, depth));
            for &child in self.nodes[idx].children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Every record in depth-first order.
    pub fn records(&self) -> Vec<&PathRecord> {
        self.depth_first()
            .into_iter()
            .map(|(i, _)| &self.nodes[i].record)
            .collect()
    }
}

fn strip(path: Path) -> PathRecord {
    PathRecord {
        total_score: path.total_score(),
        best_case_score: path.best_case_score(),
        breakdown: path.scores,
        max_difficulty_ms: path.max_difficulty_ms(),
        trailing_skips: path.skips,
        activations: path.activations.iter().map(|a| (**a).clone()).collect(),
        squeezes: path.squeezes.iter().map(|s| (**s).clone()).collect(),
    }
}

fn shared_prefix_with_record(path: &Path, record: &PathRecord) -> usize {
    let mut n = 0;
    for (a, b) in path.activations.iter().zip(record.activations.iter()) {
        if **a == *b {
            n += 1;
        } else {
            break;
        }
    }
    n
}

fn cmp_activation_times(a: &Path, b: &Path) -> std::cmp::Ordering {
    for (x, y) in a.activations.iter().zip(b.activations.iter()) {
        let ord = x.seconds.total_cmp(&y.seconds).then(x.skips.cmp(&y.skips));
        if ord != std::cmp::Ordering::Equal {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}
