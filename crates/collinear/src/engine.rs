//! Two-phase collinearity grouping over a borrowed point set.
//!
//! Phase 1 (discovery): build a candidate line for every pair `i < j`; if the
//! table already knows its key, feed both points to the known line, otherwise
//! insert the candidate. Phase 2 (sweep): offer every point to every line.
//! Phase 2 must see the complete table, so it always runs after Phase 1.
//!
//! Cost is O(N³) in the worst case (N² lines, N points each). No spatial
//! index is used.

use std::collections::HashMap;

use tracing::debug;

use crate::cfg::{CollinearCfg, KeyPolicy};
use crate::line::{AddOutcome, Line, LineIds, LineKey, LineRecord};
use crate::point::Point;

/// Counters collected during a run (for logs and provenance).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub points: usize,
    /// Pairs examined in Phase 1.
    pub pairs: usize,
    /// Pairs skipped because both points are equal.
    pub degenerate_pairs: usize,
    /// Distinct lines in the table after Phase 1.
    pub lines_discovered: usize,
    /// Members appended to existing lines across both phases.
    pub points_added: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Loaded,
    Discovered,
    Swept,
}

/// Line table plus the input it was built from.
///
/// Lines are stored in creation order, which is also ascending id order and
/// the order results are reported in.
#[derive(Debug)]
pub struct CollinearityEngine<'a> {
    points: &'a [Point],
    cfg: CollinearCfg,
    lines: Vec<Line<'a>>,
    index: HashMap<LineKey, usize>,
    ids: LineIds,
    phase: Phase,
    stats: RunStats,
}

impl<'a> CollinearityEngine<'a> {
    pub fn new(points: &'a [Point]) -> Self {
        Self::with_cfg(points, CollinearCfg::default())
    }

    pub fn with_cfg(points: &'a [Point], cfg: CollinearCfg) -> Self {
        Self {
            points,
            cfg,
            lines: Vec::new(),
            index: HashMap::new(),
            ids: LineIds::new(),
            phase: Phase::Loaded,
            stats: RunStats {
                points: points.len(),
                ..RunStats::default()
            },
        }
    }

    #[inline]
    pub fn cfg(&self) -> &CollinearCfg {
        &self.cfg
    }

    #[inline]
    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Every line in the table, including those with only two members.
    #[inline]
    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    /// Phase 1. Idempotent: a second call does nothing.
    pub fn discover_lines(&mut self) {
        if self.phase != Phase::Loaded {
            return;
        }
        let points = self.points;
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                self.stats.pairs += 1;
                let candidate = match Line::new(&points[i], &points[j], &mut self.ids) {
                    Ok(line) => line,
                    Err(err) => {
                        self.stats.degenerate_pairs += 1;
                        debug!(i, j, %err, "skipping degenerate pair");
                        continue;
                    }
                };
                match self.find(&candidate) {
                    Some(k) => {
                        let line = &mut self.lines[k];
                        for p in [&points[i], &points[j]] {
                            if line.try_add(p, &self.cfg) == AddOutcome::Added {
                                self.stats.points_added += 1;
                            }
                        }
                    }
                    None => self.insert(candidate),
                }
            }
        }
        self.stats.lines_discovered = self.lines.len();
        self.phase = Phase::Discovered;
        debug!(
            pairs = self.stats.pairs,
            degenerate = self.stats.degenerate_pairs,
            lines = self.lines.len(),
            ids_issued = self.ids.issued(),
            "discovery done"
        );
    }

    /// Phase 2. Runs Phase 1 first when needed; idempotent afterwards.
    pub fn sweep_points(&mut self) {
        self.discover_lines();
        if self.phase != Phase::Discovered {
            return;
        }
        let mut added = 0usize;
        for p in self.points {
            for line in &mut self.lines {
                if line.try_add(p, &self.cfg) == AddOutcome::Added {
                    added += 1;
                }
            }
        }
        self.stats.points_added += added;
        self.phase = Phase::Swept;
        debug!(added, "sweep done");
    }

    /// Lines with at least `min_points` members, in id order.
    ///
    /// Reflects whatever phases have run so far; call `sweep_points` first
    /// for complete groups.
    pub fn collinear_lines(&self) -> impl Iterator<Item = &Line<'a>> + '_ {
        let min = self.cfg.min_points.max(2);
        self.lines.iter().filter(move |l| l.size() >= min)
    }

    /// Both phases, then the size filter.
    pub fn run(mut self) -> Vec<LineRecord> {
        self.sweep_points();
        self.collinear_lines().map(Line::to_record).collect()
    }

    fn find(&self, candidate: &Line<'_>) -> Option<usize> {
        if let Some(&k) = self.index.get(&candidate.key()) {
            return Some(k);
        }
        match self.cfg.keys {
            KeyPolicy::Exact => None,
            KeyPolicy::Tolerant => self
                .lines
                .iter()
                .position(|l| l.is_same_as(candidate, &self.cfg)),
        }
    }

    fn insert(&mut self, line: Line<'a>) {
        self.index.insert(line.key(), self.lines.len());
        self.lines.push(line);
    }
}

/// Group `points` and return every line with at least `cfg.min_points` members.
pub fn find_collinear(points: &[Point], cfg: CollinearCfg) -> Vec<LineRecord> {
    CollinearityEngine::with_cfg(points, cfg).run()
}
