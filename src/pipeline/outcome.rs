//! Pipeline outcome reporting types.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Pipeline stage a URL's run was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolving,
    Fetching,
    Assembling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolving => write!(f, "resolving"),
            Stage::Fetching => write!(f, "fetching"),
            Stage::Assembling => write!(f, "assembling"),
        }
    }
}

/// A terminal failure, tagged with the stage that raised it.
#[derive(Debug, Clone, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub cause: String,
}

/// Final result of one URL's pipeline run.
///
/// Built up while the run progresses, frozen once returned; the caller only
/// ever sees the finished value.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Source manifest URL.
    pub url: String,

    /// Caller-supplied output label, if any.
    pub label: Option<String>,

    /// Path of the merged output file; `None` when the run failed.
    pub output: Option<PathBuf>,

    /// Segments the fetch stage attempted (0 when resolution failed).
    pub segments_attempted: usize,

    /// Segments that could not be fetched.
    pub segments_failed: usize,

    /// Terminal failure, if the run did not produce output.
    pub failure: Option<StageFailure>,
}

impl PipelineOutcome {
    /// Whether the run produced an output file.
    pub fn is_done(&self) -> bool {
        self.failure.is_none()
    }

    /// Whether the run produced output but lost segments along the way.
    pub fn is_partial(&self) -> bool {
        self.is_done() && self.segments_failed > 0
    }
}

/// Aggregated statistics across one batch of URLs.
#[derive(Debug, Default)]
pub struct BatchStats {
    pub done: u64,
    pub partial: u64,
    pub failed: u64,
    pub segments_fetched: u64,
    pub segments_failed: u64,
}

impl BatchStats {
    /// Fold one outcome into the totals.
    pub fn add(&mut self, outcome: &PipelineOutcome) {
        if outcome.is_done() {
            self.done += 1;
            if outcome.is_partial() {
                self.partial += 1;
            }
        } else {
            self.failed += 1;
        }
        self.segments_fetched +=
            (outcome.segments_attempted - outcome.segments_failed) as u64;
        self.segments_failed += outcome.segments_failed as u64;
    }

    /// Aggregate a whole batch.
    pub fn from_outcomes(outcomes: &[PipelineOutcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            stats.add(outcome);
        }
        stats
    }

    /// Total URLs processed.
    pub fn total(&self) -> u64 {
        self.done + self.failed
    }
}
