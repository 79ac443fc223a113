//! Progress and result types reported by the search engine.

use serde::{Deserialize, Serialize};

use super::{CandidateScore, Measure};

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Progress update emitted after every persisted record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Current frontier size.
    pub frontier_size: usize,
    /// Lowest std currently on the frontier, per enabled measure.
    pub best_std: Vec<(Measure, f64)>,
    /// Candidates scored so far.
    pub evaluated: u64,
    /// Candidates accepted into the frontier so far.
    pub accepted: u64,
    /// Records written to the result store so far.
    pub persisted: u64,
    /// Seconds since the search started.
    pub elapsed_seconds: f64,
}

/// Final result of a search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Frontier contents at shutdown.
    pub frontier: Vec<CandidateScore>,
    /// Statistics from the run.
    pub stats: SearchStats,
}

/// Statistics from a search run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchStats {
    /// Candidates drawn and scored.
    pub evaluated: u64,
    /// Candidates discarded for having no player records.
    pub empty_candidates: u64,
    /// Candidates discarded by the dominance pre-filter.
    pub dominated: u64,
    /// Candidates that passed the pre-filter but lost the insert race.
    pub lost_races: u64,
    /// Candidates accepted into the frontier.
    pub accepted: u64,
    /// Accepted scores written to the result store.
    pub persisted: u64,
    /// Draft tables the sink failed to write.
    pub sink_failures: u64,
    /// Workers that terminated with an error.
    pub worker_failures: u64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason the search stopped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Every worker ran its generator dry.
    #[default]
    Exhausted,
    /// Cancelled through the cancel handle.
    Cancelled,
    /// The overall time budget ran out.
    TimeBudget,
    /// The result store could not be written.
    PipelineFailure(String),
    /// Every worker terminated with an error.
    WorkersFailed,
}
