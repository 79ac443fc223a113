//! Compute module - Candidate scoring, the Pareto frontier and the concurrent search.
//!
//! # Overview
//!
//! - **Score aggregation** (`aggregate`): per-player records to a [`CandidateScore`](crate::schema::CandidateScore)
//! - **Pareto frontier** (`frontier`): shared non-dominated set with an atomic insert
//! - **Result pipeline** (`pipeline`): bounded queue plus a single results writer
//! - **Search** (`search`): worker loops and the engine coordinating them
//! - **Collaborators** (`generator`, `stats`, `storage`): draft sampling, pair
//!   statistics and durable output behind traits

mod aggregate;
mod error;
mod frontier;
mod generator;
mod pipeline;
mod search;
mod stats;
mod storage;

pub use aggregate::aggregate_score;
pub use error::SearchError;
pub use frontier::ParetoFrontier;
pub use generator::{DraftGenerator, RandomDraftGenerator};
pub use pipeline::{BoundedQueue, Pop, PushError};
pub use search::{SearchCounters, SearchEngine, WorkerExit};
pub use stats::{SeatRingStats, StatExtractor};
pub use storage::{
    DRAFT_FILE_SUFFIX, DirectorySink, DraftSink, RESULTS_FILE_NAME, ResultStore, TsvResultStore,
};
