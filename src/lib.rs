//! Draft search - Concurrent Pareto search for balanced league house drafts.
//!
//! A league draft assigns players to houses across a set of games. Several
//! independent fairness measures (neighbor, shared games, board proximity)
//! judge a draft, and they conflict, so the search keeps the whole Pareto
//! frontier of drafts rather than a single best one.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, draft and score types
//! - `compute`: Scoring, the Pareto frontier, the result pipeline and the workers
//!
//! # Example
//!
//! ```rust,no_run
//! use draft_search::{
//!     compute::{DirectorySink, RandomDraftGenerator, SearchEngine, SeatRingStats, TsvResultStore},
//!     schema::SearchConfig,
//! };
//!
//! let config = SearchConfig::default();
//! let sink = DirectorySink::new(&config.results_path, config.player_ids()).unwrap();
//! let store = TsvResultStore::create(&config.results_path, config.quality_measures).unwrap();
//! let generator = RandomDraftGenerator::new(config.random_seed, config.max_drafts);
//!
//! let engine = SearchEngine::new(config, generator, SeatRingStats, sink).unwrap();
//! let result = engine.run(store);
//!
//! println!("Frontier size: {}", result.frontier.len());
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{ParetoFrontier, SearchEngine, SearchError};
pub use schema::{CandidateScore, QualityMeasures, ScoreSummary, SearchConfig};
