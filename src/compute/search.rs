//! Concurrent draft search.
//!
//! [`SearchEngine`] runs N independent workers on a dedicated thread pool.
//! Each worker draws a draft, scores it, and offers the score to the shared
//! [`ParetoFrontier`]. Accepted scores go through the bounded result queue to
//! a single consumer thread; the accepted draft table itself is written by
//! the worker through the [`DraftSink`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use rayon::ThreadPoolBuilder;

use crate::schema::{
    CandidateScore, ConfigError, SearchConfig, SearchProgress, SearchResult, SearchStats,
    StopReason,
};

use super::SearchError;
use super::aggregate::aggregate_score;
use super::frontier::ParetoFrontier;
use super::generator::DraftGenerator;
use super::pipeline::{BoundedQueue, PipelineOutcome, ResultPipeline};
use super::stats::StatExtractor;
use super::storage::{DraftSink, ResultStore};

/// Shared run counters, updated lock-free by workers and the consumer.
#[derive(Debug, Default)]
pub struct SearchCounters {
    pub evaluated: AtomicU64,
    pub empty_candidates: AtomicU64,
    pub dominated: AtomicU64,
    pub lost_races: AtomicU64,
    pub accepted: AtomicU64,
    pub persisted: AtomicU64,
    pub sink_failures: AtomicU64,
    pub worker_failures: AtomicU64,
}

impl SearchCounters {
    fn to_stats(&self, elapsed_seconds: f64, stop_reason: StopReason) -> SearchStats {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        SearchStats {
            evaluated: get(&self.evaluated),
            empty_candidates: get(&self.empty_candidates),
            dominated: get(&self.dominated),
            lost_races: get(&self.lost_races),
            accepted: get(&self.accepted),
            persisted: get(&self.persisted),
            sink_failures: get(&self.sink_failures),
            worker_failures: get(&self.worker_failures),
            elapsed_seconds,
            stop_reason,
        }
    }
}

/// How a single worker loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// The generator ran dry.
    Exhausted,
    /// The shared cancel flag was raised.
    Cancelled,
    /// An unexpected error or panic.
    Failed(String),
}

/// Search engine that owns the frontier and coordinates the workers.
pub struct SearchEngine<G, X, K> {
    config: SearchConfig,
    players: Vec<String>,
    generator: G,
    extractor: X,
    sink: K,
    frontier: ParetoFrontier,
    counters: SearchCounters,
    cancelled: Arc<AtomicBool>,
    stop_reason: Mutex<Option<StopReason>>,
}

impl<G, X, K> SearchEngine<G, X, K>
where
    G: DraftGenerator,
    X: StatExtractor,
    K: DraftSink,
{
    /// Validate `config` and create an engine with an empty frontier.
    pub fn new(
        config: SearchConfig,
        generator: G,
        extractor: X,
        sink: K,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            players: config.player_ids(),
            frontier: ParetoFrontier::new(config.quality_measures),
            config,
            generator,
            extractor,
            sink,
            counters: SearchCounters::default(),
            cancelled: Arc::new(AtomicBool::new(false)),
            stop_reason: Mutex::new(None),
        })
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn frontier(&self) -> &ParetoFrontier {
        &self.frontier
    }

    pub fn counters(&self) -> &SearchCounters {
        &self.counters
    }

    /// Run the search with progress callback.
    ///
    /// Blocks until every worker has stopped and the consumer has finished.
    pub fn run_with_callback<R, F>(&self, store: R, callback: F) -> SearchResult
    where
        R: ResultStore,
        F: Fn(&SearchProgress) + Sync,
    {
        let started = Instant::now();
        let deadline = self
            .config
            .time_budget_secs
            .map(|secs| started + Duration::from_secs(secs));

        log::info!(
            "Generating drafts started with following arguments:\n{}",
            self.config
        );

        let queue = BoundedQueue::new(self.config.queue_capacity);

        let (outcome, exits) = thread::scope(|scope| {
            let consumer = scope.spawn(|| self.run_consumer(&queue, store, started, &callback));

            let exits = self.run_workers(&queue, deadline);

            // No producer is left; let the consumer drain and stop.
            queue.close();
            let outcome = consumer.join().unwrap_or_else(|payload| {
                log::error!("Results writer crashed: {}", panic_message(payload.as_ref()));
                PipelineOutcome {
                    persisted: self.counters.persisted.load(Ordering::Relaxed),
                    failure: None,
                }
            });
            (outcome, exits)
        });

        let stop_reason = self.resolve_stop_reason(&outcome, &exits);
        let stats = self
            .counters
            .to_stats(started.elapsed().as_secs_f64(), stop_reason);

        log::info!(
            "Search finished ({:?}): {} evaluated, {} accepted, {} persisted, frontier size {}.",
            stats.stop_reason,
            stats.evaluated,
            stats.accepted,
            stats.persisted,
            self.frontier.len()
        );

        SearchResult {
            frontier: self.frontier.snapshot(),
            stats,
        }
    }

    /// Run the search (blocking).
    pub fn run<R: ResultStore>(&self, store: R) -> SearchResult {
        self.run_with_callback(store, |_| {})
    }

    fn run_consumer<R, F>(
        &self,
        queue: &BoundedQueue<CandidateScore>,
        store: R,
        started: Instant,
        callback: &F,
    ) -> PipelineOutcome
    where
        R: ResultStore,
        F: Fn(&SearchProgress),
    {
        let pipeline = ResultPipeline::new(
            queue,
            &self.frontier,
            &self.counters,
            &self.cancelled,
            store,
            started,
        );
        match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(callback))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Results writing task failed: {message}");
                self.record_stop(StopReason::PipelineFailure(message));
                self.cancelled.store(true, Ordering::Relaxed);
                PipelineOutcome {
                    persisted: self.counters.persisted.load(Ordering::Relaxed),
                    failure: None,
                }
            }
        }
    }

    /// Run every worker to completion on a pool sized to the worker count.
    fn run_workers(
        &self,
        queue: &BoundedQueue<CandidateScore>,
        deadline: Option<Instant>,
    ) -> Vec<WorkerExit> {
        let workers = self.config.workers;
        let exits = Mutex::new(Vec::with_capacity(workers));

        let run_all = || {
            rayon::scope(|s| {
                for index in 0..workers {
                    let exits = &exits;
                    s.spawn(move |_| {
                        let exit = self.run_worker_guarded(index, queue, deadline);
                        exits
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(exit);
                    });
                }
            });
        };

        match ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("draft-worker-{i}"))
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(err) => {
                log::warn!("Worker pool unavailable ({err}); using the global pool.");
                run_all();
            }
        }

        exits.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one worker, turning errors and panics into [`WorkerExit::Failed`].
    fn run_worker_guarded(
        &self,
        index: usize,
        queue: &BoundedQueue<CandidateScore>,
        deadline: Option<Instant>,
    ) -> WorkerExit {
        log::info!("Worker {index} started.");

        let exit = match panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_worker(index, queue, deadline)
        })) {
            Ok(Ok(exit)) => exit,
            Ok(Err(err)) => WorkerExit::Failed(err.to_string()),
            Err(payload) => WorkerExit::Failed(panic_message(payload.as_ref())),
        };

        match &exit {
            WorkerExit::Exhausted => log::info!("Worker {index} finished."),
            WorkerExit::Cancelled => log::warn!("Worker {index} cancelled."),
            WorkerExit::Failed(message) => {
                self.counters.worker_failures.fetch_add(1, Ordering::Relaxed);
                log::error!("Worker {index} failed: {message}");
            }
        }
        exit
    }

    /// The worker loop: draw, score, pre-filter, insert, emit, persist.
    fn run_worker(
        &self,
        index: usize,
        queue: &BoundedQueue<CandidateScore>,
        deadline: Option<Instant>,
    ) -> Result<WorkerExit, SearchError> {
        let measures = &self.config.quality_measures;
        let mut sequence = 0u64;

        loop {
            if self.should_stop(deadline) {
                return Ok(WorkerExit::Cancelled);
            }

            let Some(draft) = self
                .generator
                .next_draft(self.config.players, self.config.houses)?
            else {
                return Ok(WorkerExit::Exhausted);
            };

            let id = format!("{index}-{sequence}");
            sequence += 1;
            self.counters.evaluated.fetch_add(1, Ordering::Relaxed);

            let records = self.extractor.extract(&draft, &self.players)?;
            let score = match aggregate_score(id.as_str(), measures, &records) {
                Ok(score) => score,
                Err(SearchError::EmptyCandidate) => {
                    self.counters.empty_candidates.fetch_add(1, Ordering::Relaxed);
                    log::warn!("Candidate {id} has no player records; discarded.");
                    continue;
                }
                Err(err) => return Err(err),
            };

            if self.frontier.is_dominated(&score) {
                self.counters.dominated.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            if !self.frontier.try_add(score.clone()) {
                self.counters.lost_races.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            self.counters.accepted.fetch_add(1, Ordering::Relaxed);

            if queue.push(score, &self.cancelled).is_err() {
                // Accepted but never queued; allowed to be lost on shutdown.
                return Ok(WorkerExit::Cancelled);
            }

            match self.sink.persist(&id, &draft) {
                Ok(()) => log::trace!("Draft {id} saved."),
                Err(err) => {
                    self.counters.sink_failures.fetch_add(1, Ordering::Relaxed);
                    log::warn!("Draft {id} not saved: {err}");
                }
            }
        }
    }

    /// Check cancellation and the time budget.
    fn should_stop(&self, deadline: Option<Instant>) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            self.record_stop(StopReason::TimeBudget);
            self.cancelled.store(true, Ordering::Relaxed);
            return true;
        }
        false
    }

    /// Remember why the search stopped. The first reason wins.
    fn record_stop(&self, reason: StopReason) {
        let mut slot = self.stop_reason.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(reason);
        }
    }

    fn resolve_stop_reason(&self, outcome: &PipelineOutcome, exits: &[WorkerExit]) -> StopReason {
        if let Some(err) = &outcome.failure {
            return StopReason::PipelineFailure(err.to_string());
        }
        let recorded = self
            .stop_reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(reason) = recorded {
            return reason;
        }
        if self.cancelled.load(Ordering::Relaxed) {
            return StopReason::Cancelled;
        }
        if !exits.is_empty() && exits.iter().all(|e| matches!(e, WorkerExit::Failed(_))) {
            StopReason::WorkersFailed
        } else {
            StopReason::Exhausted
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
