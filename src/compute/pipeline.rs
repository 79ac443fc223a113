//! Bounded result queue and its single consumer.
//!
//! Workers push accepted scores into a [`BoundedQueue`]; when it is full they
//! block, which throttles generation to the rate the result store can keep up
//! with. One [`ResultPipeline`] drains the queue in FIFO order, appends each
//! score to the [`ResultStore`] and reports progress.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::schema::{CandidateScore, SearchProgress};

use super::frontier::ParetoFrontier;
use super::search::SearchCounters;
use super::storage::ResultStore;
use super::SearchError;

/// How long a blocked push or pop waits before re-checking cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Why a push did not enqueue. The item is handed back.
#[derive(Debug)]
pub enum PushError<T> {
    Cancelled(T),
    Closed(T),
}

/// Outcome of a blocking pop.
#[derive(Debug, PartialEq)]
pub enum Pop<T> {
    Item(T),
    /// Closed and fully drained.
    Closed,
    Cancelled,
}

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Fixed-capacity FIFO shared by many producers and one consumer.
pub struct BoundedQueue<T> {
    state: Mutex<QueueState<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Enqueue `item`, blocking while the queue is full.
    pub fn push(&self, item: T, cancel: &AtomicBool) -> Result<(), PushError<T>> {
        let mut state = self.lock();
        loop {
            if state.closed {
                return Err(PushError::Closed(item));
            }
            if cancel.load(Ordering::Relaxed) {
                return Err(PushError::Cancelled(item));
            }
            if state.items.len() < self.capacity {
                state.items.push_back(item);
                drop(state);
                self.not_empty.notify_one();
                return Ok(());
            }
            state = self
                .not_full
                .wait_timeout(state, CANCEL_POLL_INTERVAL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Dequeue the oldest item, blocking while the queue is empty.
    ///
    /// Buffered items are still handed out after [`close`](Self::close);
    /// cancellation wins over buffered items.
    pub fn pop(&self, cancel: &AtomicBool) -> Pop<T> {
        let mut state = self.lock();
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Pop::Cancelled;
            }
            if let Some(item) = state.items.pop_front() {
                drop(state);
                self.not_full.notify_one();
                return Pop::Item(item);
            }
            if state.closed {
                return Pop::Closed;
            }
            state = self
                .not_empty
                .wait_timeout(state, CANCEL_POLL_INTERVAL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    /// Dequeue without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let item = self.lock().items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Refuse further pushes and wake every waiter.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// How the consumer finished.
#[derive(Debug)]
pub struct PipelineOutcome {
    /// Records written to the store.
    pub persisted: u64,
    /// Store failure that stopped the consumer, if any.
    pub failure: Option<SearchError>,
}

/// Single consumer draining accepted scores into a [`ResultStore`].
pub struct ResultPipeline<'a, R> {
    queue: &'a BoundedQueue<CandidateScore>,
    frontier: &'a ParetoFrontier,
    counters: &'a SearchCounters,
    cancel: &'a AtomicBool,
    store: R,
    started: Instant,
}

impl<'a, R: ResultStore> ResultPipeline<'a, R> {
    pub fn new(
        queue: &'a BoundedQueue<CandidateScore>,
        frontier: &'a ParetoFrontier,
        counters: &'a SearchCounters,
        cancel: &'a AtomicBool,
        store: R,
        started: Instant,
    ) -> Self {
        Self {
            queue,
            frontier,
            counters,
            cancel,
            store,
            started,
        }
    }

    /// Drain until the queue is closed or the search is cancelled.
    ///
    /// A store failure cancels the whole search. On cancellation items
    /// already buffered are written best-effort without blocking.
    pub fn run<F>(mut self, callback: &F) -> PipelineOutcome
    where
        F: Fn(&SearchProgress),
    {
        let mut persisted = 0u64;
        loop {
            let score = match self.queue.pop(self.cancel) {
                Pop::Item(score) => score,
                Pop::Closed => {
                    log::info!("Results writing finished.");
                    break;
                }
                Pop::Cancelled => {
                    let drained = self.drain_buffered(callback, &mut persisted);
                    log::warn!("Results writing cancelled ({drained} buffered records written).");
                    break;
                }
            };

            if let Err(err) = self.write(&score, callback, &mut persisted) {
                log::error!("Results writing failed: {err}");
                self.cancel.store(true, Ordering::Relaxed);
                return PipelineOutcome {
                    persisted,
                    failure: Some(err),
                };
            }
        }

        PipelineOutcome {
            persisted,
            failure: None,
        }
    }

    fn drain_buffered<F>(&mut self, callback: &F, persisted: &mut u64) -> usize
    where
        F: Fn(&SearchProgress),
    {
        let mut drained = 0;
        while let Some(score) = self.queue.try_pop() {
            if let Err(err) = self.write(&score, callback, persisted) {
                log::error!("Dropping buffered results after write failure: {err}");
                break;
            }
            drained += 1;
        }
        drained
    }

    fn write<F>(
        &mut self,
        score: &CandidateScore,
        callback: &F,
        persisted: &mut u64,
    ) -> Result<(), SearchError>
    where
        F: Fn(&SearchProgress),
    {
        self.store.append(score)?;
        *persisted += 1;
        self.counters.persisted.fetch_add(1, Ordering::Relaxed);
        self.report(callback);
        Ok(())
    }

    fn report<F>(&self, callback: &F)
    where
        F: Fn(&SearchProgress),
    {
        let measures = self.frontier.measures();
        let best = self.frontier.snapshot();
        let listing = best
            .iter()
            .map(|s| format!("{} ({})", s.id, s.std_summary(measures)))
            .collect::<Vec<_>>()
            .join(", ");
        log::info!("Best scores ({}): {listing}", best.len());

        let progress = SearchProgress {
            frontier_size: best.len(),
            best_std: measures
                .enabled()
                .filter_map(|m| {
                    best.iter()
                        .filter_map(|s| s.get(m).map(|x| x.std))
                        .min_by(f64::total_cmp)
                        .map(|std| (m, std))
                })
                .collect(),
            evaluated: self.counters.evaluated.load(Ordering::Relaxed),
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            persisted: self.counters.persisted.load(Ordering::Relaxed),
            elapsed_seconds: self.started.elapsed().as_secs_f64(),
        };
        callback(&progress);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use super::*;
    use crate::schema::{Measure, QualityMeasures, ScoreSummary};

    fn score(id: &str, std: f64) -> CandidateScore {
        CandidateScore::new(id).with(
            Measure::Neighbor,
            ScoreSummary {
                min: 0.0,
                max: 1.0,
                std,
            },
        )
    }

    /// In-memory store; optionally fails from the `fail_at`th append on.
    struct VecStore {
        rows: Arc<Mutex<Vec<String>>>,
        fail_at: Option<usize>,
    }

    impl ResultStore for VecStore {
        fn append(&mut self, score: &CandidateScore) -> Result<(), SearchError> {
            let mut rows = self.rows.lock().unwrap();
            if self.fail_at.is_some_and(|n| rows.len() >= n) {
                return Err(SearchError::io(
                    "memory",
                    std::io::Error::other("disk full"),
                ));
            }
            rows.push(score.id.clone());
            Ok(())
        }
    }

    #[test]
    fn test_fifo_and_close() {
        let queue = BoundedQueue::new(4);
        let cancel = AtomicBool::new(false);
        queue.push(1, &cancel).unwrap();
        queue.push(2, &cancel).unwrap();
        queue.close();

        assert!(matches!(queue.push(3, &cancel), Err(PushError::Closed(3))));
        assert_eq!(queue.pop(&cancel), Pop::Item(1));
        assert_eq!(queue.pop(&cancel), Pop::Item(2));
        assert_eq!(queue.pop(&cancel), Pop::Closed);
    }

    #[test]
    fn test_producers_block_at_capacity() {
        const CAPACITY: usize = 3;
        const ITEMS: usize = 50;
        let queue = BoundedQueue::new(CAPACITY);
        let cancel = AtomicBool::new(false);
        let max_seen = AtomicUsize::new(0);

        thread::scope(|s| {
            for p in 0..4 {
                let queue = &queue;
                let cancel = &cancel;
                s.spawn(move || {
                    for i in 0..ITEMS {
                        queue.push(p * ITEMS + i, cancel).unwrap();
                    }
                });
            }

            let mut received = Vec::new();
            while received.len() < 4 * ITEMS {
                max_seen.fetch_max(queue.len(), Ordering::Relaxed);
                thread::sleep(Duration::from_micros(200));
                if let Pop::Item(item) = queue.pop(&cancel) {
                    received.push(item);
                }
            }
            received.sort_unstable();
            assert_eq!(received, (0..4 * ITEMS).collect::<Vec<_>>());
        });

        assert!(max_seen.load(Ordering::Relaxed) <= CAPACITY);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_unblocks_full_push() {
        let queue = BoundedQueue::new(1);
        let cancel = AtomicBool::new(false);
        queue.push("a", &cancel).unwrap();

        thread::scope(|s| {
            let blocked = s.spawn(|| queue.push("b", &cancel));
            thread::sleep(Duration::from_millis(20));
            cancel.store(true, Ordering::Relaxed);
            assert!(matches!(
                blocked.join().unwrap(),
                Err(PushError::Cancelled("b"))
            ));
        });
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_pipeline_persists_in_order_until_closed() {
        let queue = BoundedQueue::new(8);
        let frontier = ParetoFrontier::new(QualityMeasures::default());
        let counters = SearchCounters::default();
        let cancel = AtomicBool::new(false);
        let rows = Arc::new(Mutex::new(Vec::new()));
        let store = VecStore {
            rows: Arc::clone(&rows),
            fail_at: None,
        };

        for (i, std) in [3.0, 1.0, 2.0].into_iter().enumerate() {
            queue.push(score(&format!("0-{i}"), std), &cancel).unwrap();
        }
        queue.close();

        let reports = AtomicUsize::new(0);
        let outcome = ResultPipeline::new(&queue, &frontier, &counters, &cancel, store, Instant::now())
            .run(&|_: &SearchProgress| {
                reports.fetch_add(1, Ordering::Relaxed);
            });

        assert_eq!(outcome.persisted, 3);
        assert!(outcome.failure.is_none());
        assert_eq!(*rows.lock().unwrap(), vec!["0-0", "0-1", "0-2"]);
        assert_eq!(reports.load(Ordering::Relaxed), 3);
        assert_eq!(counters.persisted.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_store_failure_cancels_search() {
        let queue = BoundedQueue::new(8);
        let frontier = ParetoFrontier::new(QualityMeasures::default());
        let counters = SearchCounters::default();
        let cancel = AtomicBool::new(false);
        let rows = Arc::new(Mutex::new(Vec::new()));
        let store = VecStore {
            rows: Arc::clone(&rows),
            fail_at: Some(1),
        };

        queue.push(score("0-0", 1.0), &cancel).unwrap();
        queue.push(score("0-1", 0.5), &cancel).unwrap();

        let outcome = ResultPipeline::new(&queue, &frontier, &counters, &cancel, store, Instant::now())
            .run(&|_: &SearchProgress| {});

        assert_eq!(outcome.persisted, 1);
        assert!(matches!(outcome.failure, Some(SearchError::Io { .. })));
        assert!(cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn test_cancelled_pipeline_drains_buffer() {
        let queue = BoundedQueue::new(8);
        let frontier = ParetoFrontier::new(QualityMeasures::default());
        let counters = SearchCounters::default();
        let cancel = AtomicBool::new(false);
        let rows = Arc::new(Mutex::new(Vec::new()));
        let store = VecStore {
            rows: Arc::clone(&rows),
            fail_at: None,
        };

        queue.push(score("0-0", 1.0), &cancel).unwrap();
        queue.push(score("1-0", 2.0), &cancel).unwrap();
        cancel.store(true, Ordering::Relaxed);

        let outcome = ResultPipeline::new(&queue, &frontier, &counters, &cancel, store, Instant::now())
            .run(&|_: &SearchProgress| {});

        assert_eq!(outcome.persisted, 2);
        assert!(queue.is_empty());
    }
}
