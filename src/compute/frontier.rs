//! Pareto frontier of best-known candidate scores.
//!
//! The frontier is shared by every search worker. Reads take the read lock
//! and see a consistent state; [`ParetoFrontier::try_add`] is the only
//! mutation and runs entirely under the write lock, so the dominance
//! re-check, the eviction and the insert happen as one step.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::schema::{CandidateScore, Measure, QualityMeasures};

/// Set of mutually non-dominated candidate scores, keyed by id.
#[derive(Debug)]
pub struct ParetoFrontier {
    measures: QualityMeasures,
    entries: RwLock<HashMap<String, CandidateScore>>,
}

impl ParetoFrontier {
    /// Create an empty frontier comparing on `measures`.
    pub fn new(measures: QualityMeasures) -> Self {
        Self {
            measures,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn measures(&self) -> &QualityMeasures {
        &self.measures
    }

    /// Whether some current entry dominates `candidate`.
    ///
    /// Only a pre-filter: the answer may be stale by the time the caller
    /// acts on it. [`try_add`](Self::try_add) re-checks under the lock.
    pub fn is_dominated(&self, candidate: &CandidateScore) -> bool {
        dominated_by_any(&self.read(), candidate, &self.measures)
    }

    /// Atomically insert `candidate` unless it is dominated.
    ///
    /// Returns `false` without touching the frontier when an entry dominates
    /// the candidate or its id is already present. Otherwise every entry the
    /// candidate dominates is evicted and the candidate is inserted.
    pub fn try_add(&self, candidate: CandidateScore) -> bool {
        let mut entries = self.write();

        if entries.contains_key(&candidate.id)
            || dominated_by_any(&entries, &candidate, &self.measures)
        {
            return false;
        }

        entries.retain(|_, existing| !candidate.dominates(existing, &self.measures));
        entries.insert(candidate.id.clone(), candidate);
        true
    }

    /// Get an entry by id.
    pub fn get(&self, id: &str) -> Option<CandidateScore> {
        self.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Consistent copy of the frontier, ordered by the first enabled
    /// measure's std and then by id.
    pub fn snapshot(&self) -> Vec<CandidateScore> {
        let mut scores: Vec<CandidateScore> = self.read().values().cloned().collect();
        let primary = self.measures.enabled().next();
        scores.sort_by(|a, b| {
            let key = |s: &CandidateScore| primary.and_then(|m| s.get(m)).map_or(0.0, |x| x.std);
            key(a).total_cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
        });
        scores
    }

    /// Lowest std on the frontier for `measure`.
    pub fn best_std(&self, measure: Measure) -> Option<f64> {
        best_std_of(self.read().values(), measure)
    }

    /// Lowest std per enabled measure, taken from a single consistent view.
    pub fn best_stds(&self) -> Vec<(Measure, f64)> {
        let entries = self.read();
        self.measures
            .enabled()
            .filter_map(|m| best_std_of(entries.values(), m).map(|std| (m, std)))
            .collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CandidateScore>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CandidateScore>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn dominated_by_any(
    entries: &HashMap<String, CandidateScore>,
    candidate: &CandidateScore,
    measures: &QualityMeasures,
) -> bool {
    entries
        .values()
        .any(|existing| existing.dominates(candidate, measures))
}

fn best_std_of<'a>(
    scores: impl Iterator<Item = &'a CandidateScore>,
    measure: Measure,
) -> Option<f64> {
    scores
        .filter_map(|s| s.get(measure).map(|x| x.std))
        .min_by(f64::total_cmp)
}
