//! Draft generation.
//!
//! Provides the [`DraftGenerator`] seam and a random table generator.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::prelude::*;

use crate::schema::{DraftTable, House};

use super::SearchError;

/// Produces candidate draft tables on demand.
///
/// Shared by every worker, so implementations must be reentrant.
/// `Ok(None)` signals exhaustion and ends the calling worker cleanly.
pub trait DraftGenerator: Send + Sync {
    fn next_draft(
        &self,
        players: usize,
        houses: usize,
    ) -> Result<Option<DraftTable>, SearchError>;
}

/// Random draft tables with one game per player.
///
/// Every player takes part in exactly `houses` games; the seats of each game
/// are shuffled across the houses in play.
#[derive(Debug, Default)]
pub struct RandomDraftGenerator {
    seed: Option<u64>,
    max_drafts: Option<u64>,
    drawn: AtomicU64,
}

impl RandomDraftGenerator {
    pub fn new(seed: Option<u64>, max_drafts: Option<u64>) -> Self {
        Self {
            seed,
            max_drafts,
            drawn: AtomicU64::new(0),
        }
    }

    /// Drafts handed out so far.
    pub fn drawn(&self) -> u64 {
        self.drawn.load(Ordering::Relaxed).min(self.max_drafts.unwrap_or(u64::MAX))
    }

    /// Rng for the `index`th draw. Seeded runs are reproducible per draw.
    fn rng_for(&self, index: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15)),
            None => StdRng::from_entropy(),
        }
    }
}

impl DraftGenerator for RandomDraftGenerator {
    fn next_draft(
        &self,
        players: usize,
        houses: usize,
    ) -> Result<Option<DraftTable>, SearchError> {
        if houses > House::ALL.len() || houses > players || houses == 0 {
            return Err(SearchError::Generator(format!(
                "cannot seat {houses} houses with {players} players"
            )));
        }

        let index = self.drawn.fetch_add(1, Ordering::Relaxed);
        if self.max_drafts.is_some_and(|max| index >= max) {
            return Ok(None);
        }

        let mut rng = self.rng_for(index);
        Ok(Some(random_table(&mut rng, players, houses)))
    }
}

/// Build a table of `players` games, each seating `houses` players.
fn random_table<R: Rng>(rng: &mut R, players: usize, houses: usize) -> DraftTable {
    let in_play = House::in_play(houses);
    let games = players;
    let mut rows = vec![vec![None; games]; players];
    let mut remaining = vec![houses; players];
    let mut order: Vec<usize> = (0..players).collect();

    for game in 0..games {
        // Players with the most games left go first; shuffling breaks ties.
        // Keeping quotas within one of each other guarantees every game fills.
        order.shuffle(rng);
        order.sort_by(|a, b| remaining[*b].cmp(&remaining[*a]));

        let mut seats = in_play.to_vec();
        seats.shuffle(rng);
        for (&player, house) in order.iter().take(houses).zip(seats) {
            rows[player][game] = Some(house);
            remaining[player] -= 1;
        }
    }

    DraftTable::new(rows)
}
