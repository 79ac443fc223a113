//! Per-player statistics of a draft table.

use crate::schema::{DraftTable, House, PlayerStatRecord};

use super::SearchError;

/// Turns a draft table into one record per (player, opponent) pair.
pub trait StatExtractor: Send + Sync {
    fn extract(
        &self,
        draft: &DraftTable,
        players: &[String],
    ) -> Result<Vec<PlayerStatRecord>, SearchError>;
}

/// Pair statistics with houses seated on a ring in [`House::ALL`] order.
///
/// For every ordered pair of players:
/// - `game`: games both play,
/// - `neighbor`: shared games where their houses are adjacent on the ring,
/// - `proximity`: sum of `1 / ring distance` over shared games.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeatRingStats;

impl SeatRingStats {
    /// Seats between two houses around a ring of `ring` seats.
    fn ring_distance(a: House, b: House, ring: usize) -> usize {
        let diff = a.seat().abs_diff(b.seat());
        diff.min(ring - diff)
    }
}

impl StatExtractor for SeatRingStats {
    fn extract(
        &self,
        draft: &DraftTable,
        players: &[String],
    ) -> Result<Vec<PlayerStatRecord>, SearchError> {
        let count = draft.player_count();
        if players.len() != count {
            return Err(SearchError::Extractor(format!(
                "draft has {count} players but {} labels were given",
                players.len()
            )));
        }

        // Pairwise accumulators: [neighbor, game, proximity].
        let mut totals = vec![[0.0f64; 3]; count * count];
        for game in 0..draft.game_count() {
            let seating = draft.seating(game);
            let ring = seating
                .iter()
                .map(|(_, h)| h.seat() + 1)
                .max()
                .unwrap_or(0)
                .max(seating.len());
            for &(p, house_p) in &seating {
                for &(q, house_q) in &seating {
                    if p == q {
                        continue;
                    }
                    let distance = Self::ring_distance(house_p, house_q, ring).max(1);
                    let cell = &mut totals[p * count + q];
                    if distance == 1 {
                        cell[0] += 1.0;
                    }
                    cell[1] += 1.0;
                    cell[2] += 1.0 / distance as f64;
                }
            }
        }

        let mut records = Vec::with_capacity(count * count.saturating_sub(1));
        for p in 0..count {
            for q in (0..count).filter(|&q| q != p) {
                let [neighbor, game, proximity] = totals[p * count + q];
                records.push(PlayerStatRecord {
                    player: players[p].clone(),
                    opponent: players[q].clone(),
                    neighbor,
                    game,
                    proximity,
                });
            }
        }
        Ok(records)
    }
}
