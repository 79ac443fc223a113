//! Score types produced for each candidate draft.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::QualityMeasures;

/// One independent fairness dimension of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    /// How often two players sit next to each other.
    Neighbor,
    /// How many games two players share.
    Game,
    /// How close two players' houses are on the board.
    Proximity,
}

impl Measure {
    /// All measures in column order.
    pub const ALL: [Measure; 3] = [Measure::Neighbor, Measure::Game, Measure::Proximity];

    /// Column name used in the results file.
    pub fn column_name(self) -> &'static str {
        match self {
            Measure::Neighbor => "Neighbor",
            Measure::Game => "Games",
            Measure::Proximity => "Proximity",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Measure::Neighbor => "Neighbor",
            Measure::Game => "Game",
            Measure::Proximity => "Proximity",
        };
        f.write_str(name)
    }
}

/// Spread of one measure over every player record of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub min: f64,
    pub max: f64,
    /// Population standard deviation. Lower is better balanced.
    pub std: f64,
}

impl ScoreSummary {
    /// Summarize a set of values. Returns `None` for an empty set.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Some(Self {
            min,
            max,
            std: variance.sqrt(),
        })
    }
}

/// Scored candidate draft. Only enabled measures are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Unique label, `<worker>-<sequence>`.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbor: Option<ScoreSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<ScoreSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity: Option<ScoreSummary>,
}

impl CandidateScore {
    /// Create a score with no measures populated.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            neighbor: None,
            game: None,
            proximity: None,
        }
    }

    /// Builder-style setter for one measure.
    pub fn with(mut self, measure: Measure, summary: ScoreSummary) -> Self {
        *self.slot_mut(measure) = Some(summary);
        self
    }

    pub fn get(&self, measure: Measure) -> Option<&ScoreSummary> {
        match measure {
            Measure::Neighbor => self.neighbor.as_ref(),
            Measure::Game => self.game.as_ref(),
            Measure::Proximity => self.proximity.as_ref(),
        }
    }

    fn slot_mut(&mut self, measure: Measure) -> &mut Option<ScoreSummary> {
        match measure {
            Measure::Neighbor => &mut self.neighbor,
            Measure::Game => &mut self.game,
            Measure::Proximity => &mut self.proximity,
        }
    }

    /// Whether `self` Pareto-dominates `other` under `measures`.
    ///
    /// Only `std` takes part: `self` must be no worse on every enabled
    /// measure and strictly better on at least one. A measure missing on
    /// either side is skipped.
    pub fn dominates(&self, other: &CandidateScore, measures: &QualityMeasures) -> bool {
        let mut strictly_better = false;
        for measure in measures.enabled() {
            let (Some(a), Some(b)) = (self.get(measure), other.get(measure)) else {
                continue;
            };
            if a.std > b.std {
                return false;
            }
            if a.std < b.std {
                strictly_better = true;
            }
        }
        strictly_better
    }

    /// Enabled `std` values formatted for the progress line, e.g. `1.25, 0.8`.
    pub fn std_summary(&self, measures: &QualityMeasures) -> String {
        measures
            .enabled()
            .filter_map(|m| self.get(m))
            .map(|s| format!("{}", round2(s.std)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Round to two decimals for reporting.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(std: f64) -> ScoreSummary {
        ScoreSummary {
            min: 0.0,
            max: 0.0,
            std,
        }
    }

    fn two_measure(id: &str, neighbor: f64, game: f64) -> CandidateScore {
        CandidateScore::new(id)
            .with(Measure::Neighbor, summary(neighbor))
            .with(Measure::Game, summary(game))
    }

    fn neighbor_and_game() -> QualityMeasures {
        QualityMeasures {
            neighbor: true,
            game: true,
            proximity: false,
        }
    }

    #[test]
    fn test_summary_population_std() {
        let s = ScoreSummary::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert!((s.std - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_empty() {
        assert!(ScoreSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_better_game_dominates() {
        let measures = neighbor_and_game();
        let a = two_measure("a", 1.0, 2.0);
        let b = two_measure("b", 1.0, 1.5);
        assert!(b.dominates(&a, &measures));
        assert!(!a.dominates(&b, &measures));
    }

    #[test]
    fn test_tradeoff_is_incomparable() {
        let measures = neighbor_and_game();
        let a = two_measure("a", 1.0, 2.0);
        let b = two_measure("b", 2.0, 1.0);
        assert!(!a.dominates(&b, &measures));
        assert!(!b.dominates(&a, &measures));
    }

    #[test]
    fn test_no_self_dominance() {
        let measures = neighbor_and_game();
        let a = two_measure("a", 1.0, 2.0);
        assert!(!a.dominates(&a.clone(), &measures));
    }

    #[test]
    fn test_disabled_measure_ignored() {
        let neighbor_only = QualityMeasures {
            neighbor: true,
            game: false,
            proximity: false,
        };
        let a = two_measure("a", 1.0, 9.0);
        let b = two_measure("b", 2.0, 0.0);
        assert!(a.dominates(&b, &neighbor_only));
    }

    #[test]
    fn test_std_summary_rounds() {
        let score = two_measure("a", 1.2345, 0.5);
        assert_eq!(score.std_summary(&neighbor_and_game()), "1.23, 0.5");
    }
}
