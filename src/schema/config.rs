//! Configuration types for the draft search.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{House, Measure};

/// Default time budget: two weeks.
const DEFAULT_TIME_BUDGET_SECS: u64 = 14 * 24 * 60 * 60;

/// Which quality measures take part in scoring and dominance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityMeasures {
    pub neighbor: bool,
    pub game: bool,
    pub proximity: bool,
}

impl Default for QualityMeasures {
    fn default() -> Self {
        Self {
            neighbor: true,
            game: true,
            proximity: true,
        }
    }
}

impl QualityMeasures {
    pub fn is_enabled(&self, measure: Measure) -> bool {
        match measure {
            Measure::Neighbor => self.neighbor,
            Measure::Game => self.game,
            Measure::Proximity => self.proximity,
        }
    }

    /// Enabled measures in column order.
    pub fn enabled(&self) -> impl Iterator<Item = Measure> + '_ {
        Measure::ALL.into_iter().filter(|m| self.is_enabled(*m))
    }

    pub fn any(&self) -> bool {
        self.neighbor || self.game || self.proximity
    }
}

impl fmt::Display for QualityMeasures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.enabled().map(|m| m.to_string()).collect();
        f.write_str(&names.join(", "))
    }
}

/// Top-level search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Number of league players.
    pub players: usize,
    /// Houses per game.
    pub houses: usize,
    /// Parallel search workers.
    pub workers: usize,
    /// Capacity of the accepted-score queue.
    pub queue_capacity: usize,
    /// Directory receiving `results.txt` and the draft files.
    pub results_path: PathBuf,
    /// Enabled quality measures.
    pub quality_measures: QualityMeasures,
    /// Overall search time budget (None = run until cancelled or exhausted).
    pub time_budget_secs: Option<u64>,
    /// Number of drafts the generator may draw before reporting exhaustion.
    pub max_drafts: Option<u64>,
    /// Random seed for reproducibility.
    pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            players: 10,
            houses: 6,
            workers: 4,
            queue_capacity: 100,
            results_path: PathBuf::from("results"),
            quality_measures: QualityMeasures::default(),
            time_budget_secs: Some(DEFAULT_TIME_BUDGET_SECS),
            max_drafts: None,
            random_seed: None,
        }
    }
}

impl SearchConfig {
    /// Player labels handed to the stat extractor, `"1"..="N"`.
    pub fn player_ids(&self) -> Vec<String> {
        (1..=self.players).map(|i| i.to_string()).collect()
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.quality_measures.any() {
            return Err(ConfigError::NoQualityMeasures);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }
        if !(House::MIN_PER_GAME..=House::ALL.len()).contains(&self.houses) {
            return Err(ConfigError::InvalidHouses {
                houses: self.houses,
                min: House::MIN_PER_GAME,
                max: House::ALL.len(),
            });
        }
        if self.players < self.houses {
            return Err(ConfigError::TooFewPlayers {
                players: self.players,
                houses: self.houses,
            });
        }
        if self.time_budget_secs == Some(0) {
            return Err(ConfigError::InvalidTimeBudget);
        }
        if self.max_drafts == Some(0) {
            return Err(ConfigError::InvalidDraftBudget);
        }
        Ok(())
    }
}

impl fmt::Display for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " - Players: {}", self.players)?;
        writeln!(f, " - Houses: {}", self.houses)?;
        writeln!(f, " - Workers: {}", self.workers)?;
        writeln!(f, " - ResultsPath: {}", self.results_path.display())?;
        write!(f, " - QualityMeasures: {}", self.quality_measures)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("All quality measures are disabled. Enable at least one of them")]
    NoQualityMeasures,
    #[error("Worker count must be non-zero")]
    InvalidWorkers,
    #[error("Result queue capacity must be non-zero")]
    InvalidQueueCapacity,
    #[error("House count {houses} must be between {min} and {max}")]
    InvalidHouses {
        houses: usize,
        min: usize,
        max: usize,
    },
    #[error("{players} players cannot fill games of {houses} houses")]
    TooFewPlayers { players: usize, houses: usize },
    #[error("Time budget must be positive")]
    InvalidTimeBudget,
    #[error("Draft budget must be positive")]
    InvalidDraftBudget,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_no_measures_rejected() {
        let config = SearchConfig {
            quality_measures: QualityMeasures {
                neighbor: false,
                game: false,
                proximity: false,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NoQualityMeasures)
        ));
    }

    #[test]
    fn test_invalid_counts_rejected() {
        let zero_workers = SearchConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_workers.validate(),
            Err(ConfigError::InvalidWorkers)
        ));

        let zero_queue = SearchConfig {
            queue_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            zero_queue.validate(),
            Err(ConfigError::InvalidQueueCapacity)
        ));

        let too_many_houses = SearchConfig {
            houses: 8,
            ..Default::default()
        };
        assert!(matches!(
            too_many_houses.validate(),
            Err(ConfigError::InvalidHouses { .. })
        ));

        let too_few_players = SearchConfig {
            players: 4,
            houses: 6,
            ..Default::default()
        };
        assert!(matches!(
            too_few_players.validate(),
            Err(ConfigError::TooFewPlayers { .. })
        ));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"players": 8, "quality_measures": {"game": false}}"#)
                .unwrap();
        assert_eq!(config.players, 8);
        assert_eq!(config.houses, 6);
        assert!(config.quality_measures.neighbor);
        assert!(!config.quality_measures.game);
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn test_measure_names() {
        let measures = QualityMeasures {
            neighbor: true,
            game: false,
            proximity: true,
        };
        assert_eq!(measures.to_string(), "Neighbor, Proximity");
        assert_eq!(config_player_ids(), vec!["1", "2", "3"]);
    }

    fn config_player_ids() -> Vec<String> {
        SearchConfig {
            players: 3,
            houses: 3,
            ..Default::default()
        }
        .player_ids()
    }
}
