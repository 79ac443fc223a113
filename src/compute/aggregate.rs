//! Reduction of per-player statistics into a candidate score.

use crate::schema::{CandidateScore, Measure, PlayerStatRecord, QualityMeasures, ScoreSummary};

use super::SearchError;

/// Score one candidate: summarize every enabled measure over all records.
///
/// Disabled measures stay `None` so they can never be mistaken for a zero
/// score. An empty record set is rejected with [`SearchError::EmptyCandidate`].
pub fn aggregate_score(
    id: impl Into<String>,
    measures: &QualityMeasures,
    records: &[PlayerStatRecord],
) -> Result<CandidateScore, SearchError> {
    if records.is_empty() {
        return Err(SearchError::EmptyCandidate);
    }

    let mut score = CandidateScore::new(id);
    let mut values = Vec::with_capacity(records.len());
    for measure in measures.enabled() {
        values.clear();
        values.extend(records.iter().map(|r| measure_value(r, measure)));
        if let Some(summary) = ScoreSummary::from_values(&values) {
            score = score.with(measure, summary);
        }
    }

    Ok(score)
}

fn measure_value(record: &PlayerStatRecord, measure: Measure) -> f64 {
    match measure {
        Measure::Neighbor => record.neighbor,
        Measure::Game => record.game,
        Measure::Proximity => record.proximity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(neighbor: f64, game: f64, proximity: f64) -> PlayerStatRecord {
        PlayerStatRecord {
            player: "1".to_string(),
            opponent: "2".to_string(),
            neighbor,
            game,
            proximity,
        }
    }

    #[test]
    fn test_aggregate_enabled_only() {
        let measures = QualityMeasures {
            neighbor: true,
            game: false,
            proximity: true,
        };
        let records = vec![record(1.0, 5.0, 0.5), record(3.0, 5.0, 1.5)];

        let score = aggregate_score("0-0", &measures, &records).unwrap();

        assert_eq!(score.id, "0-0");
        let neighbor = score.neighbor.unwrap();
        assert_eq!(neighbor.min, 1.0);
        assert_eq!(neighbor.max, 3.0);
        assert!((neighbor.std - 1.0).abs() < 1e-12);
        assert!(score.game.is_none());
        assert!((score.proximity.unwrap().std - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_uniform_is_zero_std() {
        let measures = QualityMeasures::default();
        let records = vec![record(2.0, 2.0, 2.0); 4];
        let score = aggregate_score("x", &measures, &records).unwrap();
        assert_eq!(score.game.unwrap().std, 0.0);
    }

    #[test]
    fn test_aggregate_empty() {
        let result = aggregate_score("0-1", &QualityMeasures::default(), &[]);
        assert!(matches!(result, Err(SearchError::EmptyCandidate)));
    }
}
