//! Quick draft search performance test

use draft_search::{
    compute::{DirectorySink, RandomDraftGenerator, SearchEngine, SeatRingStats, TsvResultStore},
    schema::SearchConfig,
};
use std::time::Instant;

fn run_once(config: SearchConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let sink = DirectorySink::new(dir.path(), config.player_ids())?;
    let store = TsvResultStore::create(dir.path(), config.quality_measures)?;
    let generator = RandomDraftGenerator::new(config.random_seed, config.max_drafts);
    let workers = config.workers;
    let engine = SearchEngine::new(config, generator, SeatRingStats, sink)?;

    let start = Instant::now();
    let result = engine.run(store);
    let elapsed = start.elapsed();

    let evaluated = result.stats.evaluated;
    println!(
        "Workers {}: {} drafts in {:.2}s ({:.1} drafts/sec), frontier {}, persisted {}",
        workers,
        evaluated,
        elapsed.as_secs_f64(),
        evaluated as f64 / elapsed.as_secs_f64(),
        result.frontier.len(),
        result.stats.persisted
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Draft Search Performance Test ===\n");

    for workers in [1, 2, 4, 8] {
        run_once(SearchConfig {
            workers,
            max_drafts: Some(20_000),
            random_seed: Some(42),
            time_budget_secs: None,
            ..Default::default()
        })?;
    }

    println!("\n=== League Size (4 workers) ===\n");

    for players in [6, 10, 16, 24] {
        print!("Players {:>2} | ", players);
        run_once(SearchConfig {
            players,
            houses: 6,
            max_drafts: Some(5_000),
            random_seed: Some(42),
            time_budget_secs: None,
            ..Default::default()
        })?;
    }

    Ok(())
}
