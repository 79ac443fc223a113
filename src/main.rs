//! Draft search CLI - Search balanced drafts from JSON configuration.

use std::fs;
use std::path::PathBuf;

use draft_search::{
    compute::{DirectorySink, RandomDraftGenerator, SearchEngine, SeatRingStats, TsvResultStore},
    schema::{SearchConfig, StopReason, round2},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Search Pareto-balanced league drafts.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to search configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: SearchConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let sink = DirectorySink::new(&config.results_path, config.player_ids()).unwrap_or_else(|e| {
        eprintln!(
            "Error creating results directory {}: {}",
            config.results_path.display(),
            e
        );
        std::process::exit(1);
    });

    match sink.clear_stale() {
        Ok(removed) => log::info!("Results directory files are removed ({removed})."),
        Err(e) => log::warn!("Could not clear old draft files: {e}"),
    }

    let store = TsvResultStore::create(&config.results_path, config.quality_measures)
        .unwrap_or_else(|e| {
            eprintln!("Error creating results file: {}", e);
            std::process::exit(1);
        });

    let generator = RandomDraftGenerator::new(config.random_seed, config.max_drafts);
    let measures = config.quality_measures;

    let engine = SearchEngine::new(config, generator, SeatRingStats, sink).unwrap_or_else(|e| {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    });

    println!("Draft Search");
    println!("============");
    println!("{}", engine.config());
    println!();

    let result = engine.run(store);
    let stats = &result.stats;

    println!();
    println!("Stopped: {:?}", stats.stop_reason);
    println!("  Evaluated:        {}", stats.evaluated);
    println!("  Accepted:         {}", stats.accepted);
    println!("  Persisted:        {}", stats.persisted);
    println!("  Dominated:        {}", stats.dominated);
    println!("  Lost races:       {}", stats.lost_races);
    if stats.sink_failures > 0 {
        println!("  Unsaved drafts:   {}", stats.sink_failures);
    }
    if stats.worker_failures > 0 {
        println!("  Failed workers:   {}", stats.worker_failures);
    }
    println!(
        "  Time:             {:.2}s ({:.1} drafts/s)",
        stats.elapsed_seconds,
        stats.evaluated as f64 / stats.elapsed_seconds.max(1e-9)
    );
    println!();
    println!("Frontier ({}):", result.frontier.len());
    for score in &result.frontier {
        let columns: Vec<String> = measures
            .enabled()
            .filter_map(|m| score.get(m).map(|s| format!("{m}={}", round2(s.std))))
            .collect();
        println!("  {}  {}", score.id, columns.join("  "));
    }

    if matches!(stats.stop_reason, StopReason::PipelineFailure(_)) {
        std::process::exit(1);
    }
}

fn print_example_config() {
    let config = SearchConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing config: {e}"),
    }
}
