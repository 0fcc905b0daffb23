use grid_astar::config::{Cli, Config};
use grid_astar::heuristic::{Embedding, Heuristic, HeuristicKind};
use grid_astar::map::Map;
use grid_astar::planner::Planner;
use grid_astar::runner::{ScenarioRunner, Summary};
use grid_astar::scenario::{random_scenarios, Scenario, ScenarioSet};

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufWriter;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.config.is_none() {
        info!("No config file specified, using default config");
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let map = load_map(&config, &mut rng)?;
    let scenarios = load_scenarios(&config, &map, &mut rng)?;
    info!("Running {} scenarios", scenarios.len());

    let expander = config.connectivity.expander();
    let mut summaries = Vec::new();

    for kind in &config.heuristics {
        let heuristic = build_heuristic(*kind, &config, &map, &mut rng);
        if !heuristic.is_admissible_for(config.connectivity) {
            warn!("{kind} heuristic is not admissible here, paths may be suboptimal");
        }

        let planner =
            Planner::new(&map, expander, &heuristic).with_expansion_limit(config.expansion_limit);
        let summary = ScenarioRunner::new(planner)
            .parallel(config.parallel)
            .run(&scenarios);
        summary.print();
        summaries.push(summary);
    }

    if let Some(output_path) = &config.output_path {
        write_summaries(output_path, &summaries)?;
    }

    Ok(())
}

fn load_map(config: &Config, rng: &mut StdRng) -> anyhow::Result<Map> {
    match &config.map_path {
        Some(map_path) => Map::from_file(map_path),
        None => {
            let num_obstacles = config.num_obstacles()?;
            info!(
                "No map file specified, generating a {}x{} map with {num_obstacles} obstacles",
                config.rows, config.cols
            );
            Ok(Map::random(
                config.rows,
                config.cols,
                num_obstacles,
                &[],
                rng,
            )?)
        }
    }
}

fn load_scenarios(config: &Config, map: &Map, rng: &mut StdRng) -> anyhow::Result<Vec<Scenario>> {
    let mut scenarios = match &config.scen_path {
        Some(scen_path) => {
            let set = ScenarioSet::load_from_scen(scen_path)?;
            if !set.matches_map(map) {
                warn!(
                    "Scenario file was generated for a {}x{} map, loaded map is {}x{}",
                    set.map_width, set.map_height, map.width, map.height
                );
            }
            set.select_buckets(&config.buckets)
        }
        None => random_scenarios(map, config.num_scenarios, rng),
    };
    scenarios.truncate(config.max_scenarios);
    Ok(scenarios)
}

fn build_heuristic(
    kind: HeuristicKind,
    config: &Config,
    map: &Map,
    rng: &mut StdRng,
) -> Heuristic {
    match kind {
        HeuristicKind::Octile => Heuristic::Octile,
        HeuristicKind::Manhattan => Heuristic::Manhattan,
        HeuristicKind::Embedding => {
            let build_start_time = Instant::now();
            let embedding =
                Embedding::fastmap(map, config.connectivity.expander(), config.embedding_dims, rng);
            info!(
                "Built {}-dimensional embedding for {} cells in {} ms",
                embedding.dims(),
                embedding.len(),
                build_start_time.elapsed().as_millis()
            );
            Heuristic::Embedding(embedding)
        }
    }
}

fn write_summaries(path: &str, summaries: &[Summary]) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory for {path}"))?;
        }
    }
    let file = File::create(path).with_context(|| format!("failed to create output file {path}"))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summaries)
        .with_context(|| format!("failed to write results to {path}"))?;
    info!("Results written to {path}");
    Ok(())
}
