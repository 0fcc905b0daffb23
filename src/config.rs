use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Deserialize;

use crate::expander::Connectivity;
use crate::heuristic::HeuristicKind;

#[derive(Parser, Debug)]
#[command(
    name = "grid_astar",
    about = "A* benchmarking on 8-connected grid maps.",
    version = "0.1"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file; a random map is generated when omitted")]
    pub map_path: Option<String>,

    #[arg(long, help = "Path to the scenario file; random scenarios are used when omitted")]
    pub scen_path: Option<String>,

    #[arg(long, help = "Path to write the JSON summary to")]
    pub output_path: Option<String>,

    #[arg(long, help = "Rows of the generated map")]
    pub rows: Option<usize>,

    #[arg(long, help = "Columns of the generated map")]
    pub cols: Option<usize>,

    #[arg(
        long,
        help = "Number of obstacles in the generated map, overrides the obstacle ratio"
    )]
    pub num_obstacles: Option<usize>,

    #[arg(long, help = "Fraction of cells blocked in the generated map")]
    pub obstacle_ratio: Option<f64>,

    #[arg(long, help = "Number of random scenarios")]
    pub num_scenarios: Option<usize>,

    #[arg(long, help = "Maximum number of scenarios to run")]
    pub max_scenarios: Option<usize>,

    #[arg(long, help = "Only run scenarios from these buckets", value_delimiter = ',')]
    pub buckets: Option<Vec<usize>>,

    #[arg(long, help = "Heuristics to compare", value_delimiter = ',', value_enum)]
    pub heuristics: Option<Vec<HeuristicKind>>,

    #[arg(long, help = "Movement model", value_enum)]
    pub connectivity: Option<Connectivity>,

    #[arg(long, help = "Dimensions of the FastMap embedding")]
    pub embedding_dims: Option<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, help = "Abort a query after expanding this many nodes")]
    pub expansion_limit: Option<usize>,

    #[arg(long, help = "Run scenarios in parallel", default_value_t = false)]
    pub parallel: bool,

    #[arg(long, help = "Log filter used when RUST_LOG is not set")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map_path: Option<String>,
    pub scen_path: Option<String>,
    pub output_path: Option<String>,
    pub rows: usize,
    pub cols: usize,
    pub num_obstacles: Option<usize>,
    pub obstacle_ratio: f64,
    pub num_scenarios: usize,
    pub max_scenarios: usize,
    pub buckets: Vec<usize>,
    pub heuristics: Vec<HeuristicKind>,
    pub connectivity: Connectivity,
    pub embedding_dims: usize,
    pub seed: u64,
    pub expansion_limit: Option<usize>,
    pub parallel: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: None,
            scen_path: None,
            output_path: None,
            rows: 64,
            cols: 64,
            num_obstacles: None,
            obstacle_ratio: 0.2,
            num_scenarios: 100,
            max_scenarios: 500,
            buckets: Vec::new(),
            heuristics: vec![HeuristicKind::Octile],
            connectivity: Connectivity::Eight,
            embedding_dims: 5,
            seed: 0,
            expansion_limit: None,
            parallel: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("invalid YAML config")
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = Some(map_path.clone());
        }
        if let Some(scen_path) = &cli.scen_path {
            self.scen_path = Some(scen_path.clone());
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(rows) = cli.rows {
            self.rows = rows;
        }
        if let Some(cols) = cli.cols {
            self.cols = cols;
        }
        if cli.num_obstacles.is_some() {
            self.num_obstacles = cli.num_obstacles;
        }
        if let Some(obstacle_ratio) = cli.obstacle_ratio {
            self.obstacle_ratio = obstacle_ratio;
        }
        if let Some(num_scenarios) = cli.num_scenarios {
            self.num_scenarios = num_scenarios;
        }
        if let Some(max_scenarios) = cli.max_scenarios {
            self.max_scenarios = max_scenarios;
        }
        if let Some(buckets) = &cli.buckets {
            self.buckets = buckets.clone();
        }
        if let Some(heuristics) = &cli.heuristics {
            self.heuristics = heuristics.clone();
        }
        if let Some(connectivity) = cli.connectivity {
            self.connectivity = connectivity;
        }
        if let Some(embedding_dims) = cli.embedding_dims {
            self.embedding_dims = embedding_dims;
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if cli.expansion_limit.is_some() {
            self.expansion_limit = cli.expansion_limit;
        }
        if cli.parallel {
            self.parallel = true;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.heuristics.is_empty() {
            return Err(anyhow!("At least one heuristic must be selected"));
        }

        if self.heuristics.contains(&HeuristicKind::Embedding) && self.embedding_dims == 0 {
            return Err(anyhow!("Embedding dimensions must be greater than 0"));
        }

        if self.map_path.is_none() {
            if self.rows == 0 || self.cols == 0 {
                return Err(anyhow!(
                    "Generated map dimensions must be positive, got {}x{}",
                    self.rows,
                    self.cols
                ));
            }
            if !(0.0..1.0).contains(&self.obstacle_ratio) {
                return Err(anyhow!(
                    "Obstacle ratio must be in [0, 1), got {}",
                    self.obstacle_ratio
                ));
            }
            let cells = self.map_cells()?;
            let num_obstacles = self.num_obstacles()?;
            if num_obstacles >= cells {
                return Err(anyhow!(
                    "Generated map needs at least one free cell, got {num_obstacles} obstacles for {cells} cells"
                ));
            }
        }

        if self.max_scenarios == 0 {
            return Err(anyhow!("Maximum number of scenarios must be greater than 0"));
        }

        if self.expansion_limit == Some(0) {
            return Err(anyhow!("Expansion limit must be greater than 0"));
        }

        Ok(())
    }

    pub fn map_cells(&self) -> anyhow::Result<usize> {
        self.rows.checked_mul(self.cols).ok_or_else(|| {
            anyhow!(
                "Generated map of {}x{} cells is too large",
                self.rows,
                self.cols
            )
        })
    }

    // An explicit count wins over the ratio
    pub fn num_obstacles(&self) -> anyhow::Result<usize> {
        match self.num_obstacles {
            Some(num_obstacles) => Ok(num_obstacles),
            None => Ok((self.map_cells()? as f64 * self.obstacle_ratio).floor() as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_config() {
        let yaml = "map_path: map_file/test/test.map\nheuristics: [octile, embedding]\nembedding_dims: 3\nconnectivity: eight\nseed: 7\n";
        let config = Config::from_yaml_str(yaml).unwrap();

        assert_eq!(config.map_path.as_deref(), Some("map_file/test/test.map"));
        assert_eq!(
            config.heuristics,
            vec![HeuristicKind::Octile, HeuristicKind::Embedding]
        );
        assert_eq!(config.embedding_dims, 3);
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_scenarios, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_rejects_unknown_fields() {
        assert!(Config::from_yaml_str("solver: cbs\n").is_err());
        assert!(Config::from_yaml_str("heuristics: [euclid]\n").is_err());
    }

    #[test]
    fn test_command_line_overrides_file() {
        let config = Config::from_yaml_str("seed: 7\nrows: 10\ncols: 10\n").unwrap();
        let cli = Cli::parse_from([
            "grid_astar",
            "--seed",
            "3",
            "--heuristics",
            "manhattan,octile",
            "--connectivity",
            "four",
            "--parallel",
        ]);
        let config = config.override_from_command_line(&cli).unwrap();

        assert_eq!(config.seed, 3);
        assert_eq!(config.rows, 10);
        assert_eq!(config.num_obstacles().unwrap(), 20);
        assert_eq!(
            config.heuristics,
            vec![HeuristicKind::Manhattan, HeuristicKind::Octile]
        );
        assert_eq!(config.connectivity, Connectivity::Four);
        assert!(config.parallel);
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.heuristics = vec![HeuristicKind::Embedding];
        config.embedding_dims = 0;
        assert!(config.validate().is_err());

        let config = Config {
            rows: 2,
            cols: 2,
            num_obstacles: Some(4),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            obstacle_ratio: 1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            obstacle_ratio: -0.1,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            expansion_limit: Some(0),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            heuristics: Vec::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_small_map_from_command_line() {
        let cli = Cli::parse_from(["grid_astar", "--rows", "10", "--cols", "10"]);
        let config = Config::default().override_from_command_line(&cli).unwrap();

        assert_eq!((config.rows, config.cols), (10, 10));
        assert_eq!(config.num_obstacles().unwrap(), 20);

        let cli = Cli::parse_from([
            "grid_astar",
            "--rows",
            "10",
            "--cols",
            "10",
            "--num-obstacles",
            "99",
        ]);
        let config = Config::default().override_from_command_line(&cli).unwrap();
        assert_eq!(config.num_obstacles().unwrap(), 99);

        let cli = Cli::parse_from([
            "grid_astar",
            "--rows",
            "10",
            "--cols",
            "10",
            "--num-obstacles",
            "100",
        ]);
        assert!(Config::default().override_from_command_line(&cli).is_err());
    }

    #[test]
    fn test_oversized_map_is_rejected() {
        let config = Config {
            rows: usize::MAX,
            cols: 2,
            ..Config::default()
        };
        assert!(config.map_cells().is_err());
        assert!(config.validate().is_err());
    }
}
