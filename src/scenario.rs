use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::info;

use crate::common::Cell;
use crate::map::Map;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub bucket: usize,
    pub start: Cell,
    pub goal: Cell,
    pub reference_cost: Option<f64>,
}

impl Scenario {
    pub fn new(start: Cell, goal: Cell) -> Self {
        Scenario {
            bucket: 0,
            start,
            goal,
            reference_cost: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioSet {
    pub map: String,
    pub map_width: usize,
    pub map_height: usize,
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub fn load_from_scen(path: &str) -> Result<ScenarioSet> {
        let file =
            File::open(path).with_context(|| format!("failed to open scenario file {path}"))?;
        let set = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse scenario file {path}"))?;
        info!(
            "Loaded {} scenarios for map {} from {path}",
            set.len(),
            set.map
        );
        Ok(set)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<ScenarioSet> {
        let mut lines = reader.lines().enumerate();

        // First line is "version x.x" which we can skip
        let (_, version) = lines
            .next()
            .ok_or_else(|| anyhow!("empty scenario file"))?;
        let version = version?;
        if !version.trim_start().starts_with("version") {
            bail!("expected a `version` line, found `{version}`");
        }

        let mut set = ScenarioSet::default();
        for (index, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let line_number = index + 1;
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 8 {
                bail!(
                    "line {line_number}: expected at least 8 fields, found {}",
                    parts.len()
                );
            }

            let field = |i: usize, name: &str| -> Result<usize> {
                parts[i]
                    .parse()
                    .with_context(|| format!("line {line_number}: invalid {name} `{}`", parts[i]))
            };

            // Scenario files store x (column) before y (row).
            let scenario = Scenario {
                bucket: field(0, "bucket")?,
                start: Cell::new(field(5, "start_y")?, field(4, "start_x")?),
                goal: Cell::new(field(7, "goal_y")?, field(6, "goal_x")?),
                reference_cost: parts
                    .get(8)
                    .map(|cost| {
                        cost.parse::<f64>().with_context(|| {
                            format!("line {line_number}: invalid reference cost `{cost}`")
                        })
                    })
                    .transpose()?,
            };

            if set.map.is_empty() {
                // Initialize map details from the first entry
                set.map = parts[1].to_string();
                set.map_width = field(2, "width")?;
                set.map_height = field(3, "height")?;
            }

            set.scenarios.push(scenario);
        }

        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn buckets(&self) -> BTreeMap<usize, Vec<Scenario>> {
        let mut buckets: BTreeMap<usize, Vec<Scenario>> = BTreeMap::new();
        for scenario in &self.scenarios {
            buckets
                .entry(scenario.bucket)
                .or_default()
                .push(scenario.clone());
        }
        buckets
    }

    // An empty list keeps every scenario
    pub fn select_buckets(&self, buckets: &[usize]) -> Vec<Scenario> {
        self.scenarios
            .iter()
            .filter(|scenario| buckets.is_empty() || buckets.contains(&scenario.bucket))
            .cloned()
            .collect()
    }

    pub fn matches_map(&self, map: &Map) -> bool {
        self.map.is_empty() || (self.map_width == map.width && self.map_height == map.height)
    }
}

// Goal is not guaranteed reachable
pub fn random_scenarios<R: Rng + ?Sized>(map: &Map, count: usize, rng: &mut R) -> Vec<Scenario> {
    let free_cells = map.free_cells();
    if free_cells.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|_| {
            let start = free_cells[rng.gen_range(0..free_cells.len())];
            let goal = free_cells[rng.gen_range(0..free_cells.len())];
            Scenario::new(start, goal)
        })
        .collect()
}
