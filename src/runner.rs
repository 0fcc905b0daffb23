use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::SearchError;
use crate::planner::Planner;
use crate::scenario::Scenario;
use crate::stat::Stats;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Solved {
        cost: f64,
        steps: usize,
        expanded_nodes: usize,
        generated_nodes: usize,
    },
    NotFound {
        expanded_nodes: usize,
        generated_nodes: usize,
    },
    Rejected { reason: String },
    Errored { reason: String },
}

impl Outcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Outcome::Solved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub index: usize,
    pub scenario: Scenario,
    pub outcome: Outcome,
    pub search_time_us: u128,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub heuristic: String,
    pub attempted: usize,
    pub solved: usize,
    pub failed_indices: Vec<usize>,
    // Mean path cost over solved scenarios
    pub average_path_length: f64,
    pub average_steps: f64,
    // Over solved scenarios with a positive reference cost
    pub average_suboptimality: Option<f64>,
    pub expanded_nodes: usize,
    pub generated_nodes: usize,
    // Summed over queries, while time_us is the wall time of the whole batch
    pub search_time_us: u128,
    pub time_us: u128,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl Summary {
    pub fn from_outcomes(heuristic: &str, outcomes: Vec<ScenarioOutcome>, time_us: u128) -> Self {
        let mut summary = Summary {
            heuristic: heuristic.to_string(),
            attempted: outcomes.len(),
            time_us,
            ..Default::default()
        };

        let mut total_cost: f64 = 0.0;
        let mut total_steps: usize = 0;
        let mut ratio_sum: f64 = 0.0;
        let mut ratio_count: usize = 0;

        for entry in &outcomes {
            summary.search_time_us += entry.search_time_us;
            match &entry.outcome {
                Outcome::Solved {
                    cost,
                    steps,
                    expanded_nodes,
                    generated_nodes,
                } => {
                    summary.solved += 1;
                    summary.expanded_nodes += *expanded_nodes;
                    summary.generated_nodes += *generated_nodes;
                    total_cost += *cost;
                    total_steps += *steps;
                    if let Some(reference) = entry.scenario.reference_cost.filter(|r| *r > 0.0) {
                        ratio_sum += cost / reference;
                        ratio_count += 1;
                    }
                }
                Outcome::NotFound {
                    expanded_nodes,
                    generated_nodes,
                } => {
                    summary.expanded_nodes += *expanded_nodes;
                    summary.generated_nodes += *generated_nodes;
                    summary.failed_indices.push(entry.index);
                }
                Outcome::Rejected { .. } | Outcome::Errored { .. } => {
                    summary.failed_indices.push(entry.index);
                }
            }
        }

        if summary.solved > 0 {
            summary.average_path_length = total_cost / summary.solved as f64;
            summary.average_steps = total_steps as f64 / summary.solved as f64;
        }
        if ratio_count > 0 {
            summary.average_suboptimality = Some(ratio_sum / ratio_count as f64);
        }
        summary.outcomes = outcomes;
        summary
    }

    pub fn failed(&self) -> usize {
        self.failed_indices.len()
    }

    pub fn print(&self) {
        info!(
            "[{}] Attempted {} Solved {} Failed {} Average path length {:.4} Average steps {:.2} Expanded nodes {} Generated nodes {} Search time(microseconds) {} Time(microseconds) {}",
            self.heuristic,
            self.attempted,
            self.solved,
            self.failed(),
            self.average_path_length,
            self.average_steps,
            self.expanded_nodes,
            self.generated_nodes,
            self.search_time_us,
            self.time_us
        );
        if let Some(ratio) = self.average_suboptimality {
            info!("[{}] Average cost / reference cost {ratio:.4}", self.heuristic);
        }
        if !self.failed_indices.is_empty() {
            debug!("[{}] Failed scenarios: {:?}", self.heuristic, self.failed_indices);
        }
    }
}

pub struct ScenarioRunner<'a> {
    planner: Planner<'a>,
    parallel: bool,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(planner: Planner<'a>) -> Self {
        ScenarioRunner {
            planner,
            parallel: false,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[instrument(skip_all, name = "run", fields(heuristic = %self.planner.heuristic().kind(), scenarios = scenarios.len()), level = "info")]
    pub fn run(&self, scenarios: &[Scenario]) -> Summary {
        let run_start_time = Instant::now();

        let outcomes: Vec<ScenarioOutcome> = if self.parallel {
            scenarios
                .par_iter()
                .enumerate()
                .map(|(index, scenario)| self.run_one(index, scenario))
                .collect()
        } else {
            scenarios
                .iter()
                .enumerate()
                .map(|(index, scenario)| self.run_one(index, scenario))
                .collect()
        };

        Summary::from_outcomes(
            &self.planner.heuristic().kind().to_string(),
            outcomes,
            run_start_time.elapsed().as_micros(),
        )
    }

    fn run_one(&self, index: usize, scenario: &Scenario) -> ScenarioOutcome {
        let map = self.planner.map();
        let mut stats = Stats::default();
        let outcome = match map
            .check_traversable(scenario.start)
            .and_then(|_| map.check_traversable(scenario.goal))
        {
            Err(err) => {
                warn!("Scenario {index}: rejected, {err}");
                Outcome::Rejected {
                    reason: err.to_string(),
                }
            }
            Ok(()) => {
                debug!(
                    "Solving scenario {index}: start {} -> goal {}",
                    scenario.start, scenario.goal
                );
                match self
                    .planner
                    .find_path_with_stats(scenario.start, scenario.goal, &mut stats)
                {
                    Ok(path) if path.is_found() => {
                        debug!("  Path found with {} steps.", path.len());
                        Outcome::Solved {
                            cost: path.cost(),
                            steps: path.len(),
                            expanded_nodes: stats.expanded_nodes,
                            generated_nodes: stats.generated_nodes,
                        }
                    }
                    Ok(_) => {
                        debug!("  No path found.");
                        Outcome::NotFound {
                            expanded_nodes: stats.expanded_nodes,
                            generated_nodes: stats.generated_nodes,
                        }
                    }
                    Err(err) => failure(index, err),
                }
            }
        };

        ScenarioOutcome {
            index,
            scenario: scenario.clone(),
            outcome,
            search_time_us: stats.time_us,
        }
    }
}

fn failure(index: usize, err: SearchError) -> Outcome {
    warn!("Scenario {index}: search failed, {err}");
    Outcome::Errored {
        reason: err.to_string(),
    }
}
