use crate::algorithm::a_star_search;
use crate::common::{Cell, Path};
use crate::error::SearchError;
use crate::expander::NeighborExpander;
use crate::heuristic::Heuristic;
use crate::map::Map;
use crate::stat::Stats;

#[derive(Clone, Copy)]
pub struct Planner<'a> {
    map: &'a Map,
    expander: &'a dyn NeighborExpander,
    heuristic: &'a Heuristic,
    expansion_limit: Option<usize>,
}

impl<'a> Planner<'a> {
    pub fn new(map: &'a Map, expander: &'a dyn NeighborExpander, heuristic: &'a Heuristic) -> Self {
        Planner {
            map,
            expander,
            heuristic,
            expansion_limit: None,
        }
    }

    pub fn with_expansion_limit(mut self, limit: Option<usize>) -> Self {
        self.expansion_limit = limit;
        self
    }

    pub fn map(&self) -> &'a Map {
        self.map
    }

    pub fn heuristic(&self) -> &'a Heuristic {
        self.heuristic
    }

    pub fn find_path(&self, start: Cell, goal: Cell) -> Result<Path, SearchError> {
        self.find_path_with_stats(start, goal, &mut Stats::default())
    }

    pub fn find_path_with_stats(
        &self,
        start: Cell,
        goal: Cell,
        stats: &mut Stats,
    ) -> Result<Path, SearchError> {
        a_star_search(
            self.map,
            self.expander,
            self.heuristic,
            start,
            goal,
            self.expansion_limit,
            stats,
        )
    }
}
