mod astar;
pub mod dijkstra;

pub(crate) use astar::a_star_search;
pub use dijkstra::dijkstra;

use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::common::{Cell, Path};

type Trace = HashMap<Cell, Cell>;

// Stale entries for an already closed cell are skipped when popped
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenNode {
    pub(crate) position: Cell,
    pub(crate) f_cost: OrderedFloat<f64>,
    pub(crate) g_cost: OrderedFloat<f64>,
    pub(crate) sequence: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .cmp(&other.f_cost)
            // Higher g cost (lower h) has higher priority
            .then_with(|| other.g_cost.cmp(&self.g_cost))
            // Earlier pushes first, which also keeps every entry distinct
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn construct_path(trace: &Trace, mut current: Cell) -> Path {
    let mut steps = vec![current];
    while let Some(&previous) = trace.get(&current) {
        steps.push(previous);
        current = previous;
    }
    steps.reverse();
    Path { steps }
}
