use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::common::{move_cost, Cell};
use crate::map::Map;

const AXIS_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)]; // Up, down, left, right
const DIAGONAL_OFFSETS: [(isize, isize); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

pub trait NeighborExpander: Send + Sync {
    fn expand(&self, map: &Map, cell: Cell) -> Vec<(Cell, f64)>;
}

// A diagonal step needs both orthogonal flanks free
#[derive(Debug, Clone, Copy, Default)]
pub struct EightConnected;

impl NeighborExpander for EightConnected {
    fn expand(&self, map: &Map, cell: Cell) -> Vec<(Cell, f64)> {
        let mut neighbors = Vec::with_capacity(8);

        for (dr, dc) in AXIS_OFFSETS.into_iter().chain(DIAGONAL_OFFSETS) {
            let Some(next) = cell.offset(dr, dc) else {
                continue;
            };
            if !map.is_traversable(next) {
                continue;
            }
            if next.is_diagonal_to(&cell)
                && (map.is_obstacle(Cell::new(cell.row, next.col))
                    || map.is_obstacle(Cell::new(next.row, cell.col)))
            {
                continue;
            }
            neighbors.push((next, move_cost(cell, next)));
        }

        neighbors
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FourConnected;

impl NeighborExpander for FourConnected {
    fn expand(&self, map: &Map, cell: Cell) -> Vec<(Cell, f64)> {
        AXIS_OFFSETS
            .into_iter()
            .filter_map(|(dr, dc)| cell.offset(dr, dc))
            .filter(|next| map.is_traversable(*next))
            .map(|next| (next, move_cost(cell, next)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Four,
    #[default]
    Eight,
}

impl Connectivity {
    pub fn expander(self) -> &'static dyn NeighborExpander {
        match self {
            Connectivity::Four => &FourConnected,
            Connectivity::Eight => &EightConnected,
        }
    }
}
