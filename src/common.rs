use serde::{Deserialize, Serialize};
use std::fmt;

use crate::map::Map;

pub const DIAGONAL_COST: f64 = std::f64::consts::SQRT_2;
pub const AXIS_COST: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    pub fn offset(&self, dr: isize, dc: isize) -> Option<Cell> {
        Some(Cell {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }

    pub fn is_diagonal_to(&self, other: &Cell) -> bool {
        self.row != other.row && self.col != other.col
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

pub fn move_cost(from: Cell, to: Cell) -> f64 {
    if from.is_diagonal_to(&to) {
        DIAGONAL_COST
    } else {
        AXIS_COST
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    pub steps: Vec<Cell>,
}

impl Path {
    pub fn empty() -> Self {
        Path { steps: Vec::new() }
    }

    pub fn is_found(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn cost(&self) -> f64 {
        self.steps
            .windows(2)
            .map(|pair| move_cost(pair[0], pair[1]))
            .sum()
    }

    // Legal 8-connected walk from start to goal without corner cutting
    pub fn verify(&self, map: &Map, start: Cell, goal: Cell) -> bool {
        if self.steps.first() != Some(&start) || self.steps.last() != Some(&goal) {
            return false;
        }
        if !self.steps.iter().all(|cell| map.is_traversable(*cell)) {
            return false;
        }

        self.steps.windows(2).all(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let dr = a.row.abs_diff(b.row);
            let dc = a.col.abs_diff(b.col);
            if dr > 1 || dc > 1 || (dr == 0 && dc == 0) {
                return false;
            }
            if a.is_diagonal_to(&b) {
                let flank_1 = Cell::new(a.row, b.col);
                let flank_2 = Cell::new(b.row, a.col);
                return !map.is_obstacle(flank_1) && !map.is_obstacle(flank_2);
            }
            true
        })
    }
}
