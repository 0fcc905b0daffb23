mod embedding;

pub use embedding::Embedding;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::common::{Cell, DIAGONAL_COST};
use crate::error::SearchError;
use crate::expander::Connectivity;

pub fn octile(a: Cell, b: Cell) -> f64 {
    let dr = a.row.abs_diff(b.row) as f64;
    let dc = a.col.abs_diff(b.col) as f64;
    dr.max(dc) + (DIAGONAL_COST - 1.0) * dr.min(dc)
}

// Only admissible when diagonal moves are disabled
pub fn manhattan(a: Cell, b: Cell) -> f64 {
    (a.row.abs_diff(b.row) + a.col.abs_diff(b.col)) as f64
}

#[derive(Debug, Clone)]
pub enum Heuristic {
    Octile,
    Manhattan,
    Embedding(Embedding),
}

impl Heuristic {
    pub fn estimate(&self, a: Cell, b: Cell) -> Result<f64, SearchError> {
        match self {
            Heuristic::Octile => Ok(octile(a, b)),
            Heuristic::Manhattan => Ok(manhattan(a, b)),
            Heuristic::Embedding(embedding) => embedding.distance(a, b),
        }
    }

    pub fn kind(&self) -> HeuristicKind {
        match self {
            Heuristic::Octile => HeuristicKind::Octile,
            Heuristic::Manhattan => HeuristicKind::Manhattan,
            Heuristic::Embedding(_) => HeuristicKind::Embedding,
        }
    }

    pub fn is_admissible_for(&self, connectivity: Connectivity) -> bool {
        match self {
            Heuristic::Octile => true,
            Heuristic::Manhattan => connectivity == Connectivity::Four,
            Heuristic::Embedding(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicKind {
    Octile,
    Manhattan,
    Embedding,
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeuristicKind::Octile => "octile",
            HeuristicKind::Manhattan => "manhattan",
            HeuristicKind::Embedding => "embedding",
        };
        f.write_str(name)
    }
}
