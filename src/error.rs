use crate::common::Cell;

// Loader errors go through anyhow. An exhausted frontier is an empty Path, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    InvalidDimensions { height: usize, width: usize },
    OutOfBounds { cell: Cell },
    Obstacle { cell: Cell },
    InvalidObstacleCount { requested: usize, capacity: usize },
    MissingEmbedding { cell: Cell },
    EmbeddingDimension {
        cell: Cell,
        expected: usize,
        found: usize,
    },
    ExpansionLimit { limit: usize },
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDimensions { height, width } => {
                write!(f, "invalid map dimensions {height}x{width}")
            }
            Self::OutOfBounds { cell } => write!(f, "cell {cell} is out of bounds"),
            Self::Obstacle { cell } => write!(f, "cell {cell} is an obstacle"),
            Self::InvalidObstacleCount {
                requested,
                capacity,
            } => write!(
                f,
                "cannot place {requested} obstacles, only {capacity} cells available"
            ),
            Self::MissingEmbedding { cell } => {
                write!(f, "embedding heuristic has no entry for cell {cell}")
            }
            Self::EmbeddingDimension {
                cell,
                expected,
                found,
            } => write!(
                f,
                "embedding for cell {cell} has {found} dimensions, expected {expected}"
            ),
            Self::ExpansionLimit { limit } => {
                write!(f, "search exceeded the expansion limit of {limit} nodes")
            }
        }
    }
}

impl std::error::Error for SearchError {}
