use anyhow::{anyhow, bail, Context};
use rand::Rng;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::str::FromStr;
use tracing::{debug, info};

use crate::common::Cell;
use crate::error::SearchError;

const BLOCKING_TERRAIN: [char; 3] = ['@', 'T', 'W'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    passable: bool,
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    grid: Vec<Vec<Tile>>,
}

impl Map {
    pub fn new<I>(height: usize, width: usize, obstacles: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = Cell>,
    {
        if height == 0 || width == 0 {
            return Err(SearchError::InvalidDimensions { height, width });
        }

        let mut grid = vec![vec![Tile { passable: true }; width]; height];
        for cell in obstacles {
            if cell.row >= height || cell.col >= width {
                return Err(SearchError::OutOfBounds { cell });
            }
            grid[cell.row][cell.col].passable = false;
        }

        Ok(Map {
            height,
            width,
            grid,
        })
    }

    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("failed to open map file {path}"))?;
        let map = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse map file {path}"))?;
        info!(
            "Loaded map {path}: {}x{} with {} obstacles",
            map.height,
            map.width,
            map.obstacles().count()
        );
        Ok(map)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> anyhow::Result<Self> {
        let mut lines = reader.lines();
        let mut height = None;
        let mut width = None;

        // Header lines come in any order until the "map" marker.
        loop {
            let line = lines
                .next()
                .ok_or_else(|| anyhow!("missing `map` marker"))??;
            let line = line.trim();
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("map") => break,
                Some("height") => height = Some(parse_header_value("height", parts.next())?),
                Some("width") => width = Some(parse_header_value("width", parts.next())?),
                Some("type") | None => {}
                Some(other) => debug!("ignoring unknown map header `{other}`"),
            }
        }

        let height = height.ok_or_else(|| anyhow!("missing `height` header"))?;
        let width = width.ok_or_else(|| anyhow!("missing `width` header"))?;

        let mut obstacles = Vec::new();
        for row in 0..height {
            let line = lines
                .next()
                .ok_or_else(|| anyhow!("expected {height} map rows, found {row}"))??;
            let chars: Vec<char> = line.trim_end().chars().collect();
            if chars.len() < width {
                bail!(
                    "map row {row} has {} columns, expected {width}",
                    chars.len()
                );
            }
            obstacles.extend(
                chars
                    .iter()
                    .take(width)
                    .enumerate()
                    .filter(|(_, ch)| BLOCKING_TERRAIN.contains(*ch))
                    .map(|(col, _)| Cell::new(row, col)),
            );
        }

        Ok(Map::new(height, width, obstacles)?)
    }

    // Exactly `num_obstacles` distinct cells, never on a reserved one
    pub fn random<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        num_obstacles: usize,
        reserved: &[Cell],
        rng: &mut R,
    ) -> Result<Self, SearchError> {
        let cells = height
            .checked_mul(width)
            .filter(|cells| *cells > 0)
            .ok_or(SearchError::InvalidDimensions { height, width })?;

        let reserved: HashSet<Cell> = reserved
            .iter()
            .copied()
            .filter(|cell| cell.row < height && cell.col < width)
            .collect();
        let capacity = cells - reserved.len();
        if num_obstacles > capacity {
            return Err(SearchError::InvalidObstacleCount {
                requested: num_obstacles,
                capacity,
            });
        }

        let mut obstacles = HashSet::with_capacity(num_obstacles);
        while obstacles.len() < num_obstacles {
            let cell = Cell::new(rng.gen_range(0..height), rng.gen_range(0..width));
            if !reserved.contains(&cell) {
                obstacles.insert(cell);
            }
        }

        Map::new(height, width, obstacles)
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    // Out-of-bounds cells are not obstacles
    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && !self.grid[cell.row][cell.col].is_passable()
    }

    pub fn is_traversable(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.grid[cell.row][cell.col].is_passable()
    }

    pub fn check_traversable(&self, cell: Cell) -> Result<(), SearchError> {
        if !self.in_bounds(cell) {
            Err(SearchError::OutOfBounds { cell })
        } else if self.is_obstacle(cell) {
            Err(SearchError::Obstacle { cell })
        } else {
            Ok(())
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Cell::new(row, col)))
    }

    pub fn free_cells(&self) -> Vec<Cell> {
        self.cells().filter(|cell| self.is_traversable(*cell)).collect()
    }

    pub fn obstacles(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(|cell| self.is_obstacle(*cell))
    }
}

impl FromStr for Map {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_reader(s.as_bytes())
    }
}

fn parse_header_value(name: &str, value: Option<&str>) -> anyhow::Result<usize> {
    let value = value.ok_or_else(|| anyhow!("`{name}` header has no value"))?;
    value
        .parse::<usize>()
        .with_context(|| format!("invalid `{name}` value `{value}`"))
}
