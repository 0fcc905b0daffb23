use rand::Rng;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, instrument};

use crate::algorithm::dijkstra;
use crate::common::Cell;
use crate::error::SearchError;
use crate::expander::NeighborExpander;
use crate::map::Map;

const PIVOT_EPSILON: f64 = 1e-3;

type EdgeWeights = HashMap<(Cell, Cell), f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    dims: usize,
    coordinates: HashMap<Cell, Vec<f64>>,
}

impl Embedding {
    pub fn from_coordinates(
        map: &Map,
        dims: usize,
        coordinates: HashMap<Cell, Vec<f64>>,
    ) -> Result<Self, SearchError> {
        for cell in map.free_cells() {
            let vector = coordinates
                .get(&cell)
                .ok_or(SearchError::MissingEmbedding { cell })?;
            if vector.len() != dims {
                return Err(SearchError::EmbeddingDimension {
                    cell,
                    expected: dims,
                    found: vector.len(),
                });
            }
        }
        if let Some((&cell, vector)) = coordinates.iter().find(|(_, v)| v.len() != dims) {
            return Err(SearchError::EmbeddingDimension {
                cell,
                expected: dims,
                found: vector.len(),
            });
        }

        Ok(Embedding { dims, coordinates })
    }

    pub fn grid_coordinates(map: &Map) -> Self {
        let coordinates = map
            .free_cells()
            .into_iter()
            .map(|cell| (cell, vec![cell.row as f64, cell.col as f64]))
            .collect();
        Embedding {
            dims: 2,
            coordinates,
        }
    }

    // Two far-apart pivots per component and dimension, then every edge weight
    // shrinks by what that dimension already covers
    #[instrument(skip_all, name = "fastmap", fields(dims = dims), level = "debug")]
    pub fn fastmap<R: Rng + ?Sized>(
        map: &Map,
        expander: &dyn NeighborExpander,
        dims: usize,
        rng: &mut R,
    ) -> Self {
        let components = connected_components(map, expander);
        debug!("{} connected components", components.len());

        let free_cells = map.free_cells();
        let mut coordinates: HashMap<Cell, Vec<f64>> = free_cells
            .iter()
            .map(|cell| (*cell, Vec::with_capacity(dims)))
            .collect();
        let mut residual = EdgeWeights::new();

        for dim in 0..dims {
            for component in &components {
                let projection = project_component(map, expander, component, &residual, rng);
                for (cell, value) in component.iter().zip(projection) {
                    if let Some(vector) = coordinates.get_mut(cell) {
                        vector.push(value);
                    }
                }
            }

            for &u in &free_cells {
                let p_u = coordinates[&u][dim];
                for (v, cost) in expander.expand(map, u) {
                    let p_v = coordinates[&v][dim];
                    let weight = residual.get(&(u, v)).copied().unwrap_or(cost);
                    residual.insert((u, v), (weight - (p_u - p_v).abs()).max(0.0));
                }
            }
            debug!("dimension {dim} done");
        }

        Embedding { dims, coordinates }
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    pub fn coordinates(&self, cell: Cell) -> Option<&[f64]> {
        self.coordinates.get(&cell).map(Vec::as_slice)
    }

    pub fn distance(&self, a: Cell, b: Cell) -> Result<f64, SearchError> {
        let lookup = |cell| {
            self.coordinates(cell)
                .ok_or(SearchError::MissingEmbedding { cell })
        };
        let (va, vb) = (lookup(a)?, lookup(b)?);
        Ok(va.iter().zip(vb).map(|(x, y)| (x - y).abs()).sum())
    }
}

fn project_component<R: Rng + ?Sized>(
    map: &Map,
    expander: &dyn NeighborExpander,
    component: &[Cell],
    residual: &EdgeWeights,
    rng: &mut R,
) -> Vec<f64> {
    if component.len() < 2 {
        return vec![0.0; component.len()];
    }

    let weight = |u: Cell, v: Cell, cost: f64| residual.get(&(u, v)).copied().unwrap_or(cost);

    let seed = component[rng.gen_range(0..component.len())];
    let from_seed = dijkstra(map, expander, seed, weight);
    let pivot_b = farthest(component, &from_seed);
    let from_b = dijkstra(map, expander, pivot_b, weight);
    let pivot_a = farthest(component, &from_b);
    let from_a = dijkstra(map, expander, pivot_a, weight);

    let d_ab = from_a.get(&pivot_b).copied().unwrap_or(0.0);
    if d_ab < PIVOT_EPSILON {
        return vec![0.0; component.len()];
    }

    component
        .iter()
        .map(|cell| {
            let d_av = from_a.get(cell).copied().unwrap_or(0.0);
            let d_vb = from_b.get(cell).copied().unwrap_or(0.0);
            (d_av + d_ab - d_vb) / 2.0
        })
        .collect()
}

fn farthest(component: &[Cell], distance: &HashMap<Cell, f64>) -> Cell {
    let mut best = component[0];
    let mut best_distance = f64::NEG_INFINITY;
    for cell in component {
        if let Some(&d) = distance.get(cell) {
            if d > best_distance {
                best = *cell;
                best_distance = d;
            }
        }
    }
    best
}

fn connected_components(map: &Map, expander: &dyn NeighborExpander) -> Vec<Vec<Cell>> {
    let mut visited = HashSet::new();
    let mut components = Vec::new();

    for start in map.free_cells() {
        if !visited.insert(start) {
            continue;
        }

        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(cell) = queue.pop_front() {
            for (next, _) in expander.expand(map, cell) {
                if visited.insert(next) {
                    component.push(next);
                    queue.push_back(next);
                }
            }
        }

        component.sort();
        components.push(component);
    }

    components
}
