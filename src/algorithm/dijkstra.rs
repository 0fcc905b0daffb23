use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::common::Cell;
use crate::expander::NeighborExpander;
use crate::map::Map;

// `edge_cost` maps each expander move cost to the weight actually used
pub fn dijkstra<F>(
    map: &Map,
    expander: &dyn NeighborExpander,
    source: Cell,
    mut edge_cost: F,
) -> HashMap<Cell, f64>
where
    F: FnMut(Cell, Cell, f64) -> f64,
{
    let mut distance = HashMap::new();
    if !map.is_traversable(source) {
        return distance;
    }

    let mut heap = BinaryHeap::new();
    distance.insert(source, 0.0);
    heap.push((Reverse(OrderedFloat(0.0)), source));

    while let Some((Reverse(OrderedFloat(cost)), cell)) = heap.pop() {
        if cost > distance[&cell] {
            continue;
        }

        for (next, step) in expander.expand(map, cell) {
            let next_cost = cost + edge_cost(cell, next, step);
            if distance.get(&next).map_or(true, |&known| next_cost < known) {
                distance.insert(next, next_cost);
                heap.push((Reverse(OrderedFloat(next_cost)), next));
            }
        }
    }

    distance
}
