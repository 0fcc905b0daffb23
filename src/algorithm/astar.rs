use super::{construct_path, OpenNode, Trace};
use crate::common::{Cell, Path};
use crate::error::SearchError;
use crate::expander::NeighborExpander;
use crate::heuristic::Heuristic;
use crate::map::Map;
use crate::stat::Stats;

use ordered_float::OrderedFloat;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, instrument, trace};

// Superseded open entries are skipped once their cell is closed
#[instrument(skip_all, name = "a_star", fields(start = %start, goal = %goal, heuristic = %heuristic.kind()), level = "debug")]
pub(crate) fn a_star_search(
    map: &Map,
    expander: &dyn NeighborExpander,
    heuristic: &Heuristic,
    start: Cell,
    goal: Cell,
    expansion_limit: Option<usize>,
    stats: &mut Stats,
) -> Result<Path, SearchError> {
    map.check_traversable(start)?;
    map.check_traversable(goal)?;

    let search_start_time = Instant::now();
    let result = search(map, expander, heuristic, start, goal, expansion_limit, stats);
    stats.time_us += search_start_time.elapsed().as_micros();
    result
}

fn search(
    map: &Map,
    expander: &dyn NeighborExpander,
    heuristic: &Heuristic,
    start: Cell,
    goal: Cell,
    expansion_limit: Option<usize>,
    stats: &mut Stats,
) -> Result<Path, SearchError> {
    let mut open_list = BTreeSet::new();
    let mut closed_list = HashSet::new();
    let mut g_cost: HashMap<Cell, f64> = HashMap::new();
    let mut trace = Trace::new();
    let mut sequence = 0;
    let mut expanded = 0;

    g_cost.insert(start, 0.0);
    open_list.insert(OpenNode {
        position: start,
        f_cost: OrderedFloat(heuristic.estimate(start, goal)?),
        g_cost: OrderedFloat(0.0),
        sequence,
    });

    while let Some(current) = open_list.pop_first() {
        // Stale duplicate of a cell we already finalized.
        if closed_list.contains(&current.position) {
            continue;
        }

        if current.position == goal {
            debug!(
                "reached goal with cost {} after {expanded} expansions",
                current.g_cost
            );
            return Ok(construct_path(&trace, goal));
        }

        if let Some(limit) = expansion_limit {
            if expanded >= limit {
                debug!("expansion limit {limit} reached");
                return Err(SearchError::ExpansionLimit { limit });
            }
        }

        trace!("expand node: {current:?}");
        closed_list.insert(current.position);
        expanded += 1;
        stats.expanded_nodes += 1;

        for (neighbor, step_cost) in expander.expand(map, current.position) {
            if closed_list.contains(&neighbor) {
                continue;
            }

            let tentative_g_cost = current.g_cost.0 + step_cost;
            if g_cost
                .get(&neighbor)
                .map_or(true, |&known| tentative_g_cost < known)
            {
                let h_cost = heuristic.estimate(neighbor, goal)?;
                g_cost.insert(neighbor, tentative_g_cost);
                trace.insert(neighbor, current.position);
                sequence += 1;
                open_list.insert(OpenNode {
                    position: neighbor,
                    f_cost: OrderedFloat(tentative_g_cost + h_cost),
                    g_cost: OrderedFloat(tentative_g_cost),
                    sequence,
                });
                stats.generated_nodes += 1;
            }
        }
    }

    debug!("cannot find solution");
    Ok(Path::empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::dijkstra;
    use crate::expander::{EightConnected, FourConnected};
    use crate::heuristic::Embedding;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::SQRT_2;

    // Helper function to setup tracing
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    }

    fn search_octile(map: &Map, start: Cell, goal: Cell) -> Result<Path, SearchError> {
        a_star_search(
            map,
            &EightConnected,
            &Heuristic::Octile,
            start,
            goal,
            None,
            &mut Stats::default(),
        )
    }

    // Every diagonal shortcut on this map is blocked by a flank, so the only
    // route snakes through the free cells with axis moves.
    #[test]
    fn test_a_star_test_map() {
        init_tracing();
        let map = Map::from_file("map_file/test/test.map").unwrap();
        let start = Cell::new(0, 0);
        let goal = Cell::new(4, 4);

        let path = search_octile(&map, start, goal).unwrap();
        debug!("{path:?}");

        let expected: Vec<Cell> = [
            (0, 0),
            (0, 1),
            (0, 2),
            (0, 3),
            (1, 3),
            (2, 3),
            (2, 2),
            (2, 1),
            (2, 0),
            (3, 0),
            (4, 0),
            (4, 1),
            (4, 2),
            (4, 3),
            (4, 4),
        ]
        .into_iter()
        .map(Cell::from)
        .collect();
        assert_eq!(path.steps, expected);
        assert!((path.cost() - 14.0).abs() < 1e-9);
        assert!(path.verify(&map, start, goal));
    }

    #[test]
    fn test_a_star_open_grid_uses_diagonals() {
        let map = Map::new(5, 5, []).unwrap();
        let path = search_octile(&map, Cell::new(0, 0), Cell::new(4, 4)).unwrap();
        assert_eq!(path.len(), 5);
        assert!((path.cost() - 4.0 * SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_a_star_start_equals_goal() {
        let map = Map::from_file("map_file/test/test.map").unwrap();
        for cell in map.free_cells() {
            let path = search_octile(&map, cell, cell).unwrap();
            assert_eq!(path.steps, vec![cell]);
            assert_eq!(path.cost(), 0.0);
        }
    }

    #[test]
    fn test_a_star_rejects_obstacle_endpoints() {
        let map = Map::from_file("map_file/test/test.map").unwrap();
        let blocked = Cell::new(1, 0);
        let mut stats = Stats::default();

        let result = a_star_search(
            &map,
            &EightConnected,
            &Heuristic::Octile,
            blocked,
            Cell::new(4, 4),
            None,
            &mut stats,
        );
        assert_eq!(result, Err(SearchError::Obstacle { cell: blocked }));
        assert_eq!(stats.expanded_nodes, 0);

        assert_eq!(
            search_octile(&map, Cell::new(0, 0), blocked),
            Err(SearchError::Obstacle { cell: blocked })
        );
        assert_eq!(
            search_octile(&map, Cell::new(0, 0), Cell::new(5, 0)),
            Err(SearchError::OutOfBounds {
                cell: Cell::new(5, 0)
            })
        );
    }

    #[test]
    fn test_a_star_unreachable_goal() {
        let wall = [Cell::new(0, 1), Cell::new(1, 1), Cell::new(2, 1)];
        let map = Map::new(3, 3, wall).unwrap();
        let path = search_octile(&map, Cell::new(0, 0), Cell::new(2, 2)).unwrap();
        assert!(path.is_empty());
        assert!(!path.is_found());
    }

    #[test]
    fn test_a_star_no_corner_cutting_through_diagonal_gap() {
        // The goal is only diagonally adjacent through two blocked flanks.
        let map = Map::new(2, 2, [Cell::new(0, 1), Cell::new(1, 0)]).unwrap();
        let path = search_octile(&map, Cell::new(0, 0), Cell::new(1, 1)).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_a_star_matches_dijkstra() {
        init_tracing();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = Map::random(12, 12, 40, &[], &mut rng).unwrap();
            let free = map.free_cells();

            for _ in 0..10 {
                let start = free[rng.gen_range(0..free.len())];
                let goal = free[rng.gen_range(0..free.len())];
                let reference = dijkstra(&map, &EightConnected, start, |_, _, cost| cost);
                let path = search_octile(&map, start, goal).unwrap();

                match reference.get(&goal) {
                    Some(&optimal) => {
                        assert!(path.verify(&map, start, goal), "seed {seed}: {path:?}");
                        assert!(
                            (path.cost() - optimal).abs() < 1e-6,
                            "seed {seed}: {} vs {optimal}",
                            path.cost()
                        );
                    }
                    None => assert!(path.is_empty()),
                }
            }
        }
    }

    #[test]
    fn test_a_star_manhattan_four_connected_matches_dijkstra() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = Map::random(10, 10, 25, &[], &mut rng).unwrap();
            let free = map.free_cells();
            let start = free[0];
            let reference = dijkstra(&map, &FourConnected, start, |_, _, cost| cost);

            for &goal in free.iter().step_by(7) {
                let path = a_star_search(
                    &map,
                    &FourConnected,
                    &Heuristic::Manhattan,
                    start,
                    goal,
                    None,
                    &mut Stats::default(),
                )
                .unwrap();
                match reference.get(&goal) {
                    Some(&optimal) => assert_eq!(path.cost(), optimal),
                    None => assert!(path.is_empty()),
                }
            }
        }
    }

    #[test]
    fn test_a_star_idempotent() {
        let mut rng = StdRng::seed_from_u64(42);
        let map = Map::random(15, 15, 50, &[Cell::new(0, 0), Cell::new(14, 14)], &mut rng).unwrap();
        let first = search_octile(&map, Cell::new(0, 0), Cell::new(14, 14)).unwrap();
        let second = search_octile(&map, Cell::new(0, 0), Cell::new(14, 14)).unwrap();
        assert_eq!(first.cost(), second.cost());
        // The tie-break is deterministic, so the paths agree as well.
        assert_eq!(first, second);
    }

    #[test]
    fn test_a_star_embedding_heuristic_returns_valid_path() {
        let map = Map::from_file("map_file/test/test.map").unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let heuristic = Heuristic::Embedding(Embedding::fastmap(&map, &EightConnected, 3, &mut rng));
        let start = Cell::new(0, 0);
        let goal = Cell::new(4, 4);

        let path = a_star_search(
            &map,
            &EightConnected,
            &heuristic,
            start,
            goal,
            None,
            &mut Stats::default(),
        )
        .unwrap();
        let optimal = dijkstra(&map, &EightConnected, start, |_, _, cost| cost)[&goal];

        assert!(path.verify(&map, start, goal));
        assert!(path.cost() >= optimal - 1e-9);
    }

    #[test]
    fn test_a_star_missing_embedding_fails_query_only() {
        let sparse = Map::new(1, 3, [Cell::new(0, 1)]).unwrap();
        let heuristic = Heuristic::Embedding(Embedding::grid_coordinates(&sparse));
        let map = Map::new(1, 3, []).unwrap();
        let mut stats = Stats::default();

        let result = a_star_search(
            &map,
            &EightConnected,
            &heuristic,
            Cell::new(0, 0),
            Cell::new(0, 2),
            None,
            &mut stats,
        );
        assert_eq!(
            result,
            Err(SearchError::MissingEmbedding {
                cell: Cell::new(0, 1)
            })
        );

        let path = search_octile(&map, Cell::new(0, 0), Cell::new(0, 2)).unwrap();
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_a_star_expansion_limit() {
        let map = Map::new(20, 20, []).unwrap();
        let mut stats = Stats::default();
        let result = a_star_search(
            &map,
            &EightConnected,
            &Heuristic::Octile,
            Cell::new(0, 0),
            Cell::new(19, 19),
            Some(3),
            &mut stats,
        );
        assert_eq!(result, Err(SearchError::ExpansionLimit { limit: 3 }));
        assert_eq!(stats.expanded_nodes, 3);
    }

    #[test]
    fn test_a_star_stats() {
        let map = Map::new(1, 5, []).unwrap();
        let mut stats = Stats::default();
        let path = a_star_search(
            &map,
            &EightConnected,
            &Heuristic::Octile,
            Cell::new(0, 0),
            Cell::new(0, 4),
            None,
            &mut stats,
        )
        .unwrap();
        assert_eq!(path.len(), 5);
        // Every cell before the goal is expanded exactly once on a corridor.
        assert_eq!(stats.expanded_nodes, 4);
        assert_eq!(stats.generated_nodes, 4);
    }
}
