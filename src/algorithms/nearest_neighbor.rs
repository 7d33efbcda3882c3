// Greedy construction: always drive to the closest unvisited stop

use crate::utils::cost_matrix::{CostMatrix, ORIGIN};

/// Builds a visiting order by repeatedly moving to the cheapest unvisited
/// stop, starting at the origin
///
/// Ties go to the lowest stop index, so the order is deterministic.
pub fn nearest_neighbor(matrix: &CostMatrix) -> Vec<usize> {
    let n = matrix.stop_count();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = ORIGIN;

    while order.len() < n {
        let mut best: Option<(usize, f64)> = None;

        for stop in 0..n {
            if visited[stop] {
                continue;
            }
            let cost = matrix.cost(current, stop + 1);
            // Strict comparison keeps the earliest stop on ties
            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((stop, cost));
            }
        }

        let Some((stop, _)) = best else {
            break;
        };
        visited[stop] = true;
        order.push(stop);
        current = stop + 1;
    }

    order
}
