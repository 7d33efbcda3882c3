// Heuristic solver for routes too large for exact search

use crate::algorithms::nearest_neighbor::nearest_neighbor;
use crate::algorithms::two_opt::two_opt_improve;
use crate::algorithms::{RouteSolver, SolverOutcome};
use crate::config::DEFAULT_IMPROVEMENT_PASSES;
use crate::utils::cost_matrix::CostMatrix;
use log::debug;
use std::time::Instant;

/// Nearest-neighbor construction refined by 2-opt
///
/// Always returns an order. When the deadline interrupts 2-opt, the
/// outcome carries the best order reached and `timed_out` is set.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicSolver {
    pub max_passes: usize,
}

impl Default for HeuristicSolver {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_IMPROVEMENT_PASSES,
        }
    }
}

impl HeuristicSolver {
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }
}

impl RouteSolver for HeuristicSolver {
    fn solve(&self, matrix: &CostMatrix, deadline: Instant) -> Option<SolverOutcome> {
        let initial = nearest_neighbor(matrix);
        let initial_cost = matrix.path_cost(&initial);

        let mut improved = two_opt_improve(initial, matrix, self.max_passes, deadline);
        order_interchangeable_stops(&mut improved.order, matrix);
        let outcome = SolverOutcome::new(improved.order, matrix, improved.timed_out);

        debug!(
            "Heuristic route over {} stops: greedy {:.1}, after 2-opt {:.1}",
            matrix.stop_count(),
            initial_cost,
            outcome.cost
        );
        Some(outcome)
    }
}

/// Puts interchangeable stops back in input order
///
/// A 2-opt reversal flips every stop in the segment, co-located ones
/// included. Each group of interchangeable stops keeps the positions it
/// holds in `order` but fills them in ascending index order. The path cost
/// is unchanged.
pub fn order_interchangeable_stops(order: &mut [usize], matrix: &CostMatrix) {
    let mut representatives: Vec<usize> = Vec::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (position, &stop) in order.iter().enumerate() {
        match representatives
            .iter()
            .position(|&rep| matrix.interchangeable(rep, stop))
        {
            Some(group) => groups[group].push(position),
            None => {
                representatives.push(stop);
                groups.push(vec![position]);
            }
        }
    }

    for positions in groups.iter().filter(|positions| positions.len() > 1) {
        let mut members: Vec<usize> = positions.iter().map(|&position| order[position]).collect();
        members.sort_unstable();
        for (&position, member) in positions.iter().zip(members) {
            order[position] = member;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;
    use std::time::Duration;

    fn random_matrix(stop_count: usize, seed: u64) -> CostMatrix {
        let mut rng = StdRng::seed_from_u64(seed);
        let points: Vec<(f64, f64)> = (0..=stop_count)
            .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect();
        CostMatrix::from_fn(stop_count, |i, j| {
            let (a, b) = (points[i], points[j]);
            ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
        })
    }

    #[rstest]
    #[case(11, 1)]
    #[case(25, 2)]
    #[case(60, 3)]
    fn test_never_worse_than_greedy(#[case] stop_count: usize, #[case] seed: u64) {
        let matrix = random_matrix(stop_count, seed);
        let greedy = matrix.path_cost(&nearest_neighbor(&matrix));

        let deadline = Instant::now() + Duration::from_secs(60);
        let outcome = HeuristicSolver::default().solve(&matrix, deadline).unwrap();

        assert!(outcome.cost <= greedy + 1e-9);
        assert!(!outcome.timed_out);
        let mut sorted = outcome.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..stop_count).collect::<Vec<_>>());
    }

    #[test]
    fn test_expired_deadline_returns_greedy_order() {
        let matrix = random_matrix(20, 9);
        let outcome = HeuristicSolver::default()
            .solve(&matrix, Instant::now())
            .unwrap();

        assert!(outcome.timed_out);
        assert_eq!(outcome.order, nearest_neighbor(&matrix));
    }

    #[test]
    fn test_interchangeable_stops_follow_input_order() {
        // origin 0; stops 1 and 3 share a spot, as do 2 and 4
        let positions = [0.0, 5.0, 1.0, 4.0, 1.0, 4.0];
        let matrix = CostMatrix::from_fn(5, |i, j| f64::abs(positions[i] - positions[j]));
        let mut order = vec![3, 1, 4, 2, 0];
        let before = matrix.path_cost(&order);

        order_interchangeable_stops(&mut order, &matrix);

        assert_eq!(order, vec![1, 3, 2, 4, 0]);
        assert_eq!(matrix.path_cost(&order), before);
    }

    #[test]
    fn test_colocated_stops_survive_two_opt_in_input_order() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut points: Vec<(f64, f64)> = (0..=16)
            .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect();
        // Duplicate a few spots further down the input
        for (copy, of) in [(9, 2), (12, 5), (15, 2), (16, 7)] {
            points[copy] = points[of];
        }
        let matrix = CostMatrix::from_fn(16, |i, j| {
            let (a, b) = (points[i], points[j]);
            ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
        });

        let deadline = Instant::now() + Duration::from_secs(60);
        let outcome = HeuristicSolver::default().solve(&matrix, deadline).unwrap();

        // Node k is stop k - 1
        let position = |stop: usize| outcome.order.iter().position(|&s| s == stop).unwrap();
        assert!(position(1) < position(8));
        assert!(position(8) < position(14));
        assert!(position(4) < position(11));
        assert!(position(6) < position(15));
    }

    #[test]
    fn test_zero_passes_is_plain_greedy() {
        let matrix = random_matrix(15, 4);
        let deadline = Instant::now() + Duration::from_secs(60);
        let outcome = HeuristicSolver::new(0).solve(&matrix, deadline).unwrap();
        assert_eq!(outcome.order, nearest_neighbor(&matrix));
    }
}
