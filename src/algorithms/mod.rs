pub mod astar;
pub mod heuristic;
pub mod nearest_neighbor;
pub mod optimizer;
pub mod two_opt;

// Common algorithm traits
use crate::utils::cost_matrix::CostMatrix;
use std::time::Instant;

/// A visiting order produced by a solver
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutcome {
    /// Stop indices in visiting order; a permutation of `0..stop_count`
    pub order: Vec<usize>,

    /// Objective cost of the open path from the origin through `order`
    pub cost: f64,

    /// The deadline cut the search short; `order` is the best found so far
    pub timed_out: bool,
}

impl SolverOutcome {
    /// Wraps `order`, pricing it against `matrix`
    pub fn new(order: Vec<usize>, matrix: &CostMatrix, timed_out: bool) -> Self {
        let cost = matrix.path_cost(&order);
        Self {
            order,
            cost,
            timed_out,
        }
    }
}

/// Trait for open-path route solvers over a cost matrix
pub trait RouteSolver {
    /// Orders every stop in `matrix`, starting from the origin node
    ///
    /// Returns `None` when the solver cannot produce a complete order
    /// before `deadline`.
    fn solve(&self, matrix: &CostMatrix, deadline: Instant) -> Option<SolverOutcome>;
}
