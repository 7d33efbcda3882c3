// 2-opt local search on an open path anchored at the origin

use crate::utils::cost_matrix::{CostMatrix, ORIGIN};
use log::debug;
use std::time::Instant;

/// Smallest cost decrease accepted as an improvement
pub const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Result of [`two_opt_improve`]
#[derive(Debug, Clone, PartialEq)]
pub struct TwoOptOutcome {
    pub order: Vec<usize>,

    /// Sweeps performed, the final non-improving one included
    pub passes: usize,

    /// A full sweep found nothing to improve
    pub converged: bool,

    /// The deadline stopped the search before it converged
    pub timed_out: bool,
}

/// Cost change from reversing `order[i..=j]`
///
/// The path starts at the origin and has no return leg: a segment that runs
/// to the end of the path only changes the edge into it. Costs are
/// symmetric, so the edges inside the segment keep their total.
pub fn open_path_delta(matrix: &CostMatrix, order: &[usize], i: usize, j: usize) -> f64 {
    let prev = if i == 0 { ORIGIN } else { order[i - 1] + 1 };
    let first = order[i] + 1;
    let last = order[j] + 1;

    let mut old = matrix.cost(prev, first);
    let mut new = matrix.cost(prev, last);
    if let Some(&next) = order.get(j + 1) {
        old += matrix.cost(last, next + 1);
        new += matrix.cost(first, next + 1);
    }
    new - old
}

/// Improves `order` by segment reversals until no reversal helps, the pass
/// budget is spent, or `deadline` passes
///
/// Each sweep applies every improving reversal as soon as it is found.
/// The cost never increases.
pub fn two_opt_improve(
    mut order: Vec<usize>,
    matrix: &CostMatrix,
    max_passes: usize,
    deadline: Instant,
) -> TwoOptOutcome {
    let n = order.len();
    let mut passes = 0;
    let mut converged = n < 2;
    let mut timed_out = false;

    'sweeps: while !converged && passes < max_passes {
        if Instant::now() >= deadline {
            timed_out = true;
            break;
        }
        passes += 1;
        let mut improved = false;

        for i in 0..n - 1 {
            if Instant::now() >= deadline {
                timed_out = true;
                break 'sweeps;
            }
            for j in (i + 1)..n {
                if open_path_delta(matrix, &order, i, j) < -IMPROVEMENT_EPSILON {
                    order[i..=j].reverse();
                    improved = true;
                }
            }
        }

        converged = !improved;
    }

    debug!(
        "2-opt finished after {} passes (converged: {}, timed out: {})",
        passes, converged, timed_out
    );

    TwoOptOutcome {
        order,
        passes,
        converged,
        timed_out,
    }
}
