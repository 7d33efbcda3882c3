// Route optimizer: picks a solver by problem size and assembles the route

use crate::algorithms::astar::AStarSolver;
use crate::algorithms::heuristic::HeuristicSolver;
use crate::algorithms::nearest_neighbor::nearest_neighbor;
use crate::algorithms::{RouteSolver, SolverOutcome};
use crate::config::OptimizerConfig;
use crate::error::{Error, Result};
use crate::models::{Coordinate, Degradation, Leg, Route, Stop, Strategy};
use crate::utils::cost_matrix::CostMatrix;
use crate::utils::distance::{Haversine, TravelCost};
use crate::utils::distance_cache::DistanceCache;
use log::{info, warn};
use std::collections::HashSet;
use std::time::Instant;

/// Orders consolidated stops into an open path from the user's origin
///
/// Routes with at most [`OptimizerConfig::effective_exact_threshold`] stops
/// are solved exactly with A*; the order is then optimal for the cost
/// matrix. Larger routes get nearest neighbor plus 2-opt, which is good but
/// carries no optimality guarantee. The route's `strategy` says which
/// regime produced it.
pub struct RouteOptimizer {
    config: OptimizerConfig,
    primary: Box<dyn TravelCost>,
    fallback: Box<dyn TravelCost>,
}

impl Default for RouteOptimizer {
    fn default() -> Self {
        Self::new(OptimizerConfig::default())
    }
}

impl RouteOptimizer {
    /// Optimizer with great-circle costs as both primary and fallback
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            primary: Box::new(Haversine::default()),
            fallback: Box::new(Haversine::default()),
        }
    }

    /// Replaces the primary travel-cost source (e.g. a road router)
    #[must_use]
    pub fn with_provider<P: TravelCost + 'static>(mut self, provider: P) -> Self {
        self.primary = Box::new(provider);
        self
    }

    /// Replaces the estimate used when the primary source is unavailable
    #[must_use]
    pub fn with_fallback<P: TravelCost + 'static>(mut self, fallback: P) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Computes the visiting order for `stops`, starting at `origin`
    ///
    /// Fails with `InvalidInput` for an invalid origin or stop coordinate,
    /// an empty stop set or two stops sharing a store identifier, and with
    /// `UnreachableStop` when some leg cannot be priced at all. A provider
    /// outage or an exhausted time budget still yields a complete route,
    /// tagged with the matching [`Degradation`].
    pub fn optimize(
        &self,
        origin: Coordinate,
        stops: &[Stop],
        cache: Option<&DistanceCache>,
    ) -> Result<Route> {
        let started = Instant::now();
        let deadline = started + self.config.time_budget;

        validate_stops(&origin, stops)?;

        let matrix = CostMatrix::build(
            origin,
            stops,
            self.primary.as_ref(),
            self.fallback.as_ref(),
            cache,
            &self.config,
            deadline,
        )?;

        let mut degradations = Vec::new();
        if matrix.fallback_pairs() > 0 {
            degradations.push(Degradation::UpstreamUnavailable {
                fallback_pairs: matrix.fallback_pairs(),
            });
        }

        let (strategy, outcome) = self.solve(&matrix, deadline);
        if outcome.timed_out {
            warn!(
                "Time budget of {:?} exhausted; returning the best route found",
                self.config.time_budget
            );
            degradations.push(Degradation::OptimizationTimeout);
        }

        let legs = matrix.path_legs(&outcome.order);
        let total: Leg = legs.iter().copied().sum();
        let ordered: Vec<Stop> = outcome
            .order
            .iter()
            .map(|&index| stops[index].clone())
            .collect();

        info!(
            "Routed {} stops with the {:?} strategy: {:.0} m, {:.0} s ({:?})",
            ordered.len(),
            strategy,
            total.distance,
            total.duration,
            started.elapsed()
        );

        Ok(Route {
            stops: ordered,
            legs,
            total,
            strategy,
            degradations,
        })
    }

    /// Runs the solver for the size regime of `matrix`
    ///
    /// An exact search that runs out of time hands over to the heuristic
    /// with whatever budget is left; the outcome is then flagged as timed
    /// out even if 2-opt converges.
    fn solve(&self, matrix: &CostMatrix, deadline: Instant) -> (Strategy, SolverOutcome) {
        let n = matrix.stop_count();
        let heuristic = HeuristicSolver::new(self.config.max_improvement_passes);

        if n == 1 {
            return (Strategy::Trivial, SolverOutcome::new(vec![0], matrix, false));
        }

        if n <= self.config.effective_exact_threshold() {
            if let Some(outcome) = AStarSolver::new().solve(matrix, deadline) {
                return (Strategy::Exact, outcome);
            }
            warn!(
                "Exact search over {} stops did not finish in time; using the heuristic",
                n
            );
            let mut outcome = run_heuristic(&heuristic, matrix, deadline);
            outcome.timed_out = true;
            return (Strategy::Heuristic, outcome);
        }

        (Strategy::Heuristic, run_heuristic(&heuristic, matrix, deadline))
    }
}

fn run_heuristic(solver: &HeuristicSolver, matrix: &CostMatrix, deadline: Instant) -> SolverOutcome {
    // The heuristic always produces an order; greedy is the floor
    solver
        .solve(matrix, deadline)
        .unwrap_or_else(|| SolverOutcome::new(nearest_neighbor(matrix), matrix, true))
}

fn validate_stops(origin: &Coordinate, stops: &[Stop]) -> Result<()> {
    origin.validate()?;

    if stops.is_empty() {
        return Err(Error::invalid_input("no stops to visit"));
    }

    let mut seen = HashSet::with_capacity(stops.len());
    for stop in stops {
        stop.location.validate()?;
        if !seen.insert(stop.store_id.as_str()) {
            return Err(Error::invalid_input(format!(
                "store `{}` appears in more than one stop",
                stop.store_id
            )));
        }
    }
    Ok(())
}
