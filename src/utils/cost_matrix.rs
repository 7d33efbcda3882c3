// Pairwise travel costs between the origin and every stop

use crate::config::{Objective, OptimizerConfig};
use crate::error::{CostError, Error, Result};
use crate::models::{Coordinate, Leg, Stop};
use crate::utils::distance::TravelCost;
use crate::utils::distance_cache::DistanceCache;
use log::{debug, warn};
use rayon::prelude::*;
use std::iter;
use std::time::Instant;

/// Node index of the origin; stop `i` is node `i + 1`
pub const ORIGIN: usize = 0;

/// Dense, symmetric matrix of legs over the origin and all stops
///
/// Built once per optimization and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    legs: Vec<Leg>,
    objective: Objective,
    fallback_pairs: usize,
}

// How a single pair got its cost
enum Resolved {
    Primary(Leg),
    Cached(Leg),
    Fallback(Leg),
}

impl CostMatrix {
    /// Computes every pairwise leg between `origin` and `stops`
    ///
    /// Each pair is asked of `primary` first. When it reports a transient
    /// failure the `fallback` estimate is used instead. A pair that neither
    /// can price fails the whole build with `UnreachableStop`, naming the
    /// destination stop of the first failing pair (origin row first).
    ///
    /// Once `deadline` has passed, pairs not yet asked of `primary` (and
    /// not cached) go straight to `fallback` and count as fallback pairs.
    ///
    /// From `config.parallel_threshold` nodes upward the pairs are
    /// evaluated on the rayon pool; all results are collected before the
    /// matrix is assembled.
    pub fn build(
        origin: Coordinate,
        stops: &[Stop],
        primary: &dyn TravelCost,
        fallback: &dyn TravelCost,
        cache: Option<&DistanceCache>,
        config: &OptimizerConfig,
        deadline: Instant,
    ) -> Result<Self> {
        let nodes: Vec<Coordinate> = iter::once(origin)
            .chain(stops.iter().map(|stop| stop.location))
            .collect();
        let size = nodes.len();

        let pairs: Vec<(usize, usize)> = (0..size)
            .flat_map(|i| ((i + 1)..size).map(move |j| (i, j)))
            .collect();

        let resolve = |&(i, j): &(usize, usize)| {
            resolve_pair(&nodes[i], &nodes[j], primary, fallback, cache, deadline)
        };

        let resolved: Vec<std::result::Result<Resolved, CostError>> =
            if size >= config.parallel_threshold {
                debug!("Computing {} pairs on the rayon pool", pairs.len());
                pairs.par_iter().map(resolve).collect()
            } else {
                pairs.iter().map(resolve).collect()
            };

        let mut legs = vec![Leg::ZERO; size * size];
        let mut fallback_pairs = 0;
        let mut cache_hits = 0;

        for (&(i, j), outcome) in pairs.iter().zip(resolved) {
            let leg = match outcome {
                Ok(Resolved::Primary(leg)) => leg,
                Ok(Resolved::Cached(leg)) => {
                    cache_hits += 1;
                    leg
                }
                Ok(Resolved::Fallback(leg)) => {
                    fallback_pairs += 1;
                    leg
                }
                Err(source) => {
                    let store_id = stops[j - 1].store_id.clone();
                    warn!("No travel cost for the leg to store {}: {}", store_id, source);
                    return Err(Error::UnreachableStop { store_id, source });
                }
            };
            legs[i * size + j] = leg;
            legs[j * size + i] = leg;
        }

        if fallback_pairs > 0 {
            warn!(
                "{} of {} pairs used the great-circle fallback",
                fallback_pairs,
                pairs.len()
            );
        }
        debug!(
            "Cost matrix ready: {} nodes, {} pairs, {} cache hits",
            size,
            pairs.len(),
            cache_hits
        );

        Ok(Self {
            size,
            legs,
            objective: config.objective,
            fallback_pairs,
        })
    }

    /// Builds a matrix over `stop_count + 1` nodes from a cost function on
    /// node indices
    ///
    /// Only `f(i, j)` with `i < j` is consulted and mirrored. Both leg
    /// components carry the returned value. Intended for synthetic
    /// instances.
    pub fn from_fn<F>(stop_count: usize, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        let size = stop_count + 1;
        let mut legs = vec![Leg::ZERO; size * size];
        for i in 0..size {
            for j in (i + 1)..size {
                let cost = f(i, j);
                let leg = Leg::new(cost, cost);
                legs[i * size + j] = leg;
                legs[j * size + i] = leg;
            }
        }
        Self {
            size,
            legs,
            objective: Objective::Distance,
            fallback_pairs: 0,
        }
    }

    /// Switches which leg component `cost` reports
    #[must_use]
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Number of nodes, origin included
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stop_count(&self) -> usize {
        self.size - 1
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Pairs priced by the fallback instead of the primary provider
    pub fn fallback_pairs(&self) -> usize {
        self.fallback_pairs
    }

    /// Leg between two nodes
    pub fn leg(&self, from: usize, to: usize) -> Leg {
        self.legs[from * self.size + to]
    }

    /// Objective cost between two nodes
    pub fn cost(&self, from: usize, to: usize) -> f64 {
        self.objective.weight(&self.leg(from, to))
    }

    /// Stops `a` and `b` share a spot: no leg between them and the same leg
    /// to every other node, so swapping them never changes a path
    pub fn interchangeable(&self, a: usize, b: usize) -> bool {
        let (a, b) = (a + 1, b + 1);
        self.leg(a, b) == Leg::ZERO && (0..self.size).all(|k| self.leg(a, k) == self.leg(b, k))
    }

    /// Legs of an open path from the origin through `order` (stop indices)
    pub fn path_legs(&self, order: &[usize]) -> Vec<Leg> {
        let mut previous = ORIGIN;
        order
            .iter()
            .map(|&stop| {
                let leg = self.leg(previous, stop + 1);
                previous = stop + 1;
                leg
            })
            .collect()
    }

    /// Objective cost of an open path from the origin through `order`
    pub fn path_cost(&self, order: &[usize]) -> f64 {
        self.path_legs(order)
            .iter()
            .map(|leg| self.objective.weight(leg))
            .sum()
    }
}

fn resolve_pair(
    from: &Coordinate,
    to: &Coordinate,
    primary: &dyn TravelCost,
    fallback: &dyn TravelCost,
    cache: Option<&DistanceCache>,
    deadline: Instant,
) -> std::result::Result<Resolved, CostError> {
    if from == to {
        return Ok(Resolved::Primary(Leg::ZERO));
    }
    if let Some(leg) = cache.and_then(|cache| cache.get(from, to)) {
        return Ok(Resolved::Cached(leg));
    }
    if Instant::now() >= deadline {
        return checked_cost(fallback, from, to).map(Resolved::Fallback);
    }

    match checked_cost(primary, from, to) {
        Ok(leg) => {
            if let Some(cache) = cache {
                cache.insert(from, to, leg);
            }
            Ok(Resolved::Primary(leg))
        }
        Err(err) if err.is_transient() => {
            debug!("Primary provider failed ({}); using fallback estimate", err);
            checked_cost(fallback, from, to).map(Resolved::Fallback)
        }
        Err(err) => Err(err),
    }
}

fn checked_cost(
    provider: &dyn TravelCost,
    from: &Coordinate,
    to: &Coordinate,
) -> std::result::Result<Leg, CostError> {
    let leg = provider.cost(*from, *to)?;
    if leg.is_valid() {
        Ok(leg)
    } else {
        Err(CostError::Unreachable {
            message: format!(
                "provider returned an invalid cost ({} m, {} s)",
                leg.distance, leg.duration
            ),
        })
    }
}
