// Route models for representing an ordered shopping trip

use crate::models::{Distance, Stop, StoreId, Time};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Travel cost of a single hop: meters and seconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Leg {
    pub distance: Distance,
    pub duration: Time,
}

impl Leg {
    pub const ZERO: Leg = Leg {
        distance: 0.0,
        duration: 0.0,
    };

    /// Creates a new leg
    pub fn new(distance: Distance, duration: Time) -> Self {
        Self { distance, duration }
    }

    /// Both components are finite and non-negative
    pub fn is_valid(&self) -> bool {
        self.distance.is_finite()
            && self.duration.is_finite()
            && self.distance >= 0.0
            && self.duration >= 0.0
    }
}

impl Add for Leg {
    type Output = Leg;

    fn add(self, other: Leg) -> Leg {
        Leg::new(self.distance + other.distance, self.duration + other.duration)
    }
}

impl AddAssign for Leg {
    fn add_assign(&mut self, other: Leg) {
        *self = *self + other;
    }
}

impl Sum for Leg {
    fn sum<I: Iterator<Item = Leg>>(iter: I) -> Leg {
        iter.fold(Leg::ZERO, Add::add)
    }
}

/// Which search regime produced a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// A single stop; nothing to order
    Trivial,
    /// A* search; the order is optimal for the cost matrix
    Exact,
    /// Nearest neighbor plus 2-opt; good but not guaranteed optimal
    Heuristic,
}

/// A recoverable problem met while planning; the route is still complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Degradation {
    /// The time budget ran out; the best order found so far was returned
    OptimizationTimeout,
    /// The distance provider failed for some pairs and great-circle
    /// estimates were used for them
    #[serde(rename_all = "camelCase")]
    UpstreamUnavailable { fallback_pairs: usize },
}

/// Stops in visiting order, starting from the (unlisted) origin
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Stops in the order they are visited
    pub stops: Vec<Stop>,

    /// `legs[i]` is the hop that arrives at `stops[i]`
    pub legs: Vec<Leg>,

    /// Sum of all legs
    pub total: Leg,

    pub strategy: Strategy,

    pub degradations: Vec<Degradation>,
}

impl Route {
    /// Total distance in meters
    pub fn total_distance(&self) -> Distance {
        self.total.distance
    }

    /// Total duration in seconds
    pub fn total_duration(&self) -> Time {
        self.total.duration
    }

    /// Store identifiers in visiting order
    pub fn store_ids(&self) -> Vec<&StoreId> {
        self.stops.iter().map(|stop| &stop.store_id).collect()
    }

    /// True when the order may be worse than the regime normally promises
    pub fn is_approximate(&self) -> bool {
        self.strategy == Strategy::Heuristic || !self.degradations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    #[test]
    fn test_leg_sum() {
        let total: Leg = [Leg::new(1.0, 2.0), Leg::new(3.0, 4.0)].into_iter().sum();
        assert_eq!(total, Leg::new(4.0, 6.0));
    }

    #[test]
    fn test_leg_validity() {
        assert!(Leg::ZERO.is_valid());
        assert!(!Leg::new(f64::INFINITY, 1.0).is_valid());
        assert!(!Leg::new(1.0, -1.0).is_valid());
    }

    #[test]
    fn test_degradation_serialization() {
        let json = serde_json::to_string(&Degradation::UpstreamUnavailable { fallback_pairs: 3 })
            .unwrap();
        assert_eq!(json, r#"{"kind":"upstreamUnavailable","fallbackPairs":3}"#);
    }

    #[test]
    fn test_exact_route_is_not_approximate() {
        let route = Route {
            stops: vec![Stop::new("A", Coordinate::new(0.0, 1.0))],
            legs: vec![Leg::new(1.0, 1.0)],
            total: Leg::new(1.0, 1.0),
            strategy: Strategy::Exact,
            degradations: Vec::new(),
        };
        assert!(!route.is_approximate());
        assert_eq!(route.store_ids(), vec!["A"]);

        let timed_out = Route {
            degradations: vec![Degradation::OptimizationTimeout],
            ..route
        };
        assert!(timed_out.is_approximate());
    }
}
