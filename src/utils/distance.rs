// Travel cost estimation between coordinates

use crate::error::CostError;
use crate::models::{Coordinate, Leg};

/// Default assumed travel speed for great-circle estimates, km/h
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Source of travel cost between two coordinates
///
/// The optimizer only needs a cost per pair; the formula behind it is
/// up to the implementation. Implementations must return `Leg::ZERO` for
/// identical coordinates and must be deterministic within a process.
/// `Sync` is required because pairs may be evaluated on the rayon pool.
pub trait TravelCost: Sync {
    /// Travel cost from `from` to `to`
    fn cost(&self, from: Coordinate, to: Coordinate) -> Result<Leg, CostError>;
}

impl<F> TravelCost for F
where
    F: Fn(Coordinate, Coordinate) -> Result<Leg, CostError> + Sync,
{
    fn cost(&self, from: Coordinate, to: Coordinate) -> Result<Leg, CostError> {
        self(from, to)
    }
}

/// Great-circle distance with a constant assumed speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Haversine {
    speed_kmh: f64,
}

impl Haversine {
    /// Creates an estimator travelling at `speed_kmh`; non-positive or
    /// non-finite speeds fall back to [`DEFAULT_SPEED_KMH`]
    pub fn new(speed_kmh: f64) -> Self {
        let speed_kmh = if speed_kmh.is_finite() && speed_kmh > 0.0 {
            speed_kmh
        } else {
            DEFAULT_SPEED_KMH
        };
        Self { speed_kmh }
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// Estimated leg between two coordinates
    pub fn leg(&self, from: &Coordinate, to: &Coordinate) -> Leg {
        let distance = haversine_distance(from, to);
        let meters_per_second = self.speed_kmh / 3.6;
        Leg::new(distance, distance / meters_per_second)
    }
}

impl Default for Haversine {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED_KMH)
    }
}

impl TravelCost for Haversine {
    fn cost(&self, from: Coordinate, to: Coordinate) -> Result<Leg, CostError> {
        let leg = self.leg(&from, &to);
        if leg.is_valid() {
            Ok(leg)
        } else {
            Err(CostError::Unreachable {
                message: format!(
                    "no great-circle estimate between ({}, {}) and ({}, {})",
                    from.lat, from.lng, to.lat, to.lng
                ),
            })
        }
    }
}

/// Calculate the great-circle distance between two points, in meters
pub fn haversine_distance(p1: &Coordinate, p2: &Coordinate) -> f64 {
    p1.haversine_distance_to(p2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_leg() {
        let estimator = Haversine::new(36.0); // 10 m/s
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 1.0);

        let leg = estimator.cost(a, b).unwrap();
        assert!((leg.distance - 111_195.0).abs() < 100.0);
        assert!((leg.duration - leg.distance / 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_pair_costs_nothing() {
        let a = Coordinate::new(45.0, 7.0);
        assert_eq!(Haversine::default().cost(a, a), Ok(Leg::ZERO));
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinate::new(30.2672, -97.7431);
        let b = Coordinate::new(29.7604, -95.3698);
        let estimator = Haversine::default();
        assert_eq!(estimator.cost(a, b), estimator.cost(b, a));
    }

    #[test]
    fn test_invalid_speed_uses_default() {
        assert_eq!(Haversine::new(0.0).speed_kmh(), DEFAULT_SPEED_KMH);
        assert_eq!(Haversine::new(f64::NAN).speed_kmh(), DEFAULT_SPEED_KMH);
    }

    #[test]
    fn test_closure_provider() {
        let manhattan = |a: Coordinate, b: Coordinate| {
            let d = (a.lat - b.lat).abs() + (a.lng - b.lng).abs();
            Ok::<_, CostError>(Leg::new(d, d))
        };
        let leg = manhattan
            .cost(Coordinate::new(0.0, 0.0), Coordinate::new(3.0, 4.0))
            .unwrap();
        assert_eq!(leg.distance, 7.0);
    }
}
