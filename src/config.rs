// Tuning knobs for the route optimizer

use crate::models::Leg;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Largest stop count the exact search accepts; visited sets are `u32` bit masks
pub const MAX_EXACT_STOPS: usize = 20;

/// Default stop count up to which routes are solved exactly
pub const DEFAULT_EXACT_THRESHOLD: usize = 10;

/// Default number of full 2-opt sweeps
pub const DEFAULT_IMPROVEMENT_PASSES: usize = 50;

/// Default wall-clock budget for one optimization
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(2);

/// Default node count from which the cost matrix is filled in parallel
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

/// Which leg component the optimizer minimizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    Distance,
    Duration,
}

impl Objective {
    /// The scalar cost of `leg` under this objective
    pub fn weight(self, leg: &Leg) -> f64 {
        match self {
            Self::Distance => leg.distance,
            Self::Duration => leg.duration,
        }
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "distance" => Ok(Self::Distance),
            "duration" => Ok(Self::Duration),
            other => Err(format!(
                "unknown objective `{other}`, expected `distance` or `duration`"
            )),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Distance => f.write_str("distance"),
            Self::Duration => f.write_str("duration"),
        }
    }
}

/// Configuration for [`RouteOptimizer`](crate::RouteOptimizer)
///
/// Missing fields take their defaults when deserialized, so a config file
/// only needs to name what it changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Routes with at most this many stops are solved exactly with A*
    pub exact_threshold: usize,

    /// Upper bound on 2-opt sweeps in the heuristic regime
    pub max_improvement_passes: usize,

    /// Wall-clock budget for one `optimize` call, cost matrix included;
    /// pairs still unpriced when it runs out use the fallback estimate
    pub time_budget: Duration,

    pub objective: Objective,

    /// Node count (origin included) from which pairwise costs are
    /// computed on the rayon pool
    pub parallel_threshold: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            exact_threshold: DEFAULT_EXACT_THRESHOLD,
            max_improvement_passes: DEFAULT_IMPROVEMENT_PASSES,
            time_budget: DEFAULT_TIME_BUDGET,
            objective: Objective::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl OptimizerConfig {
    /// Set the exact-search threshold
    #[must_use]
    pub fn with_exact_threshold(mut self, threshold: usize) -> Self {
        self.exact_threshold = threshold;
        self
    }

    /// Set the 2-opt pass budget
    #[must_use]
    pub fn with_max_improvement_passes(mut self, passes: usize) -> Self {
        self.max_improvement_passes = passes;
        self
    }

    /// Set the wall-clock budget
    #[must_use]
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    /// Set the optimization objective
    #[must_use]
    pub fn with_objective(mut self, objective: Objective) -> Self {
        self.objective = objective;
        self
    }

    /// Set the parallel fan-out threshold
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// The threshold actually applied, capped at [`MAX_EXACT_STOPS`]
    pub fn effective_exact_threshold(&self) -> usize {
        self.exact_threshold.min(MAX_EXACT_STOPS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = OptimizerConfig::default();
        assert_eq!(config.exact_threshold, 10);
        assert_eq!(config.objective, Objective::Distance);
        assert_eq!(config.time_budget, Duration::from_secs(2));
    }

    #[test]
    fn test_threshold_is_capped() {
        let config = OptimizerConfig::default().with_exact_threshold(64);
        assert_eq!(config.effective_exact_threshold(), MAX_EXACT_STOPS);
    }

    #[test]
    fn test_partial_config_file() {
        let config: OptimizerConfig =
            serde_json::from_str(r#"{ "exact_threshold": 6, "objective": "duration" }"#).unwrap();
        assert_eq!(config.exact_threshold, 6);
        assert_eq!(config.objective, Objective::Duration);
        assert_eq!(config.max_improvement_passes, DEFAULT_IMPROVEMENT_PASSES);
    }

    #[rstest]
    #[case("distance", Objective::Distance)]
    #[case("Duration", Objective::Duration)]
    fn test_objective_from_str(#[case] input: &str, #[case] expected: Objective) {
        assert_eq!(input.parse::<Objective>(), Ok(expected));
    }

    #[test]
    fn test_objective_weight() {
        let leg = Leg::new(1200.0, 90.0);
        assert_eq!(Objective::Distance.weight(&leg), 1200.0);
        assert_eq!(Objective::Duration.weight(&leg), 90.0);
        assert!("speed".parse::<Objective>().is_err());
    }
}
