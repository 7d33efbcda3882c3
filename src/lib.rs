// Public modules
pub mod algorithms;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

// Re-exports for convenience
pub use algorithms::optimizer::RouteOptimizer;
pub use api::{assemble, plan_route, RouteRequest, RouteResponse, RouteStop};
pub use config::{Objective, OptimizerConfig};
pub use error::{CostError, Error, Result};
pub use models::{Coordinate, Degradation, Leg, PurchaseItem, Route, Stop, Strategy};
pub use utils::consolidate::consolidate;
pub use utils::distance::{Haversine, TravelCost};
pub use utils::distance_cache::DistanceCache;
