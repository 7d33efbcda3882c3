// Utility modules: travel costs, caching and stop consolidation

pub mod consolidate;
pub mod cost_matrix;
pub mod distance;
pub mod distance_cache;
#[cfg(feature = "osrm")]
pub mod osrm;
