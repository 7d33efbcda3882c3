// Models module - exports all model types

mod location;
mod product;
mod route;
mod store;

// Re-export model types
pub use self::location::Coordinate;
pub use self::product::{PurchaseItem, StoreLocation};
pub use self::route::{Degradation, Leg, Route, Strategy};
pub use self::store::Stop;

// Common type aliases for improved code readability
pub type StoreId = String;
pub type Price = f64;
/// Meters
pub type Distance = f64;
/// Seconds
pub type Time = f64;
