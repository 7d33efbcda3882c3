// Request and response types exchanged with the shopping client
//
// The client posts the user's location and picked items and gets back the
// stores in visiting order, which it passes to its directions renderer as
// fixed waypoints. Field names are camelCase on the wire.

use crate::algorithms::optimizer::RouteOptimizer;
use crate::error::{Error, Result};
use crate::models::{Coordinate, Degradation, Leg, PurchaseItem, Route, StoreId, Strategy};
use crate::utils::consolidate::consolidate;
use crate::utils::distance_cache::DistanceCache;
use serde::{Deserialize, Serialize};

/// Inbound route request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub user_location: Option<Coordinate>,

    #[serde(default)]
    pub products: Vec<PurchaseItem>,
}

impl RouteRequest {
    pub fn new(user_location: Coordinate, products: Vec<PurchaseItem>) -> Self {
        Self {
            user_location: Some(user_location),
            products,
        }
    }
}

/// One store in the optimized route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    /// Store identifier
    pub name: StoreId,
    pub lat: f64,
    pub lng: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Names of the products to pick up here
    pub products: Vec<String>,

    pub items: Vec<PurchaseItem>,

    /// The hop arriving at this store
    pub leg: Leg,
}

/// Outbound route response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub optimized_route: Vec<RouteStop>,

    /// Meters
    pub total_distance: f64,

    /// Seconds
    pub total_duration: f64,

    pub strategy: Strategy,

    #[serde(default)]
    pub degradations: Vec<Degradation>,
}

/// Projects a route onto the response shape
pub fn assemble(route: &Route) -> RouteResponse {
    let optimized_route = route
        .stops
        .iter()
        .zip(&route.legs)
        .map(|(stop, leg)| RouteStop {
            name: stop.store_id.clone(),
            lat: stop.location.lat,
            lng: stop.location.lng,
            address: stop.address.clone(),
            products: stop.product_names(),
            items: stop.items.clone(),
            leg: *leg,
        })
        .collect();

    RouteResponse {
        optimized_route,
        total_distance: route.total_distance(),
        total_duration: route.total_duration(),
        strategy: route.strategy,
        degradations: route.degradations.clone(),
    }
}

/// Consolidates, optimizes and assembles a request in one call
pub fn plan_route(
    request: &RouteRequest,
    optimizer: &RouteOptimizer,
    cache: Option<&DistanceCache>,
) -> Result<RouteResponse> {
    let origin = request
        .user_location
        .ok_or_else(|| Error::invalid_input("request has no user location"))?;
    let stops = consolidate(&request.products)?;
    let route = optimizer.optimize(origin, &stops, cache)?;
    Ok(assemble(&route))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptimizerConfig;
    use crate::models::Stop;
    use serde_json::json;

    fn sample_request() -> RouteRequest {
        serde_json::from_value(json!({
            "userLocation": { "lat": 30.2672, "lng": -97.7431 },
            "products": [
                {
                    "name": "Milk",
                    "price": 3.49,
                    "store": "HEB Mueller",
                    "location": { "lat": 30.2985, "lng": -97.7055, "address": "1801 E 51st St" }
                },
                {
                    "name": "Bread",
                    "price": 2.5,
                    "store": "Whole Foods Lamar",
                    "location": { "lat": 30.2707, "lng": -97.7535 }
                },
                {
                    "name": "Eggs",
                    "price": 4.0,
                    "store": "HEB Mueller",
                    "location": { "lat": 30.2985, "lng": -97.7055 }
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_request_parses_client_json() {
        let request = sample_request();
        assert_eq!(
            request.user_location,
            Some(Coordinate::new(30.2672, -97.7431))
        );
        assert_eq!(request.products.len(), 3);
        assert_eq!(
            request.products[0].location.address.as_deref(),
            Some("1801 E 51st St")
        );
        assert_eq!(request.products[1].location.address, None);
    }

    #[test]
    fn test_plan_route_groups_and_orders() {
        let response = plan_route(&sample_request(), &RouteOptimizer::default(), None).unwrap();

        let names: Vec<&str> = response
            .optimized_route
            .iter()
            .map(|stop| stop.name.as_str())
            .collect();
        // Whole Foods is about 1 km from the user, HEB about 5 km
        assert_eq!(names, vec!["Whole Foods Lamar", "HEB Mueller"]);
        assert_eq!(response.optimized_route[1].products, vec!["Milk", "Eggs"]);
        assert_eq!(
            response.optimized_route[1].address.as_deref(),
            Some("1801 E 51st St")
        );
        assert_eq!(response.strategy, Strategy::Exact);

        let leg_sum: f64 = response
            .optimized_route
            .iter()
            .map(|stop| stop.leg.distance)
            .sum();
        assert!((leg_sum - response.total_distance).abs() < 1e-6);
    }

    #[test]
    fn test_response_wire_format() {
        let response = plan_route(&sample_request(), &RouteOptimizer::default(), None).unwrap();
        let value = serde_json::to_value(&response).unwrap();

        assert!(value["optimizedRoute"].is_array());
        assert!(value["totalDistance"].is_number());
        assert!(value["totalDuration"].is_number());
        assert_eq!(value["strategy"], "exact");
        assert_eq!(value["degradations"], json!([]));

        let first = &value["optimizedRoute"][0];
        assert_eq!(first["name"], "Whole Foods Lamar");
        assert!(first.get("address").is_none());
        assert!(first["leg"]["distance"].is_number());
    }

    #[test]
    fn test_missing_location_is_invalid() {
        let request: RouteRequest = serde_json::from_value(json!({
            "products": [
                { "name": "Milk", "price": 1.0, "store": "A", "location": { "lat": 1.0, "lng": 1.0 } }
            ]
        }))
        .unwrap();

        let result = plan_route(&request, &RouteOptimizer::default(), None);
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_empty_products_is_invalid() {
        let request: RouteRequest =
            serde_json::from_value(json!({ "userLocation": { "lat": 1.0, "lng": 1.0 } })).unwrap();

        let result = plan_route(&request, &RouteOptimizer::default(), None);
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_assemble_is_a_projection() {
        let mut stop = Stop::new("Kroger", Coordinate::new(1.0, 2.0));
        stop.add_item(PurchaseItem::new("Tea", 2.0, "Kroger", Coordinate::new(1.0, 2.0)));
        let route = Route {
            stops: vec![stop],
            legs: vec![Leg::new(100.0, 9.0)],
            total: Leg::new(100.0, 9.0),
            strategy: Strategy::Trivial,
            degradations: vec![Degradation::OptimizationTimeout],
        };

        let response = assemble(&route);
        assert_eq!(response.optimized_route.len(), 1);
        assert_eq!(response.optimized_route[0].lat, 1.0);
        assert_eq!(response.optimized_route[0].products, vec!["Tea"]);
        assert_eq!(response.total_distance, 100.0);
        assert_eq!(response.degradations, vec![Degradation::OptimizationTimeout]);
    }

    #[test]
    fn test_threshold_is_honored_through_plan_route() {
        let optimizer = RouteOptimizer::new(OptimizerConfig::default().with_exact_threshold(1));
        let response = plan_route(&sample_request(), &optimizer, None).unwrap();
        assert_eq!(response.strategy, Strategy::Heuristic);
    }
}
