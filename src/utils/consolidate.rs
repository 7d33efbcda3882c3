// Collapse selected purchase items into one stop per store

use crate::error::{Error, Result};
use crate::models::{PurchaseItem, Stop};
use log::{debug, warn};
use std::collections::HashMap;

/// Groups items by store identifier into stops, in first-seen store order
///
/// Each stop takes the coordinate of the first item seen for its store and
/// the first address any of its items carries. Later items reporting a
/// different coordinate for the same store are still grouped there; the
/// mismatch is logged, not rejected.
/// Fails with `InvalidInput` when `items` is empty or any item is invalid.
pub fn consolidate(items: &[PurchaseItem]) -> Result<Vec<Stop>> {
    if items.is_empty() {
        return Err(Error::invalid_input("no purchase items to route"));
    }

    let mut stops: Vec<Stop> = Vec::new();
    let mut index_by_store: HashMap<&str, usize> = HashMap::new();

    for item in items {
        item.validate()?;

        match index_by_store.get(item.store.as_str()) {
            Some(&index) => {
                let stop = &mut stops[index];
                if stop.location != item.coordinate() {
                    warn!(
                        "Store {} reported at ({}, {}) and ({}, {}); keeping the first",
                        stop.store_id,
                        stop.location.lat,
                        stop.location.lng,
                        item.location.coordinate.lat,
                        item.location.coordinate.lng
                    );
                }
                if stop.address.is_none() {
                    stop.address = item.location.address.clone();
                }
                stop.add_item(item.clone());
            }
            None => {
                index_by_store.insert(item.store.as_str(), stops.len());
                stops.push(Stop::from_item(item));
            }
        }
    }

    debug!("Consolidated {} items into {} stops", items.len(), stops.len());
    Ok(stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;

    fn item(name: &str, price: f64, store: &str, lat: f64, lng: f64) -> PurchaseItem {
        PurchaseItem::new(name, price, store, Coordinate::new(lat, lng))
    }

    #[test]
    fn test_same_store_items_share_a_stop() {
        let items = vec![
            item("Milk", 3.49, "Kroger", 30.0, -97.0),
            item("Milk", 2.99, "Kroger", 30.0, -97.0),
        ];

        let stops = consolidate(&items).unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].items.len(), 2);
        assert!((stops[0].subtotal() - 6.48).abs() < 1e-9);
    }

    #[test]
    fn test_store_order_is_first_seen() {
        let items = vec![
            item("Eggs", 2.0, "Target", 30.1, -97.1),
            item("Milk", 3.0, "Kroger", 30.0, -97.0),
            item("Soap", 1.0, "Target", 30.1, -97.1),
        ];

        let stops = consolidate(&items).unwrap();
        let ids: Vec<&str> = stops.iter().map(|s| s.store_id.as_str()).collect();
        assert_eq!(ids, vec!["Target", "Kroger"]);
        assert_eq!(stops[0].product_names(), vec!["Eggs", "Soap"]);
    }

    #[test]
    fn test_first_coordinate_wins() {
        let items = vec![
            item("Eggs", 2.0, "Target", 30.1, -97.1),
            item("Soap", 1.0, "Target", 31.0, -98.0),
        ];

        let stops = consolidate(&items).unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].location, Coordinate::new(30.1, -97.1));
    }

    #[test]
    fn test_address_is_filled_from_later_items() {
        let items = vec![
            item("Eggs", 2.0, "Target", 30.1, -97.1),
            item("Soap", 1.0, "Target", 30.1, -97.1).with_address("5 Elm St"),
        ];

        let stops = consolidate(&items).unwrap();
        assert_eq!(stops[0].address.as_deref(), Some("5 Elm St"));
    }

    #[test]
    fn test_first_address_is_not_replaced() {
        let items = vec![
            item("Eggs", 2.0, "Target", 30.1, -97.1).with_address("5 Elm St"),
            item("Milk", 3.0, "Target", 30.1, -97.1),
            item("Soap", 1.0, "Target", 30.1, -97.1).with_address("Suite 2, 5 Elm St"),
        ];

        let stops = consolidate(&items).unwrap();
        assert_eq!(stops[0].address.as_deref(), Some("5 Elm St"));
    }

    #[test]
    fn test_empty_list_is_invalid() {
        assert!(matches!(consolidate(&[]), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_out_of_range_coordinate_is_invalid() {
        let items = vec![item("Eggs", 2.0, "Target", 95.0, -97.1)];
        assert!(matches!(consolidate(&items), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let items = vec![
            item("Eggs", 2.0, "Target", 30.1, -97.1),
            item("Milk", 3.0, "Kroger", 30.0, -97.0),
            item("Soap", 1.0, "Target", 30.1, -97.1),
        ];

        let once = consolidate(&items).unwrap();
        let flattened: Vec<PurchaseItem> =
            once.iter().flat_map(|stop| stop.items.clone()).collect();
        let twice = consolidate(&flattened).unwrap();
        assert_eq!(once, twice);
    }
}
