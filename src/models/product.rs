// Purchase item model representing a priced product picked at a specific store

use crate::error::{Error, Result};
use crate::models::{Coordinate, Price, StoreId};
use serde::{Deserialize, Serialize};

/// Where a store is, as reported by the product search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreLocation {
    #[serde(flatten)]
    pub coordinate: Coordinate,

    /// Street address, when the search service knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// A product the user selected, tagged with the store that sells it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseItem {
    /// Name of the product
    pub name: String,

    /// Price of the product
    pub price: Price,

    /// Identifier of the store selling it
    pub store: StoreId,

    /// Location of that store
    pub location: StoreLocation,
}

impl PurchaseItem {
    /// Creates a new item sold at `store`, located at `coordinate`
    pub fn new<N, S>(name: N, price: Price, store: S, coordinate: Coordinate) -> Self
    where
        N: Into<String>,
        S: Into<StoreId>,
    {
        Self {
            name: name.into(),
            price,
            store: store.into(),
            location: StoreLocation {
                coordinate,
                address: None,
            },
        }
    }

    /// Attaches a street address to the store location
    pub fn with_address<A: Into<String>>(mut self, address: A) -> Self {
        self.location.address = Some(address.into());
        self
    }

    /// Coordinate of the store selling this item
    pub fn coordinate(&self) -> Coordinate {
        self.location.coordinate
    }

    /// Checks the fields the route engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.store.trim().is_empty() {
            return Err(Error::invalid_input(format!(
                "item `{}` has no store identifier",
                self.name
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::invalid_input(format!(
                "item `{}` has an invalid price {}",
                self.name, self.price
            )));
        }
        self.coordinate().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_creation() {
        let item = PurchaseItem::new("Milk", 3.49, "Kroger", Coordinate::new(30.0, -97.0))
            .with_address("1 Main St");

        assert_eq!(item.name, "Milk");
        assert_eq!(item.store, "Kroger");
        assert_eq!(item.coordinate(), Coordinate::new(30.0, -97.0));
        assert_eq!(item.location.address.as_deref(), Some("1 Main St"));
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let item = PurchaseItem::new("Milk", -1.0, "Kroger", Coordinate::new(30.0, -97.0));
        assert!(matches!(item.validate(), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_blank_store_is_rejected() {
        let item = PurchaseItem::new("Milk", 1.0, "  ", Coordinate::new(30.0, -97.0));
        assert!(matches!(item.validate(), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn test_deserialize_client_payload() {
        let json = r#"{
            "name": "Eggs",
            "price": 2.99,
            "store": "Walmart",
            "location": { "lat": 30.27, "lng": -97.74, "address": "Walmart Supercenter" }
        }"#;

        let item: PurchaseItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.store, "Walmart");
        assert_eq!(item.coordinate(), Coordinate::new(30.27, -97.74));
        assert_eq!(
            item.location.address.as_deref(),
            Some("Walmart Supercenter")
        );
    }
}
