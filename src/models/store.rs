// Stop model: one physical store visit grouping every item bought there

use crate::models::{Coordinate, Price, PurchaseItem, StoreId};
use serde::{Deserialize, Serialize};

/// A store to visit and the items to buy there
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Unique identifier for the store
    pub store_id: StoreId,

    /// Authoritative location of the store
    pub location: Coordinate,

    /// Street address, when known
    pub address: Option<String>,

    /// Items to buy at this store, in selection order
    pub items: Vec<PurchaseItem>,
}

impl Stop {
    /// Creates a stop with no items
    pub fn new<S: Into<StoreId>>(store_id: S, location: Coordinate) -> Self {
        Self {
            store_id: store_id.into(),
            location,
            address: None,
            items: Vec::new(),
        }
    }

    /// Opens a stop at the store of `item`, taking its location and address
    pub fn from_item(item: &PurchaseItem) -> Self {
        Self {
            store_id: item.store.clone(),
            location: item.coordinate(),
            address: item.location.address.clone(),
            items: vec![item.clone()],
        }
    }

    /// Adds an item to buy at this stop
    pub fn add_item(&mut self, item: PurchaseItem) {
        self.items.push(item);
    }

    /// Names of the products bought here
    pub fn product_names(&self) -> Vec<String> {
        self.items.iter().map(|item| item.name.clone()).collect()
    }

    /// Total spend at this stop
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(|item| item.price).sum()
    }
}
