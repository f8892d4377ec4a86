use serde::{Deserialize, Serialize};

use stockledger_core::{Entity, LedgerError, LedgerResult, ProductId, WarehouseId};

/// A warehouse able to hold stock records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    id: WarehouseId,
    name: String,
    capacity: i64,
}

impl Warehouse {
    /// Capacity must be positive; occupancy is computed against it.
    pub fn new(id: WarehouseId, name: impl Into<String>, capacity: i64) -> LedgerResult<Self> {
        if capacity <= 0 {
            return Err(LedgerError::invalid_capacity(format!(
                "warehouse capacity must be positive (got {capacity})"
            )));
        }
        Ok(Self {
            id,
            name: name.into(),
            capacity,
        })
    }

    pub fn id_typed(&self) -> WarehouseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Catalog entry the ledger needs to know about: a product that may be stocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
