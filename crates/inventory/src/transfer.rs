use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockledger_core::{LedgerError, LedgerResult, ProductId, WarehouseId};

use crate::stock_record::{StockKey, StockRecord};

/// Request to move units of one product between two warehouses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub product_id: ProductId,
    pub source_warehouse_id: WarehouseId,
    pub target_warehouse_id: WarehouseId,
    pub quantity: i64,
}

impl TransferRequest {
    pub fn new(
        product_id: ProductId,
        source_warehouse_id: WarehouseId,
        target_warehouse_id: WarehouseId,
        quantity: i64,
    ) -> Self {
        Self {
            product_id,
            source_warehouse_id,
            target_warehouse_id,
            quantity,
        }
    }

    pub fn source_key(&self) -> StockKey {
        StockKey::new(self.product_id, self.source_warehouse_id)
    }

    pub fn target_key(&self) -> StockKey {
        StockKey::new(self.product_id, self.target_warehouse_id)
    }

    /// Request-level checks that need no stock state.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.quantity <= 0 {
            return Err(LedgerError::invalid_quantity(format!(
                "transfer quantity must be positive (got {})",
                self.quantity
            )));
        }
        if self.source_warehouse_id == self.target_warehouse_id {
            return Err(LedgerError::SameWarehouse(self.source_warehouse_id));
        }
        Ok(())
    }

    /// Compute the post-transfer pair without touching the inputs.
    ///
    /// Only quantities move. Each side keeps its own unit price, discount and
    /// minimum stock.
    pub fn apply(
        &self,
        source: &StockRecord,
        target: &StockRecord,
        now: DateTime<Utc>,
    ) -> LedgerResult<TransferOutcome> {
        self.validate()?;
        if source.key() != self.source_key() || target.key() != self.target_key() {
            return Err(LedgerError::not_found(format!(
                "records do not match transfer of product {}",
                self.product_id
            )));
        }

        let mut source = source.clone();
        let mut target = target.clone();
        source.withdraw(self.quantity, now)?;
        target.add(self.quantity, now)?;

        Ok(TransferOutcome { source, target })
    }
}

/// Source and target records after a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub source: StockRecord,
    pub target: StockRecord,
}
