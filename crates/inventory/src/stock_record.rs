use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{Entity, LedgerError, LedgerResult, ProductId, Versioned, WarehouseId};

use crate::discount::Discount;

/// Unique key of a stock record: one product at one warehouse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockKey {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
}

impl StockKey {
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            product_id,
            warehouse_id,
        }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "product {} @ warehouse {}", self.product_id, self.warehouse_id)
    }
}

/// Stock level classification, always derived from quantity and minimum stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn derive(quantity: i64, minimum_stock: i64) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= minimum_stock {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "IN_STOCK",
            StockStatus::LowStock => "LOW_STOCK",
            StockStatus::OutOfStock => "OUT_OF_STOCK",
        }
    }
}

/// Quantity, price and discount state of one product at one warehouse.
///
/// Invariants held by every constructor and mutator:
/// - `quantity >= 0`, `minimum_stock >= 0`, `unit_price >= 0`
/// - `status == StockStatus::derive(quantity, minimum_stock)`
///
/// Mutators validate first and only then touch state, so a failed call leaves
/// the record unchanged. The write `version` is owned by the store: mutators do
/// not bump it, the store assigns the next version on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StockRecordSnapshot", into = "StockRecordSnapshot")]
pub struct StockRecord {
    key: StockKey,
    quantity: i64,
    unit_price: Decimal,
    minimum_stock: i64,
    status: StockStatus,
    discount: Option<Discount>,
    location: Option<String>,
    version: u64,
    updated_at: DateTime<Utc>,
}

impl StockRecord {
    /// A fresh, not-yet-committed record with zero quantity.
    pub fn open(
        key: StockKey,
        unit_price: Decimal,
        minimum_stock: i64,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        ensure_price(unit_price)?;
        ensure_minimum(minimum_stock)?;
        Ok(Self {
            key,
            quantity: 0,
            unit_price,
            minimum_stock,
            status: StockStatus::OutOfStock,
            discount: None,
            location: None,
            version: 0,
            updated_at: now,
        })
    }

    pub fn key(&self) -> StockKey {
        self.key
    }

    pub fn product_id(&self) -> ProductId {
        self.key.product_id
    }

    pub fn warehouse_id(&self) -> WarehouseId {
        self.key.warehouse_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn minimum_stock(&self) -> i64 {
        self.minimum_stock
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Not yet committed by any store.
    pub fn is_new(&self) -> bool {
        self.version == 0
    }

    /// Stamp the version assigned by a store on commit.
    pub fn committed_as(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Increment quantity by `delta` (must be > 0).
    pub fn add(&mut self, delta: i64, now: DateTime<Utc>) -> LedgerResult<()> {
        if delta <= 0 {
            return Err(LedgerError::invalid_quantity(format!(
                "stock increment must be positive (got {delta})"
            )));
        }
        let next = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| LedgerError::invalid_quantity("stock increment overflows"))?;
        self.write_quantity(next, now);
        Ok(())
    }

    /// Absolute set used by manual corrections.
    pub fn set_quantity(&mut self, quantity: i64, now: DateTime<Utc>) -> LedgerResult<()> {
        if quantity < 0 {
            return Err(LedgerError::invalid_quantity(format!(
                "quantity cannot be negative (got {quantity})"
            )));
        }
        self.write_quantity(quantity, now);
        Ok(())
    }

    /// Remove `quantity` units (> 0, at most what is on hand).
    pub fn withdraw(&mut self, quantity: i64, now: DateTime<Utc>) -> LedgerResult<()> {
        if quantity <= 0 {
            return Err(LedgerError::invalid_quantity(format!(
                "withdrawal must be positive (got {quantity})"
            )));
        }
        if quantity > self.quantity {
            return Err(LedgerError::insufficient_stock(quantity, self.quantity));
        }
        self.write_quantity(self.quantity - quantity, now);
        Ok(())
    }

    pub fn set_unit_price(&mut self, unit_price: Decimal, now: DateTime<Utc>) -> LedgerResult<()> {
        ensure_price(unit_price)?;
        self.unit_price = unit_price;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_minimum_stock(&mut self, minimum_stock: i64, now: DateTime<Utc>) -> LedgerResult<()> {
        ensure_minimum(minimum_stock)?;
        self.minimum_stock = minimum_stock;
        self.status = StockStatus::derive(self.quantity, self.minimum_stock);
        self.updated_at = now;
        Ok(())
    }

    /// Replace (or clear) the discount. No quantity side effects.
    pub fn set_discount(&mut self, discount: Option<Discount>, now: DateTime<Utc>) {
        self.discount = discount;
        self.updated_at = now;
    }

    pub fn set_location(&mut self, location: Option<String>, now: DateTime<Utc>) {
        self.location = location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        self.updated_at = now;
    }

    fn write_quantity(&mut self, quantity: i64, now: DateTime<Utc>) {
        self.quantity = quantity;
        self.status = StockStatus::derive(self.quantity, self.minimum_stock);
        self.updated_at = now;
    }
}

fn ensure_price(unit_price: Decimal) -> LedgerResult<()> {
    if unit_price < Decimal::ZERO {
        return Err(LedgerError::invalid_price(format!(
            "unit price cannot be negative (got {unit_price})"
        )));
    }
    Ok(())
}

fn ensure_minimum(minimum_stock: i64) -> LedgerResult<()> {
    if minimum_stock < 0 {
        return Err(LedgerError::invalid_quantity(format!(
            "minimum stock cannot be negative (got {minimum_stock})"
        )));
    }
    Ok(())
}

impl Entity for StockRecord {
    type Id = StockKey;

    fn id(&self) -> &Self::Id {
        &self.key
    }
}

impl Versioned for StockRecord {
    fn version(&self) -> u64 {
        self.version
    }
}

/// Wire shape of a stock record, as served by the warehouse-item resource.
///
/// `status` is accepted for compatibility but always re-derived on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecordSnapshot {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub unit_price: Decimal,
    #[serde(default)]
    pub minimum_stock: i64,
    #[serde(default, skip_deserializing)]
    pub status: Option<StockStatus>,
    #[serde(default)]
    pub discount: Option<Discount>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StockRecordSnapshot> for StockRecord {
    type Error = LedgerError;

    fn try_from(s: StockRecordSnapshot) -> Result<Self, Self::Error> {
        let mut record = StockRecord::open(
            StockKey::new(s.product_id, s.warehouse_id),
            s.unit_price,
            s.minimum_stock,
            s.updated_at,
        )?;
        record.set_quantity(s.quantity, s.updated_at)?;
        record.set_discount(s.discount, s.updated_at);
        record.set_location(s.location, s.updated_at);
        Ok(record.committed_as(s.version))
    }
}

impl From<StockRecord> for StockRecordSnapshot {
    fn from(r: StockRecord) -> Self {
        Self {
            product_id: r.key.product_id,
            warehouse_id: r.key.warehouse_id,
            quantity: r.quantity,
            unit_price: r.unit_price,
            minimum_stock: r.minimum_stock,
            status: Some(r.status),
            discount: r.discount,
            location: r.location,
            version: r.version,
            updated_at: r.updated_at,
        }
    }
}
