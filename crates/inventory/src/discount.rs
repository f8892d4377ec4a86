//! Discount rules attached to a stock record, and the pure price evaluator.
//!
//! A discount is a tagged union: each rule kind carries exactly the fields it
//! needs. The loose document shape used on the wire (`type` + `value` + optional
//! band fields) is converted into the typed rule on load and rejected when it
//! describes an impossible combination.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{LedgerError, LedgerResult, ValueObject};

use crate::stock_record::StockRecord;

/// Optional `[min, max]` purchase-quantity range a discount applies within.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityBand {
    min: Option<u64>,
    max: Option<u64>,
}

impl QuantityBand {
    pub fn new(min: Option<u64>, max: Option<u64>) -> LedgerResult<Self> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(LedgerError::invalid_discount(format!(
                    "minQuantity ({lo}) exceeds maxQuantity ({hi})"
                )));
            }
        }
        Ok(Self { min, max })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn min(&self) -> Option<u64> {
        self.min
    }

    pub fn max(&self) -> Option<u64> {
        self.max
    }

    pub fn contains(&self, quantity: u64) -> bool {
        self.min.is_none_or(|lo| quantity >= lo) && self.max.is_none_or(|hi| quantity <= hi)
    }
}

impl ValueObject for QuantityBand {}

/// Inclusive date range of applicability. An open end never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> LedgerResult<Self> {
        if let Some(end) = end {
            if end < start {
                return Err(LedgerError::invalid_discount(format!(
                    "endDate ({end}) precedes startDate ({start})"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn starting(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.is_none_or(|end| date <= end)
    }
}

impl ValueObject for DateWindow {}

/// Discount kind discriminator as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscountKind {
    #[serde(rename = "PERCENTAGE")]
    Percentage,
    #[serde(rename = "FIXED_AMOUNT")]
    FixedAmount,
    #[serde(rename = "BUY_X_GET_Y")]
    BuyXGetY,
}

/// Typed discount rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountRule {
    /// `percent` off the unit price, inside `band`.
    Percentage { percent: Decimal, band: QuantityBand },
    /// `amount` (currency) off the unit price, inside `band`.
    FixedAmount { amount: Decimal, band: QuantityBand },
    /// Buy `buy` units, receive one more free. Not gated by a quantity band.
    BuyXGetY { buy: u64 },
}

impl DiscountRule {
    pub fn percentage(percent: Decimal, band: QuantityBand) -> LedgerResult<Self> {
        if percent < Decimal::ZERO {
            return Err(LedgerError::invalid_discount(format!(
                "percentage cannot be negative (got {percent})"
            )));
        }
        Ok(Self::Percentage { percent, band })
    }

    pub fn fixed_amount(amount: Decimal, band: QuantityBand) -> LedgerResult<Self> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::invalid_discount(format!(
                "fixed amount cannot be negative (got {amount})"
            )));
        }
        Ok(Self::FixedAmount { amount, band })
    }

    pub fn buy_x_get_y(buy: u64) -> LedgerResult<Self> {
        if buy == 0 {
            return Err(LedgerError::invalid_discount(
                "buy-x-get-y threshold must be at least 1",
            ));
        }
        Ok(Self::BuyXGetY { buy })
    }

    pub fn kind(&self) -> DiscountKind {
        match self {
            DiscountRule::Percentage { .. } => DiscountKind::Percentage,
            DiscountRule::FixedAmount { .. } => DiscountKind::FixedAmount,
            DiscountRule::BuyXGetY { .. } => DiscountKind::BuyXGetY,
        }
    }
}

/// A discount attached to one stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DiscountDocument", into = "DiscountDocument")]
pub struct Discount {
    rule: DiscountRule,
    window: DateWindow,
    is_active: bool,
}

impl Discount {
    pub fn new(rule: DiscountRule, window: DateWindow, is_active: bool) -> Self {
        Self {
            rule,
            window,
            is_active,
        }
    }

    pub fn rule(&self) -> &DiscountRule {
        &self.rule
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Same rule and window with the master switch flipped.
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Active and inside its date window on `as_of`.
    pub fn is_live_on(&self, as_of: NaiveDate) -> bool {
        self.is_active && self.window.contains(as_of)
    }

    /// Price `purchase_quantity` units at `unit_price` under this discount.
    pub fn evaluate(&self, unit_price: Decimal, purchase_quantity: u64, as_of: NaiveDate) -> PriceQuote {
        if !self.is_live_on(as_of) {
            return PriceQuote::plain(unit_price, purchase_quantity);
        }

        match &self.rule {
            DiscountRule::Percentage { percent, band } => {
                if !band.contains(purchase_quantity) {
                    return PriceQuote::plain(unit_price, purchase_quantity);
                }
                let factor = Decimal::ONE - *percent / Decimal::ONE_HUNDRED;
                // Only a negative factor can overflow, and that floors at zero anyway.
                let reduced = unit_price.checked_mul(factor).unwrap_or(Decimal::ZERO);
                PriceQuote::reduced(reduced.max(Decimal::ZERO), purchase_quantity)
            }
            DiscountRule::FixedAmount { amount, band } => {
                if !band.contains(purchase_quantity) {
                    return PriceQuote::plain(unit_price, purchase_quantity);
                }
                let reduced = unit_price.checked_sub(*amount).unwrap_or(Decimal::ZERO);
                PriceQuote::reduced(reduced.max(Decimal::ZERO), purchase_quantity)
            }
            DiscountRule::BuyXGetY { buy } => {
                let group = buy.saturating_add(1);
                if purchase_quantity < group {
                    return PriceQuote::plain(unit_price, purchase_quantity);
                }
                let free_units = purchase_quantity / group;
                PriceQuote {
                    unit_price,
                    total_price: line_total(unit_price, purchase_quantity - free_units),
                    discount_applied: true,
                    free_units,
                }
            }
        }
    }
}

impl ValueObject for Discount {}

/// `unit_price × quantity`, saturating at `Decimal::MAX`.
fn line_total(unit_price: Decimal, quantity: u64) -> Decimal {
    unit_price
        .checked_mul(Decimal::from(quantity))
        .unwrap_or(Decimal::MAX)
}

/// Loose document shape of a discount (nested object on the stock resource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountDocument {
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    pub value: Decimal,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_quantity: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_quantity: Option<u64>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl TryFrom<DiscountDocument> for Discount {
    type Error = LedgerError;

    fn try_from(doc: DiscountDocument) -> Result<Self, Self::Error> {
        let window = DateWindow::new(doc.start_date, doc.end_date)?;
        let rule = match doc.kind {
            DiscountKind::Percentage => {
                DiscountRule::percentage(doc.value, QuantityBand::new(doc.min_quantity, doc.max_quantity)?)?
            }
            DiscountKind::FixedAmount => {
                DiscountRule::fixed_amount(doc.value, QuantityBand::new(doc.min_quantity, doc.max_quantity)?)?
            }
            DiscountKind::BuyXGetY => {
                if doc.min_quantity.is_some() || doc.max_quantity.is_some() {
                    return Err(LedgerError::invalid_discount(
                        "buy-x-get-y does not take a quantity band",
                    ));
                }
                let whole = doc.value.fract().is_zero();
                let buy = doc.value.to_u64().filter(|_| whole).ok_or_else(|| {
                    LedgerError::invalid_discount(format!(
                        "buy-x-get-y threshold must be a whole number (got {})",
                        doc.value
                    ))
                })?;
                DiscountRule::buy_x_get_y(buy)?
            }
        };
        Ok(Discount::new(rule, window, doc.is_active))
    }
}

impl From<Discount> for DiscountDocument {
    fn from(d: Discount) -> Self {
        let kind = d.rule.kind();
        let (value, band) = match d.rule {
            DiscountRule::Percentage { percent, band } => (percent, band),
            DiscountRule::FixedAmount { amount, band } => (amount, band),
            DiscountRule::BuyXGetY { buy } => (Decimal::from(buy), QuantityBand::unbounded()),
        };
        Self {
            kind,
            value,
            start_date: d.window.start,
            end_date: d.window.end,
            min_quantity: band.min,
            max_quantity: band.max,
            is_active: d.is_active,
        }
    }
}

/// Result of pricing a purchase against a stock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Per-unit price charged. For buy-x-get-y this stays the listed price; the
    /// saving shows up in `total_price` and `free_units`.
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub discount_applied: bool,
    pub free_units: u64,
}

impl PriceQuote {
    pub fn plain(unit_price: Decimal, quantity: u64) -> Self {
        Self {
            unit_price,
            total_price: line_total(unit_price, quantity),
            discount_applied: false,
            free_units: 0,
        }
    }

    fn reduced(unit_price: Decimal, quantity: u64) -> Self {
        Self {
            unit_price,
            total_price: line_total(unit_price, quantity),
            discount_applied: true,
            free_units: 0,
        }
    }
}

impl ValueObject for PriceQuote {}

/// Effective price of `purchase_quantity` units of a stock record on `as_of`.
///
/// Pure: no clock, no IO. Never returns a negative price.
pub fn price_for(record: &StockRecord, purchase_quantity: u64, as_of: NaiveDate) -> PriceQuote {
    match record.discount() {
        Some(discount) => discount.evaluate(record.unit_price(), purchase_quantity, as_of),
        None => PriceQuote::plain(record.unit_price(), purchase_quantity),
    }
}
