//! Receipt line items.

use super::{CatalogItem, Money, RecurringPaymentPeriod};
use crate::error::{BillingError, Result};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// What a line charges for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    #[serde(alias = "servicio", alias = "Servicio", alias = "Service")]
    Service,
    #[serde(alias = "producto", alias = "Producto", alias = "Product")]
    Product,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Service => "service",
            LineKind::Product => "product",
        }
    }
}

fn validate_non_negative(amount: &Money) -> std::result::Result<(), ValidationError> {
    if amount.is_negative() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

/// One charge on a receipt.
///
/// The line total is never stored; it is derived from price and quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub kind: LineKind,
    /// Catalog id; `None` for lines synthesized from a payment period.
    pub item_id: Option<i64>,
    #[validate(length(min = 1, max = 200))]
    pub description: String,
    #[validate(custom(function = "validate_non_negative"))]
    pub unit_price: Money,
    #[validate(range(min = 1))]
    pub quantity: u32,
    pub linked_period_id: Option<i64>,
}

impl ReceiptLine {
    pub fn new(
        kind: LineKind,
        item_id: Option<i64>,
        description: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self> {
        let line = ReceiptLine {
            kind,
            item_id: item_id.filter(|id| *id > 0),
            description: description.into().trim().to_string(),
            unit_price,
            quantity,
            linked_period_id: None,
        };
        line.validate()?;
        Ok(line)
    }

    /// Build a line from a catalog entry at its current price.
    pub fn from_catalog(kind: LineKind, item: &CatalogItem, quantity: u32) -> Result<Self> {
        if !item.active {
            return Err(BillingError::validation(format!(
                "{} '{}' is inactive",
                kind.as_str(),
                item.name
            )));
        }
        ReceiptLine::new(kind, Some(item.id), item.name.clone(), item.price, quantity)
    }

    /// Synthesize the line that bills a recurring payment period.
    pub fn for_period(period: &RecurringPaymentPeriod) -> Result<Self> {
        period.validate()?;
        let mut line = ReceiptLine::new(LineKind::Service, None, period.label(), period.amount, 1)?;
        line.linked_period_id = Some(period.id);
        Ok(line)
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}
