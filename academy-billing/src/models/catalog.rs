//! Catalog entries (services, products) and payment methods.

use super::Money;
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

/// A service or product offered by the academy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    #[serde(alias = "Id", alias = "ID")]
    pub id: i64,
    #[serde(alias = "Name", alias = "nombre", alias = "Nombre")]
    pub name: String,
    #[serde(alias = "Price", alias = "precio", alias = "Precio")]
    pub price: Money,
    #[serde(default = "default_active", alias = "Active", alias = "activo", alias = "Activo")]
    pub active: bool,
}

/// Entry of the payment-method catalog (cash, transfer, card...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    #[serde(alias = "Id", alias = "ID")]
    pub id: i64,
    #[serde(alias = "Name", alias = "nombre", alias = "Nombre")]
    pub name: String,
}
