//! Payments (abonos) applied against a receipt.

use super::{Money, ReceiptStatus, ReceiptTotals};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A recorded payment. Immutable once the backend has accepted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(alias = "Id", alias = "ID")]
    pub id: i64,
    #[serde(alias = "ReceiptId", alias = "reciboId", alias = "ReciboId")]
    pub receipt_id: i64,
    #[serde(alias = "Amount", alias = "monto", alias = "Monto")]
    pub amount: Money,
    #[serde(alias = "MethodId", alias = "metodoPagoId", alias = "MetodoPagoId")]
    pub method_id: i64,
    #[serde(alias = "Date", alias = "fecha", alias = "Fecha")]
    pub date: NaiveDate,
    #[serde(default, alias = "Reference", alias = "referencia", alias = "Referencia")]
    pub reference: Option<String>,
}

/// Caller input for applying a payment.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct PaymentRequest {
    pub amount: Money,
    #[validate(range(min = 1))]
    pub method_id: i64,
    pub date: NaiveDate,
    #[validate(length(max = 120))]
    pub reference: Option<String>,
}

impl PaymentRequest {
    pub fn new(amount: Money, method_id: i64, date: NaiveDate) -> Self {
        Self {
            amount,
            method_id,
            date,
            reference: None,
        }
    }

    /// Attach a free-text reference; blank text is dropped.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        let reference = reference.into().trim().to_string();
        self.reference = if reference.is_empty() {
            None
        } else {
            Some(reference)
        };
        self
    }
}

/// Body of the backend's create-payment call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub receipt_id: i64,
    pub amount: Money,
    pub method_id: i64,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl NewPayment {
    pub fn from_request(receipt_id: i64, request: &PaymentRequest) -> Self {
        Self {
            receipt_id,
            amount: request.amount,
            method_id: request.method_id,
            date: request.date,
            reference: request.reference.clone(),
        }
    }
}

/// A linked period the backend refused to mark as paid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSettlementFailure {
    pub period_id: i64,
    pub error: String,
}

/// Outcome of marking a receipt's linked periods as paid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettlementReport {
    pub settled: Vec<i64>,
    pub failed: Vec<PeriodSettlementFailure>,
}

impl SettlementReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.settled.len() + self.failed.len()
    }
}

/// Result of applying one payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentOutcome {
    pub payment: Payment,
    pub status: ReceiptStatus,
    pub totals: ReceiptTotals,
    pub settlement: SettlementReport,
}
