//! Test helpers for academy-billing integration tests.
//!
//! Provides an in-memory backend that records every call and can be told
//! to fail specific operations.

#![allow(dead_code)]

use academy_billing::models::{
    CatalogItem, LineKind, Money, NewPayment, Payment, PaymentMethod, PaymentRequest,
    PeriodStatus, Receipt, ReceiptLine, Recipient, RecurringPaymentPeriod,
};
use academy_billing::services::BillingBackend;
use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub const TEST_STUDENT_ID: i64 = 12;

/// Install logging and metrics once per test binary.
pub fn init_observability() {
    INIT.call_once(|| {
        let level = std::env::var("TEST_LOG").unwrap_or_else(|_| "warn".to_string());
        let _ = service_core::observability::init_tracing("academy-billing-test", &level, None);
        academy_billing::services::metrics::init_metrics();
    });
}

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateReceipt,
    GetReceipt(i64),
    UpdateReceipt(i64),
    CreatePayment(NewPayment),
    MarkPeriodPaid { period_id: i64, receipt_id: i64 },
    GetPendingPeriods(i64),
    GetCatalog(LineKind),
    GetPaymentMethods,
}

#[derive(Default)]
pub struct FakeBackend {
    next_id: AtomicI64,
    calls: Mutex<Vec<Call>>,
    receipts: Mutex<HashMap<i64, Receipt>>,
    periods: Mutex<Vec<RecurringPaymentPeriod>>,
    services: Mutex<Vec<CatalogItem>>,
    products: Mutex<Vec<CatalogItem>>,
    fail_create_payment: Mutex<bool>,
    fail_update_receipt: Mutex<bool>,
    payment_receipt_override: Mutex<Option<i64>>,
    failing_periods: Mutex<HashSet<i64>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        init_observability();
        Self {
            next_id: AtomicI64::new(100),
            ..Default::default()
        }
    }

    pub fn with_periods(self, periods: Vec<RecurringPaymentPeriod>) -> Self {
        *self.periods.lock().unwrap() = periods;
        self
    }

    pub fn with_catalog(self, kind: LineKind, items: Vec<CatalogItem>) -> Self {
        match kind {
            LineKind::Service => *self.services.lock().unwrap() = items,
            LineKind::Product => *self.products.lock().unwrap() = items,
        }
        self
    }

    pub fn fail_create_payment(&self) {
        *self.fail_create_payment.lock().unwrap() = true;
    }

    pub fn fail_update_receipt(&self) {
        *self.fail_update_receipt.lock().unwrap() = true;
    }

    /// Answer create-payment calls as if the payment went to `receipt_id`.
    pub fn misroute_payments_to(&self, receipt_id: i64) {
        *self.payment_receipt_override.lock().unwrap() = Some(receipt_id);
    }

    pub fn fail_mark_period(&self, period_id: i64) {
        self.failing_periods.lock().unwrap().insert(period_id);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mark_period_calls(&self) -> Vec<(i64, i64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::MarkPeriodPaid {
                    period_id,
                    receipt_id,
                } => Some((period_id, receipt_id)),
                _ => None,
            })
            .collect()
    }

    pub fn payment_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::CreatePayment(_)))
            .count()
    }

    pub fn stored_receipt(&self, id: i64) -> Option<Receipt> {
        self.receipts.lock().unwrap().get(&id).cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl BillingBackend for FakeBackend {
    async fn create_receipt(&self, receipt: &Receipt) -> Result<Receipt, AppError> {
        self.record(Call::CreateReceipt);
        let created = receipt.clone().persisted_as(self.next_id());
        if let Some(id) = created.id() {
            self.receipts.lock().unwrap().insert(id, created.clone());
        }
        Ok(created)
    }

    async fn get_receipt(&self, receipt_id: i64) -> Result<Receipt, AppError> {
        self.record(Call::GetReceipt(receipt_id));
        self.stored_receipt(receipt_id)
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Recibo no encontrado")))
    }

    async fn update_receipt(&self, receipt_id: i64, receipt: &Receipt) -> Result<(), AppError> {
        self.record(Call::UpdateReceipt(receipt_id));
        if *self.fail_update_receipt.lock().unwrap() {
            return Err(AppError::ServiceUnavailable);
        }
        self.receipts
            .lock()
            .unwrap()
            .insert(receipt_id, receipt.clone());
        Ok(())
    }

    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, AppError> {
        self.record(Call::CreatePayment(payment.clone()));
        if *self.fail_create_payment.lock().unwrap() {
            return Err(AppError::BadGateway("connection reset".to_string()));
        }
        Ok(Payment {
            id: self.next_id(),
            receipt_id: self
                .payment_receipt_override
                .lock()
                .unwrap()
                .unwrap_or(payment.receipt_id),
            amount: payment.amount,
            method_id: payment.method_id,
            date: payment.date,
            reference: payment.reference.clone(),
        })
    }

    async fn mark_period_paid(&self, period_id: i64, receipt_id: i64) -> Result<(), AppError> {
        self.record(Call::MarkPeriodPaid {
            period_id,
            receipt_id,
        });
        if self.failing_periods.lock().unwrap().contains(&period_id) {
            return Err(AppError::InternalError(anyhow::anyhow!(
                "HTTP 500: period {} could not be updated",
                period_id
            )));
        }
        Ok(())
    }

    async fn get_pending_periods(
        &self,
        student_id: i64,
    ) -> Result<Vec<RecurringPaymentPeriod>, AppError> {
        self.record(Call::GetPendingPeriods(student_id));
        Ok(self
            .periods
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn get_catalog(&self, kind: LineKind) -> Result<Vec<CatalogItem>, AppError> {
        self.record(Call::GetCatalog(kind));
        let items = match kind {
            LineKind::Service => self.services.lock().unwrap().clone(),
            LineKind::Product => self.products.lock().unwrap().clone(),
        };
        Ok(items)
    }

    async fn get_payment_methods(&self) -> Result<Vec<PaymentMethod>, AppError> {
        self.record(Call::GetPaymentMethods);
        Ok(vec![
            PaymentMethod {
                id: 1,
                name: "Efectivo".to_string(),
            },
            PaymentMethod {
                id: 2,
                name: "Transferencia".to_string(),
            },
        ])
    }
}

pub fn m(amount: &str) -> Money {
    Money::parse(amount).unwrap()
}

pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

pub fn student_receipt() -> Receipt {
    Receipt::new(Recipient::student(TEST_STUDENT_ID), test_date()).unwrap()
}

pub fn service_line(price: &str, quantity: u32) -> ReceiptLine {
    ReceiptLine::new(LineKind::Service, Some(1), "Mensualidad", m(price), quantity).unwrap()
}

pub fn product_line(price: &str) -> ReceiptLine {
    ReceiptLine::new(LineKind::Product, Some(4), "Camiseta", m(price), 1).unwrap()
}

pub fn period(id: i64, month: u32, year: i32, amount: &str, status: PeriodStatus) -> RecurringPaymentPeriod {
    RecurringPaymentPeriod {
        id,
        student_id: TEST_STUDENT_ID,
        month,
        year,
        amount: m(amount),
        status,
    }
}

pub fn cash(amount: &str) -> PaymentRequest {
    PaymentRequest::new(m(amount), 1, test_date())
}

/// A persisted receipt with the given lines, as the backend stores it.
pub fn persisted(id: i64, lines: Vec<ReceiptLine>) -> Receipt {
    let mut receipt = student_receipt().persisted_as(id);
    for line in lines {
        receipt.add_line(line).unwrap();
    }
    receipt
}
