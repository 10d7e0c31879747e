//! The REST backend as seen by the billing model.

use crate::models::{
    CatalogItem, LineKind, NewPayment, Payment, PaymentMethod, Receipt, RecurringPaymentPeriod,
};
use async_trait::async_trait;
use service_core::error::AppError;

/// Backend operations the billing model depends on.
///
/// Implementations return canonical shapes; casing differences in the
/// backend's JSON are resolved inside the implementation.
#[async_trait]
pub trait BillingBackend: Send + Sync {
    /// Persist a new receipt. The returned receipt carries its assigned id.
    async fn create_receipt(&self, receipt: &Receipt) -> Result<Receipt, AppError>;

    async fn get_receipt(&self, receipt_id: i64) -> Result<Receipt, AppError>;

    async fn update_receipt(&self, receipt_id: i64, receipt: &Receipt) -> Result<(), AppError>;

    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, AppError>;

    async fn mark_period_paid(&self, period_id: i64, receipt_id: i64) -> Result<(), AppError>;

    async fn get_pending_periods(
        &self,
        student_id: i64,
    ) -> Result<Vec<RecurringPaymentPeriod>, AppError>;

    async fn get_catalog(&self, kind: LineKind) -> Result<Vec<CatalogItem>, AppError>;

    async fn get_payment_methods(&self) -> Result<Vec<PaymentMethod>, AppError>;
}
