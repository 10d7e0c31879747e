//! Applying payments (abonos) to receipts.

use super::backend::BillingBackend;
use super::metrics;
use crate::error::{BillingError, Result};
use crate::models::{
    NewPayment, PaymentOutcome, PaymentRequest, PeriodSettlementFailure, Receipt, ReceiptStatus,
    SettlementReport,
};
use futures::future::join_all;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

pub struct PaymentEngine<B> {
    backend: Arc<B>,
}

impl<B: BillingBackend> PaymentEngine<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Apply one payment to a persisted, pending receipt.
    ///
    /// Every local check runs before the backend is called, so a rejected
    /// payment leaves `receipt` untouched. When the payment settles the
    /// receipt, each distinct linked period is marked paid; settlement
    /// failures are reported in the outcome and never fail the payment.
    #[instrument(skip(self, receipt, request), fields(receipt_id = ?receipt.id(), amount = %request.amount))]
    pub async fn apply_payment(
        &self,
        receipt: &mut Receipt,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome> {
        request.validate()?;
        receipt.check_payment(request.amount)?;
        let receipt_id = receipt
            .id()
            .ok_or_else(|| BillingError::invalid_state("receipt must be saved before it can be paid"))?;

        let payment = self
            .backend
            .create_payment(&NewPayment::from_request(receipt_id, &request))
            .await
            .inspect_err(|e| {
                metrics::record_error("collaborator_error", "apply_payment");
                warn!(receipt_id, error = %e, "Backend rejected payment");
            })?;

        let previous = receipt.status();
        // The backend already holds this payment, so a mismatch is a collaborator error.
        let status = receipt.record_payment(payment.clone()).map_err(|e| {
            metrics::record_error("collaborator_error", "apply_payment");
            warn!(
                receipt_id,
                payment_id = payment.id,
                payment_receipt_id = payment.receipt_id,
                error = %e,
                "Backend accepted a payment the receipt cannot record"
            );
            BillingError::Collaborator(AppError::BadGateway(format!(
                "payment {} returned by backend does not fit receipt {}: {}",
                payment.id, receipt_id, e
            )))
        })?;
        metrics::record_payment(payment.method_id, payment.amount.to_f64());

        info!(
            receipt_id,
            payment_id = payment.id,
            amount = %payment.amount,
            status = status.as_str(),
            balance = %receipt.balance(),
            "Payment applied"
        );

        let settlement = if previous == ReceiptStatus::Pending && status == ReceiptStatus::Paid {
            self.settle_linked_periods(receipt_id, &receipt.linked_period_ids())
                .await
        } else {
            SettlementReport::default()
        };

        Ok(PaymentOutcome {
            payment,
            status,
            totals: receipt.totals(),
            settlement,
        })
    }

    /// Mark every period as paid concurrently, collecting each result.
    pub async fn settle_linked_periods(&self, receipt_id: i64, period_ids: &[i64]) -> SettlementReport {
        let attempts = period_ids.iter().map(|&period_id| {
            let backend = Arc::clone(&self.backend);
            async move {
                let result = backend.mark_period_paid(period_id, receipt_id).await;
                (period_id, result)
            }
        });

        let mut report = SettlementReport::default();
        for (period_id, result) in join_all(attempts).await {
            match result {
                Ok(()) => {
                    metrics::record_period_settlement("settled");
                    info!(receipt_id, period_id, "Payment period marked as paid");
                    report.settled.push(period_id);
                }
                Err(e) => {
                    metrics::record_period_settlement("failed");
                    metrics::record_error("collaborator_error", "mark_period_paid");
                    warn!(receipt_id, period_id, error = %e, "Failed to mark payment period as paid");
                    report.failed.push(PeriodSettlementFailure {
                        period_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }
}
