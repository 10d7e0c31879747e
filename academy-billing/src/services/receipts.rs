//! Receipt workflow: issue, edit, void and pay receipts against the backend.

use super::backend::BillingBackend;
use super::metrics;
use super::payment_engine::PaymentEngine;
use super::period_matching::{self, PeriodMatcher};
use crate::error::{BillingError, Result};
use crate::models::{
    LineKind, PaymentMethod, PaymentOutcome, PaymentRequest, Receipt, ReceiptLine, ReceiptStatus,
    RecurringPaymentPeriod,
};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A receipt as stored by the backend, with the payment applied on issue.
#[derive(Debug, Clone)]
pub struct IssuedReceipt {
    pub receipt: Receipt,
    pub payment: Option<PaymentOutcome>,
}

pub struct ReceiptService<B> {
    backend: Arc<B>,
    engine: PaymentEngine<B>,
    matcher: PeriodMatcher<B>,
}

impl<B: BillingBackend> ReceiptService<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            engine: PaymentEngine::new(Arc::clone(&backend)),
            matcher: PeriodMatcher::new(Arc::clone(&backend)),
            backend,
        }
    }

    /// Persist a draft and optionally settle it right away.
    ///
    /// A payment that fails after the receipt was created is returned as an
    /// error; the receipt stays on the backend as Pending.
    #[instrument(skip(self, draft, initial_payment), fields(recipient = draft.recipient().kind.as_str()))]
    pub async fn issue(
        &self,
        draft: Receipt,
        initial_payment: Option<PaymentRequest>,
    ) -> Result<IssuedReceipt> {
        if draft.id().is_some() {
            return Err(BillingError::invalid_state("receipt has already been issued"));
        }
        if draft.status() != ReceiptStatus::Pending {
            return Err(BillingError::invalid_state(format!(
                "cannot issue a {} receipt",
                draft.status().as_str()
            )));
        }
        ensure_billable(&draft)?;
        if let Some(request) = &initial_payment {
            draft.check_payment(request.amount)?;
        }

        let mut receipt = self.backend.create_receipt(&draft).await.inspect_err(|e| {
            metrics::record_error("collaborator_error", "issue_receipt");
            warn!(error = %e, "Backend rejected receipt");
        })?;
        let receipt_id = receipt.id().ok_or_else(|| {
            AppError::BadGateway("backend returned a receipt without id".to_string())
        })?;

        metrics::record_receipt_event("issued");
        info!(receipt_id, total = %receipt.totals().total, "Receipt issued");

        let payment = match initial_payment {
            Some(request) => Some(self.engine.apply_payment(&mut receipt, request).await?),
            None => None,
        };

        Ok(IssuedReceipt { receipt, payment })
    }

    /// Push line and discount edits of a pending receipt.
    #[instrument(skip(self, receipt), fields(receipt_id = ?receipt.id()))]
    pub async fn save(&self, receipt: &Receipt) -> Result<()> {
        let receipt_id = persisted_id(receipt)?;
        if receipt.status() != ReceiptStatus::Pending {
            return Err(BillingError::invalid_state(format!(
                "cannot edit a {} receipt",
                receipt.status().as_str()
            )));
        }
        ensure_billable(receipt)?;
        self.backend.update_receipt(receipt_id, receipt).await?;
        Ok(())
    }

    /// Void a receipt. The caller's receipt changes only once the backend
    /// has accepted the voided state.
    #[instrument(skip(self, receipt), fields(receipt_id = ?receipt.id()))]
    pub async fn void(&self, receipt: &mut Receipt) -> Result<()> {
        let receipt_id = persisted_id(receipt)?;
        let mut voided = receipt.clone();
        let previous = voided.void()?;

        self.backend.update_receipt(receipt_id, &voided).await?;
        *receipt = voided;

        metrics::record_receipt_event("voided");
        if previous == ReceiptStatus::Paid {
            // Payments and settled periods are left as they are.
            warn!(
                receipt_id,
                paid_amount = %receipt.paid_amount(),
                linked_periods = ?receipt.linked_period_ids(),
                "Paid receipt voided"
            );
        } else {
            info!(receipt_id, balance = %receipt.balance(), "Receipt voided");
        }
        Ok(())
    }

    pub async fn apply_payment(
        &self,
        receipt: &mut Receipt,
        request: PaymentRequest,
    ) -> Result<PaymentOutcome> {
        self.engine.apply_payment(receipt, request).await
    }

    pub async fn get_receipt(&self, receipt_id: i64) -> Result<Receipt> {
        Ok(self.backend.get_receipt(receipt_id).await?)
    }

    pub async fn pending_periods_for(&self, student_id: i64) -> Result<Vec<RecurringPaymentPeriod>> {
        self.matcher.pending_periods_for(student_id).await
    }

    pub fn attach_periods(
        &self,
        receipt: &mut Receipt,
        periods: &[RecurringPaymentPeriod],
    ) -> Result<()> {
        period_matching::attach_periods(receipt, periods)
    }

    /// Build a line from the current catalog entry `item_id`.
    #[instrument(skip(self, kind), fields(kind = kind.as_str()))]
    pub async fn line_from_catalog(
        &self,
        kind: LineKind,
        item_id: i64,
        quantity: u32,
    ) -> Result<ReceiptLine> {
        let catalog = self.backend.get_catalog(kind).await?;
        let item = catalog
            .iter()
            .find(|item| item.id == item_id)
            .ok_or_else(|| {
                BillingError::validation(format!("{} {} does not exist", kind.as_str(), item_id))
            })?;
        ReceiptLine::from_catalog(kind, item, quantity)
    }

    pub async fn payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        Ok(self.backend.get_payment_methods().await?)
    }
}

/// A receipt must charge something to be payable.
fn ensure_billable(receipt: &Receipt) -> Result<()> {
    if receipt.lines().is_empty() {
        return Err(BillingError::validation("a receipt needs at least one line"));
    }
    if !receipt.totals().total.is_positive() {
        return Err(BillingError::validation("receipt total must be greater than zero"));
    }
    Ok(())
}

fn persisted_id(receipt: &Receipt) -> Result<i64> {
    receipt
        .id()
        .ok_or_else(|| BillingError::invalid_state("receipt has not been issued yet"))
}
