//! Matching a student's open payment periods to receipt lines.

use super::backend::BillingBackend;
use crate::error::{BillingError, Result};
use crate::models::{Receipt, ReceiptLine, RecurringPaymentPeriod};
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct PeriodMatcher<B> {
    backend: Arc<B>,
}

impl<B: BillingBackend> PeriodMatcher<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Pending and overdue periods of a student, oldest first.
    #[instrument(skip(self))]
    pub async fn pending_periods_for(&self, student_id: i64) -> Result<Vec<RecurringPaymentPeriod>> {
        let mut periods: Vec<RecurringPaymentPeriod> = self
            .backend
            .get_pending_periods(student_id)
            .await?
            .into_iter()
            .filter(RecurringPaymentPeriod::is_open)
            .collect();
        periods.sort_by_key(|p| (p.year, p.month));

        debug!(student_id, count = periods.len(), "Open payment periods loaded");
        Ok(periods)
    }
}

fn check_period(receipt: &Receipt, period: &RecurringPaymentPeriod) -> Result<ReceiptLine> {
    if !period.is_open() {
        return Err(BillingError::validation(format!(
            "period {} ({}) is already paid",
            period.id,
            period.label()
        )));
    }
    if let Some(student_id) = receipt.recipient().student_id() {
        if period.student_id != student_id {
            return Err(BillingError::validation(format!(
                "period {} belongs to student {}, not {}",
                period.id, period.student_id, student_id
            )));
        }
    }
    ReceiptLine::for_period(period)
}

/// Add one period to the receipt as its own service line.
pub fn attach_period_as_line(receipt: &mut Receipt, period: &RecurringPaymentPeriod) -> Result<()> {
    attach_periods(receipt, std::slice::from_ref(period))
}

/// Add each period as a separate line. Either every period is attached or
/// none is. The same period given twice yields two lines.
pub fn attach_periods(receipt: &mut Receipt, periods: &[RecurringPaymentPeriod]) -> Result<()> {
    let lines = periods
        .iter()
        .map(|period| check_period(receipt, period))
        .collect::<Result<Vec<_>>>()?;

    let mut staged = receipt.clone();
    for line in lines {
        staged.add_line(line)?;
    }
    *receipt = staged;
    Ok(())
}
