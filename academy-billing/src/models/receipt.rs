//! Receipt aggregate: lines, manual discount, payments and status.
//!
//! Totals are never stored. Every read goes through [`Receipt::totals`], which
//! derives them from the current lines, discount and payments.
//!
//! Status transitions:
//!
//! ```text
//! Pending --(balance reaches 0)--> Paid
//! Pending --(void)--> Voided
//! Paid    --(void)--> Voided
//! ```
//!
//! Nothing leaves `Voided`, and nothing returns from `Paid` to `Pending`.

use super::{Money, Payment, ReceiptLine};
use crate::error::{BillingError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Who a receipt is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientType {
    #[serde(alias = "estudiante", alias = "Estudiante", alias = "Student")]
    Student,
    #[serde(alias = "grupo", alias = "Grupo", alias = "Group")]
    Group,
    #[serde(alias = "categoria", alias = "Categoria", alias = "Category")]
    Category,
    #[serde(alias = "todos", alias = "Todos", alias = "All")]
    All,
}

impl RecipientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientType::Student => "student",
            RecipientType::Group => "group",
            RecipientType::Category => "category",
            RecipientType::All => "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(rename = "recipientType")]
    pub kind: RecipientType,
    #[serde(rename = "recipientId", default)]
    pub id: Option<i64>,
}

impl Recipient {
    pub fn student(id: i64) -> Self {
        Self {
            kind: RecipientType::Student,
            id: Some(id),
        }
    }

    pub fn group(id: i64) -> Self {
        Self {
            kind: RecipientType::Group,
            id: Some(id),
        }
    }

    pub fn category(id: i64) -> Self {
        Self {
            kind: RecipientType::Category,
            id: Some(id),
        }
    }

    pub fn all() -> Self {
        Self {
            kind: RecipientType::All,
            id: None,
        }
    }

    /// The student id when this receipt is addressed to a single student.
    pub fn student_id(&self) -> Option<i64> {
        match self.kind {
            RecipientType::Student => self.id,
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.kind == RecipientType::All || self.id.is_some_and(|id| id > 0) {
            return Ok(());
        }
        Err(BillingError::validation(format!(
            "a {} must be selected",
            self.kind.as_str()
        )))
    }
}

/// Receipt status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptStatus {
    #[serde(rename = "Pendiente", alias = "pendiente", alias = "Pending", alias = "pending")]
    Pending,
    #[serde(rename = "Pagado", alias = "pagado", alias = "Paid", alias = "paid")]
    Paid,
    #[serde(
        rename = "Anulado",
        alias = "anulado",
        alias = "Voided",
        alias = "voided",
        alias = "Void",
        alias = "void"
    )]
    Voided,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "pending",
            ReceiptStatus::Paid => "paid",
            ReceiptStatus::Voided => "voided",
        }
    }
}

/// Derived amounts of a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptTotals {
    pub subtotal: Money,
    /// Discount actually applied, never more than the subtotal.
    pub discount: Money,
    pub total: Money,
    pub paid_amount: Money,
    pub balance: Money,
}

/// Flat read model shared by list, detail, payment and print views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    pub id: Option<i64>,
    pub recipient: Recipient,
    pub issue_date: NaiveDate,
    pub status: ReceiptStatus,
    pub line_count: usize,
    pub totals: ReceiptTotals,
    pub payment_count: usize,
    pub last_payment_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(default)]
    id: Option<i64>,
    #[serde(flatten)]
    recipient: Recipient,
    issue_date: NaiveDate,
    #[serde(default)]
    lines: Vec<ReceiptLine>,
    #[serde(default)]
    manual_discount: Money,
    status: ReceiptStatus,
    #[serde(default)]
    payments: Vec<Payment>,
}

impl Receipt {
    /// Start a new, not yet persisted, pending receipt.
    pub fn new(recipient: Recipient, issue_date: NaiveDate) -> Result<Self> {
        recipient.validate()?;

        Ok(Self {
            id: None,
            recipient,
            issue_date,
            lines: Vec::new(),
            manual_discount: Money::zero(),
            status: ReceiptStatus::Pending,
            payments: Vec::new(),
        })
    }

    /// The same receipt carrying the id assigned by the backend.
    pub fn persisted_as(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn recipient(&self) -> Recipient {
        self.recipient
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    pub fn manual_discount(&self) -> Money {
        self.manual_discount
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    fn ensure_pending(&self, action: &str) -> Result<()> {
        match self.status {
            ReceiptStatus::Pending => Ok(()),
            status => Err(BillingError::invalid_state(format!(
                "cannot {} a {} receipt",
                action,
                status.as_str()
            ))),
        }
    }

    pub fn add_line(&mut self, line: ReceiptLine) -> Result<()> {
        self.ensure_pending("add lines to")?;
        line.validate()?;
        self.lines.push(line);
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<ReceiptLine> {
        self.ensure_pending("remove lines from")?;
        if index >= self.lines.len() {
            return Err(BillingError::validation(format!(
                "line {} does not exist (receipt has {} lines)",
                index,
                self.lines.len()
            )));
        }
        let subtotal = self.subtotal().subtract(self.lines[index].line_total());
        self.ensure_covers_payments(subtotal, self.manual_discount)?;
        Ok(self.lines.remove(index))
    }

    pub fn set_manual_discount(&mut self, amount: Money) -> Result<()> {
        self.ensure_pending("discount")?;
        if amount.is_negative() {
            return Err(BillingError::validation("discount cannot be negative"));
        }
        let subtotal = self.subtotal();
        if amount > subtotal {
            return Err(BillingError::validation(format!(
                "discount {} exceeds subtotal {}",
                amount, subtotal
            )));
        }
        self.ensure_covers_payments(subtotal, amount)?;
        self.manual_discount = amount;
        Ok(())
    }

    /// An edit may not lower the total below what has already been paid.
    fn ensure_covers_payments(&self, subtotal: Money, discount: Money) -> Result<()> {
        let total = subtotal.subtract(discount).clamp_non_negative();
        let paid = self.paid_amount();
        if total < paid {
            return Err(BillingError::validation(format!(
                "total {} would fall below the {} already paid",
                total, paid
            )));
        }
        Ok(())
    }

    pub fn subtotal(&self) -> Money {
        Money::sum(self.lines.iter().map(ReceiptLine::line_total))
    }

    pub fn paid_amount(&self) -> Money {
        Money::sum(self.payments.iter().map(|p| p.amount))
    }

    pub fn totals(&self) -> ReceiptTotals {
        let subtotal = self.subtotal();
        let total = subtotal.subtract(self.manual_discount).clamp_non_negative();
        let paid_amount = self.paid_amount();

        ReceiptTotals {
            subtotal,
            discount: subtotal.subtract(total),
            total,
            paid_amount,
            balance: total.subtract(paid_amount),
        }
    }

    pub fn balance(&self) -> Money {
        self.totals().balance
    }

    /// Void the receipt. Returns the status it had before.
    pub fn void(&mut self) -> Result<ReceiptStatus> {
        if self.status == ReceiptStatus::Voided {
            return Err(BillingError::invalid_state("receipt is already voided"));
        }
        let previous = self.status;
        self.status = ReceiptStatus::Voided;
        Ok(previous)
    }

    /// Check that a payment of `amount` may be applied, without applying it.
    pub fn check_payment(&self, amount: Money) -> Result<()> {
        self.ensure_pending("pay")?;
        if !amount.is_positive() {
            return Err(BillingError::validation("payment amount must be positive"));
        }
        let balance = self.balance();
        if amount > balance {
            return Err(BillingError::validation(format!(
                "payment {} exceeds pending balance {}",
                amount, balance
            )));
        }
        Ok(())
    }

    /// Append a payment the backend has accepted. Moves the receipt to
    /// `Paid` once nothing is left to pay.
    pub fn record_payment(&mut self, payment: Payment) -> Result<ReceiptStatus> {
        self.check_payment(payment.amount)?;
        if let Some(id) = self.id.filter(|id| *id != payment.receipt_id) {
            return Err(BillingError::validation(format!(
                "payment belongs to receipt {}, not {}",
                payment.receipt_id, id
            )));
        }

        self.payments.push(payment);
        if !self.balance().is_positive() {
            self.status = ReceiptStatus::Paid;
        }
        Ok(self.status)
    }

    /// Distinct linked period ids, in line order.
    pub fn linked_period_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for id in self.lines.iter().filter_map(|l| l.linked_period_id) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn summary(&self) -> ReceiptSummary {
        ReceiptSummary {
            id: self.id,
            recipient: self.recipient,
            issue_date: self.issue_date,
            status: self.status,
            line_count: self.lines.len(),
            totals: self.totals(),
            payment_count: self.payments.len(),
            last_payment_date: self.payments.iter().map(|p| p.date).max(),
        }
    }
}
