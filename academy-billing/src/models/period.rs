//! Recurring (monthly) payment periods owed by a student.

use super::Money;
use serde::{Deserialize, Serialize};
use validator::Validate;

const MONTH_NAMES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Period status. Overdue vs pending is decided by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodStatus {
    #[serde(
        rename = "Pendiente",
        alias = "pendiente",
        alias = "PENDIENTE",
        alias = "Pending",
        alias = "pending"
    )]
    Pending,
    #[serde(
        rename = "Vencido",
        alias = "vencido",
        alias = "VENCIDO",
        alias = "Overdue",
        alias = "overdue"
    )]
    Overdue,
    #[serde(
        rename = "Pagado",
        alias = "pagado",
        alias = "PAGADO",
        alias = "Paid",
        alias = "paid"
    )]
    Paid,
}

/// A monthly obligation that can be settled through a receipt line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPaymentPeriod {
    #[serde(alias = "Id", alias = "ID")]
    pub id: i64,
    #[serde(alias = "StudentId", alias = "estudianteId", alias = "EstudianteId")]
    pub student_id: i64,
    #[validate(range(min = 1, max = 12))]
    #[serde(alias = "Month", alias = "mes", alias = "Mes")]
    pub month: u32,
    #[serde(alias = "Year", alias = "anio", alias = "Anio")]
    pub year: i32,
    #[serde(alias = "Amount", alias = "monto", alias = "Monto")]
    pub amount: Money,
    #[serde(alias = "Status", alias = "estado", alias = "Estado")]
    pub status: PeriodStatus,
}

/// Spanish month name for `1..=12`.
pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
}

impl RecurringPaymentPeriod {
    /// Display label, e.g. `"Marzo 2025"`.
    pub fn label(&self) -> String {
        match month_name(self.month) {
            Some(name) => format!("{} {}", name, self.year),
            None => format!("{}/{}", self.month, self.year),
        }
    }

    /// Pending or overdue, i.e. still eligible to be billed.
    pub fn is_open(&self) -> bool {
        matches!(self.status, PeriodStatus::Pending | PeriodStatus::Overdue)
    }
}
