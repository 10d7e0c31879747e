//! Domain models for academy-billing.

mod catalog;
mod line;
mod money;
mod payment;
mod period;
mod receipt;

pub use catalog::{CatalogItem, PaymentMethod};
pub use line::{LineKind, ReceiptLine};
pub use money::Money;
pub use payment::{
    NewPayment, Payment, PaymentOutcome, PaymentRequest, PeriodSettlementFailure,
    SettlementReport,
};
pub use period::{month_name, PeriodStatus, RecurringPaymentPeriod};
pub use receipt::{
    Receipt, ReceiptStatus, ReceiptSummary, ReceiptTotals, Recipient, RecipientType,
};
