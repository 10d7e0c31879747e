pub mod backend;
pub mod metrics;
pub mod payment_engine;
pub mod period_matching;
pub mod receipts;
pub mod rest_client;

pub use backend::BillingBackend;
pub use payment_engine::PaymentEngine;
pub use period_matching::{attach_period_as_line, attach_periods, PeriodMatcher};
pub use receipts::{IssuedReceipt, ReceiptService};
pub use rest_client::RestBackend;
