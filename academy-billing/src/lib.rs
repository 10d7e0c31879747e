//! Receipt, payment (abono) and recurring-period billing for the academy
//! back-office.
//!
//! [`models`] holds the pure financial model. [`services`] wires it to the
//! REST backend through [`services::BillingBackend`].

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use error::{BillingError, Result};
