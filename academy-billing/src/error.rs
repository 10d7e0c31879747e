//! Error taxonomy for the billing model.

use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillingError {
    /// Bad input: negative or over-limit amounts, missing required selection.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation attempted on a receipt in a terminal or wrong state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The backend call failed.
    #[error("Backend error: {0}")]
    Collaborator(#[from] AppError),
}

impl BillingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BillingError::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        BillingError::InvalidState(msg.into())
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            BillingError::Validation(_) => "validation_error",
            BillingError::InvalidState(_) => "invalid_state",
            BillingError::Collaborator(_) => "collaborator_error",
        }
    }
}

impl From<validator::ValidationErrors> for BillingError {
    fn from(err: validator::ValidationErrors) -> Self {
        BillingError::Validation(err.to_string())
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            BillingError::InvalidState(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            BillingError::Collaborator(inner) => inner,
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
