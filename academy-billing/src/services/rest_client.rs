//! `BillingBackend` over the academy's REST API.

use super::backend::BillingBackend;
use super::metrics;
use crate::config::ApiSettings;
use crate::models::{
    CatalogItem, LineKind, NewPayment, Payment, PaymentMethod, Receipt, RecurringPaymentPeriod,
};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::observability::{TracedClientExt, TracedRequest};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    access_token: Option<Secret<String>>,
    timeout: Duration,
}

/// The create-receipt response; only the assigned id is read.
#[derive(Debug, Deserialize)]
struct CreatedReceipt {
    #[serde(alias = "Id", alias = "ID", alias = "reciboId", alias = "ReciboId")]
    id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkPeriodPaid {
    receipt_id: i64,
}

impl RestBackend {
    pub fn new(settings: &ApiSettings) -> Self {
        Self::with_client(Client::new(), settings)
    }

    pub fn with_client(client: Client, settings: &ApiSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            access_token: settings.access_token.clone(),
            timeout: settings.timeout(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn prepare(&self, request: TracedRequest) -> TracedRequest {
        request
            .token(self.access_token.as_ref().map(|t| t.expose_secret().as_str()))
            .timeout(self.timeout)
    }

    /// Send a request, recording duration and outcome under `operation`.
    async fn execute(&self, operation: &str, request: TracedRequest) -> Result<String, AppError> {
        let start = Instant::now();
        let result = self.send_and_read(request).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(_) => metrics::record_backend_request(operation, "success", elapsed),
            Err(e) => {
                metrics::record_backend_request(operation, "error", elapsed);
                metrics::record_error("backend_error", operation);
                warn!(operation, error = %e, "Backend request failed");
            }
        }
        result
    }

    async fn send_and_read(&self, request: TracedRequest) -> Result<String, AppError> {
        let response: Response = self.prepare(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(status = %status, "Backend response");

        if status.is_success() {
            Ok(body)
        } else {
            Err(AppError::from_http_status(status, &body))
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T, AppError> {
        let body = self
            .execute(operation, self.client.traced(Method::GET, &self.url(path)))
            .await?;
        parse(&body)
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, AppError> {
    serde_json::from_str(body)
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Malformed response from backend: {}", e)))
}

#[async_trait]
impl BillingBackend for RestBackend {
    #[instrument(skip(self, receipt))]
    async fn create_receipt(&self, receipt: &Receipt) -> Result<Receipt, AppError> {
        let request = self.client.traced(Method::POST, &self.url("/receipts")).json(receipt);
        let body = self.execute("create_receipt", request).await?;
        let created: CreatedReceipt = parse(&body)?;

        info!(receipt_id = created.id, "Receipt created");
        Ok(receipt.clone().persisted_as(created.id))
    }

    #[instrument(skip(self))]
    async fn get_receipt(&self, receipt_id: i64) -> Result<Receipt, AppError> {
        self.fetch("get_receipt", &format!("/receipts/{}", receipt_id))
            .await
    }

    #[instrument(skip(self, receipt))]
    async fn update_receipt(&self, receipt_id: i64, receipt: &Receipt) -> Result<(), AppError> {
        let request = self
            .client
            .traced(Method::PUT, &self.url(&format!("/receipts/{}", receipt_id)))
            .json(receipt);
        self.execute("update_receipt", request).await?;

        info!(receipt_id, status = receipt.status().as_str(), "Receipt updated");
        Ok(())
    }

    #[instrument(skip(self, payment), fields(receipt_id = payment.receipt_id))]
    async fn create_payment(&self, payment: &NewPayment) -> Result<Payment, AppError> {
        let request = self.client.traced(Method::POST, &self.url("/payments")).json(payment);
        let body = self.execute("create_payment", request).await?;
        let created: Payment = parse(&body)?;

        info!(
            payment_id = created.id,
            receipt_id = created.receipt_id,
            amount = %created.amount,
            "Payment created"
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn mark_period_paid(&self, period_id: i64, receipt_id: i64) -> Result<(), AppError> {
        let request = self
            .client
            .traced(Method::PUT, &self.url(&format!("/payment-periods/{}/paid", period_id)))
            .json(&MarkPeriodPaid { receipt_id });
        self.execute("mark_period_paid", request).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_pending_periods(
        &self,
        student_id: i64,
    ) -> Result<Vec<RecurringPaymentPeriod>, AppError> {
        self.fetch(
            "get_pending_periods",
            &format!("/students/{}/payment-periods/pending", student_id),
        )
        .await
    }

    #[instrument(skip(self, kind), fields(kind = kind.as_str()))]
    async fn get_catalog(&self, kind: LineKind) -> Result<Vec<CatalogItem>, AppError> {
        let path = match kind {
            LineKind::Service => "/services",
            LineKind::Product => "/products",
        };
        self.fetch("get_catalog", path).await
    }

    #[instrument(skip(self))]
    async fn get_payment_methods(&self) -> Result<Vec<PaymentMethod>, AppError> {
        self.fetch("get_payment_methods", "/payment-methods").await
    }
}
