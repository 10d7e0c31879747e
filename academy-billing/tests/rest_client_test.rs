//! REST backend tests against a mock HTTP server.

mod common;

use academy_billing::config::ApiSettings;
use academy_billing::models::{LineKind, NewPayment, PeriodStatus, ReceiptStatus};
use academy_billing::services::{BillingBackend, RestBackend};
use common::{cash, m, persisted, service_line, student_receipt};
use secrecy::Secret;
use serde_json::json;
use service_core::error::AppError;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer, token: Option<&str>) -> ApiSettings {
    common::init_observability();
    ApiSettings {
        base_url: format!("{}/api/", server.uri()),
        access_token: token.map(|t| Secret::new(t.to_string())),
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn create_receipt_returns_draft_with_assigned_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/receipts"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "Id": 41 })))
        .expect(1)
        .mount(&server)
        .await;
    let backend = RestBackend::new(&settings(&server, Some("secret-token")));

    let mut draft = student_receipt();
    draft.add_line(service_line("80.00", 1)).unwrap();
    let created = backend.create_receipt(&draft).await.unwrap();

    assert_eq!(created.id(), Some(41));
    assert_eq!(created.lines(), draft.lines());
}

#[tokio::test]
async fn create_payment_sends_canonical_body_and_reads_spanish_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/payments"))
        .and(body_json(json!({
            "receiptId": 41,
            "amount": "70.00",
            "methodId": 1,
            "date": "2025-03-10"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": 5,
            "ReciboId": 41,
            "Monto": 70.0,
            "MetodoPagoId": 1,
            "Fecha": "2025-03-10"
        })))
        .expect(1)
        .mount(&server)
        .await;
    let backend = RestBackend::new(&settings(&server, None));

    let payment = backend
        .create_payment(&NewPayment::from_request(41, &cash("70.00")))
        .await
        .unwrap();

    assert_eq!(payment.id, 5);
    assert_eq!(payment.amount, m("70.00"));
}

#[tokio::test]
async fn mark_period_paid_puts_receipt_id() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/payment-periods/7/paid"))
        .and(body_json(json!({ "receiptId": 41 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let backend = RestBackend::new(&settings(&server, None));

    backend.mark_period_paid(7, 41).await.unwrap();
}

#[tokio::test]
async fn pending_periods_and_catalog_normalise_casing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/students/12/payment-periods/pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Id": 7, "EstudianteId": 12, "Mes": 3, "Anio": 2025, "Monto": "50.00", "Estado": "PENDIENTE" },
            { "id": 8, "studentId": 12, "month": 4, "year": 2025, "amount": 50, "status": "vencido" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Id": 4, "Nombre": "Camiseta", "Precio": 12.5 }
        ])))
        .mount(&server)
        .await;
    let backend = RestBackend::new(&settings(&server, None));

    let periods = backend.get_pending_periods(12).await.unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0].status, PeriodStatus::Pending);
    assert_eq!(periods[0].label(), "Marzo 2025");
    assert_eq!(periods[1].status, PeriodStatus::Overdue);

    let products = backend.get_catalog(LineKind::Product).await.unwrap();
    assert_eq!(products[0].name, "Camiseta");
    assert_eq!(products[0].price, m("12.50"));
    assert!(products[0].active);
}

#[tokio::test]
async fn update_and_get_receipt_round_trip() {
    let server = MockServer::start().await;
    let mut receipt = persisted(41, vec![service_line("45.50", 1)]);
    receipt.void().unwrap();
    let stored = serde_json::to_value(&receipt).unwrap();

    Mock::given(method("PUT"))
        .and(path("/api/receipts/41"))
        .and(body_json(stored.clone()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/receipts/41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(stored))
        .mount(&server)
        .await;
    let backend = RestBackend::new(&settings(&server, None));

    backend.update_receipt(41, &receipt).await.unwrap();
    let fetched = backend.get_receipt(41).await.unwrap();

    assert_eq!(fetched.status(), ReceiptStatus::Voided);
    assert_eq!(fetched.balance(), m("45.50"));
}

#[tokio::test]
async fn error_status_maps_to_app_error_with_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/receipts/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "mensaje": "Recibo no encontrado" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/payment-methods"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let backend = RestBackend::new(&settings(&server, None));

    match backend.get_receipt(99).await {
        Err(AppError::NotFound(e)) => assert_eq!(e.to_string(), "Recibo no encontrado"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
    assert!(matches!(
        backend.get_payment_methods().await,
        Err(AppError::ServiceUnavailable)
    ));
}

#[tokio::test]
async fn malformed_body_is_an_internal_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    let backend = RestBackend::new(&settings(&server, None));

    let result = backend.get_catalog(LineKind::Service).await;
    assert!(matches!(result, Err(AppError::InternalError(_))));

    let exposition = academy_billing::services::metrics::get_metrics();
    assert!(exposition.contains("academy_billing_backend_request_duration_seconds"));
}

#[tokio::test]
async fn unreachable_backend_is_a_bad_gateway() {
    common::init_observability();
    let settings = ApiSettings {
        base_url: "http://127.0.0.1:9".to_string(),
        access_token: None,
        timeout_secs: 2,
    };
    let backend = RestBackend::new(&settings);

    let result = backend.get_payment_methods().await;
    assert!(matches!(result, Err(AppError::BadGateway(_))));
    assert!(result.unwrap_err().is_transient());
}
