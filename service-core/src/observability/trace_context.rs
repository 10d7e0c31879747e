//! Outgoing request correlation for the billing backend.
//!
//! Every request carries a fresh `x-request-id` and, when an OpenTelemetry
//! span is active, W3C `traceparent`/`tracestate` headers.
//!
//! See: https://www.w3.org/TR/trace-context/

use opentelemetry::trace::TraceContextExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, Request, RequestBuilder, Response};
use std::time::Duration;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `traceparent` value of the current span, if it belongs to a valid trace.
pub fn current_traceparent() -> Option<String> {
    let context = Span::current().context();
    let span = context.span();
    let span_context = span.span_context();
    if !span_context.is_valid() {
        return None;
    }
    // version-trace_id-span_id-trace_flags
    Some(format!(
        "00-{}-{}-{:02x}",
        span_context.trace_id(),
        span_context.span_id(),
        span_context.trace_flags().to_u8()
    ))
}

/// Correlation headers for one outgoing request.
pub fn trace_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Some(value) = current_traceparent().and_then(|tp| HeaderValue::from_str(&tp).ok()) {
        headers.insert(TRACEPARENT_HEADER, value);

        let tracestate = Span::current().context().span().span_context().trace_state().header();
        if !tracestate.is_empty()
            && let Ok(value) = HeaderValue::from_str(&tracestate)
        {
            headers.insert(TRACESTATE_HEADER, value);
        }
    }

    if let Ok(value) = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    headers
}

/// Request id carried by a set of headers.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok())
}

/// A backend request that is stamped with correlation headers when sent.
pub struct TracedRequest {
    request: RequestBuilder,
}

impl TracedRequest {
    pub fn new(request: RequestBuilder) -> Self {
        Self { request }
    }

    pub fn json<T: serde::Serialize + ?Sized>(self, body: &T) -> Self {
        Self::new(self.request.json(body))
    }

    /// Bearer token, skipped when none is configured.
    pub fn token(self, token: Option<&str>) -> Self {
        match token {
            Some(token) => Self::new(self.request.bearer_auth(token)),
            None => self,
        }
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        Self::new(self.request.timeout(timeout))
    }

    /// Finish the request without sending it.
    pub fn build(self) -> Result<Request, reqwest::Error> {
        self.request.headers(trace_headers()).build()
    }

    pub async fn send(self) -> Result<Response, reqwest::Error> {
        let (client, request) = self.request.headers(trace_headers()).build_split();
        client.execute(request?).await
    }
}

pub trait TracedClientExt {
    fn traced(&self, method: Method, url: &str) -> TracedRequest;
}

impl TracedClientExt for Client {
    fn traced(&self, method: Method, url: &str) -> TracedRequest {
        TracedRequest::new(self.request(method, url))
    }
}
