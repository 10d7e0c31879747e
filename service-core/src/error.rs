use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

/// Error payload shapes returned by the backend.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(alias = "Message", alias = "mensaje")]
    message: Option<String>,
    #[serde(alias = "Error")]
    error: Option<String>,
}

impl AppError {
    /// Map a non-success HTTP response from a collaborator into an `AppError`.
    ///
    /// The backend reports failures as `{ "message": ... }` or `{ "error": ... }`;
    /// anything else is passed through as raw text.
    pub fn from_http_status(status: StatusCode, body: &str) -> Self {
        let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
        let message = parsed
            .message
            .or(parsed.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    body.trim().to_string()
                }
            });

        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                AppError::BadRequest(anyhow::anyhow!(message))
            }
            StatusCode::NOT_FOUND => AppError::NotFound(anyhow::anyhow!(message)),
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(anyhow::anyhow!(message)),
            StatusCode::FORBIDDEN => AppError::Forbidden(anyhow::anyhow!(message)),
            StatusCode::CONFLICT => AppError::Conflict(anyhow::anyhow!(message)),
            StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => AppError::BadGateway(message),
            StatusCode::SERVICE_UNAVAILABLE => AppError::ServiceUnavailable,
            _ => AppError::InternalError(anyhow::anyhow!("HTTP {}: {}", status.as_u16(), message)),
        }
    }

    /// True for failures caused by the network or the collaborator being down,
    /// as opposed to the collaborator rejecting the request.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::BadGateway(_) | AppError::ServiceUnavailable | AppError::InternalError(_)
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::InternalError(anyhow::anyhow!(
                "Malformed response from backend: {}",
                err
            ));
        }
        if let Some(status) = err.status() {
            return AppError::from_http_status(status, &err.to_string());
        }
        AppError::BadGateway(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_uses_message_field() {
        let err = AppError::from_http_status(
            StatusCode::NOT_FOUND,
            r#"{"message":"Recibo no encontrado"}"#,
        );
        match err {
            AppError::NotFound(e) => assert_eq!(e.to_string(), "Recibo no encontrado"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_error_field_and_casing_are_accepted() {
        let err = AppError::from_http_status(StatusCode::BAD_REQUEST, r#"{"Error":"monto invalido"}"#);
        assert!(matches!(err, AppError::BadRequest(ref e) if e.to_string() == "monto invalido"));
    }

    #[test]
    fn test_plain_text_body_is_kept() {
        let err = AppError::from_http_status(StatusCode::CONFLICT, "stale receipt");
        assert!(matches!(err, AppError::Conflict(ref e) if e.to_string() == "stale receipt"));
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = AppError::from_http_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(err.is_transient());
        assert!(err.to_string().contains("500"));

        let err = AppError::from_http_status(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(matches!(err, AppError::ServiceUnavailable));

        let err = AppError::from_http_status(StatusCode::FORBIDDEN, "");
        assert!(!err.is_transient());
    }
}
