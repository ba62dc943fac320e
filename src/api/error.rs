use reqwest::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your internet connection.";

/// Every failure a gateway call can end in.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response was obtained: offline, DNS failure, refused connection or timeout.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network { reason: String },

    /// The backend answered with a non-2xx status. `body` is passed through as sent.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: Value },

    /// The caller aborted the request.
    #[error("Request cancelled: {0}")]
    Cancelled(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl GatewayError {
    /// Normalizes a failure reported by `reqwest` while sending or reading a
    /// request. No response was received, so every such failure is a network
    /// error, including requests that could not even be built.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_builder() {
            error!("Network Error: request could not be built: {}", err);
        } else {
            error!("Network Error: {}", err);
        }
        GatewayError::Network {
            reason: err.to_string(),
        }
    }

    /// Builds the error for a response with a non-success status, logging
    /// operator diagnostics for it first.
    pub(crate) fn from_response(status: StatusCode, body: Value) -> Self {
        log_http_error(status, &body);
        GatewayError::Http {
            status: status.as_u16(),
            body,
        }
    }

    /// The error in the shape callers display: a `message` object for network
    /// failures and cancellations, the backend body for HTTP errors.
    pub fn payload(&self) -> Value {
        match self {
            GatewayError::Http { body, .. } => body.clone(),
            GatewayError::Network { .. } => json!({ "message": NETWORK_ERROR_MESSAGE }),
            GatewayError::Cancelled(reason) => json!({ "message": reason, "cancelled": true }),
            other => json!({ "message": other.to_string() }),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, GatewayError::Network { .. })
    }
}

fn log_http_error(status: StatusCode, body: &Value) {
    match status.as_u16() {
        401 => warn!("Authentication Error: {}", body),
        403 => warn!("Authorization Error: {}", body),
        404 => warn!("Resource Not Found: {}", body),
        429 => warn!("Rate Limit Exceeded: {}", body),
        500 => error!("Server Error: {}", body),
        code if status.is_server_error() => error!("HTTP Error {}: {}", code, body),
        code => warn!("HTTP Error {}: {}", code, body),
    }
}

/// Interprets a response body: empty is `null`, JSON is parsed, anything else
/// is kept as a string.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_payload() {
        let err = GatewayError::Network {
            reason: "connection refused".to_string(),
        };
        assert!(err.is_network());
        assert_eq!(err.payload(), json!({ "message": NETWORK_ERROR_MESSAGE }));
        assert_eq!(err.to_string(), NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn test_http_error_passes_body_through() {
        let body = json!({ "error": "Participant not found", "code": "P404" });
        let err = GatewayError::from_response(StatusCode::NOT_FOUND, body.clone());
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.payload(), body);
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_logging_does_not_change_shape() {
        for code in [401u16, 403, 404, 429, 500, 502, 418] {
            let status = StatusCode::from_u16(code).unwrap();
            let err = GatewayError::from_response(status, json!("boom"));
            assert_eq!(err.status(), Some(code));
            assert_eq!(err.payload(), json!("boom"));
        }
    }

    #[test]
    fn test_cancelled_payload() {
        let err = GatewayError::Cancelled("superseded".to_string());
        assert!(err.is_cancelled());
        assert_eq!(err.payload(), json!({ "message": "superseded", "cancelled": true }));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("  \n"), Value::Null);
        assert_eq!(parse_body(r#"{"ok":true}"#), json!({ "ok": true }));
        assert_eq!(parse_body("Internal Server Error"), json!("Internal Server Error"));
    }
}
