//! The HTTP error boundary.
//!
//! Handlers return `Result<_, ApiError>`; this is the only place a
//! `VaultError` becomes a response. Every failure is a JSON envelope
//!
//! ```json
//! {"error": {"message": "...", "meta": null, "codeError": "NOT_FOUND", "statusCode": 404}}
//! ```
//!
//! with the message repeated in the `X-Err-Message` header.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::VaultError;

pub const ERR_MESSAGE_HEADER: &str = "x-err-message";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    #[serde(default)]
    pub meta: Option<Value>,
    pub code_error: String,
    pub status_code: u16,
}

/// A `VaultError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub VaultError);

impl From<VaultError> for ApiError {
    fn from(e: VaultError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorBody {
                message: self.0.to_string(),
                meta: None,
                code_error: self.0.code().to_string(),
                status_code: self.0.status_code(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        let status = StatusCode::from_u16(envelope.error.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let header = header_safe(&envelope.error.message);

        let mut response = (status, Json(envelope)).into_response();
        if let Ok(value) = HeaderValue::from_str(&header) {
            response.headers_mut().insert(ERR_MESSAGE_HEADER, value);
        }
        response
    }
}

/// Header values must be visible ASCII; everything else becomes `?`.
fn header_safe(message: &str) -> String {
    message
        .chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_code_and_status() {
        let err = ApiError(VaultError::Authorization("Error verify sign".into()));
        let env = err.envelope();
        assert_eq!(env.error.message, "Error verify sign");
        assert_eq!(env.error.code_error, "AUTHORIZATION_ERROR");
        assert_eq!(env.error.status_code, 401);

        let json = serde_json::to_value(&env).unwrap();
        assert!(json["error"].get("codeError").is_some());
        assert!(json["error"].get("statusCode").is_some());
    }

    #[test]
    fn response_sets_status_and_header() {
        let res = ApiError(VaultError::NotFound("Cannot found vault".into())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            res.headers().get(ERR_MESSAGE_HEADER).unwrap(),
            "Cannot found vault"
        );
    }

    #[test]
    fn non_ascii_messages_are_header_safe() {
        assert_eq!(header_safe("a — b\n"), "a ? b?");
        let res = ApiError(VaultError::MissingKey).into_response();
        assert!(res.headers().get(ERR_MESSAGE_HEADER).is_some());
    }
}
