//! Application error carried through every layer and rendered as the JSON envelope.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use relaygate_types::error::{ErrorCategory, ErrorCode, ErrorResponse};
use relaygate_types::models::TokenValidationError;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::ValidationErrors;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Typed failure: stable code, HTTP status, message, optional cause, detail map.
///
/// Immutable apart from the additive builders [`AppError::with_detail`] and
/// [`AppError::with_cause`].
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AppError {
    code: ErrorCode,
    message: String,
    status: StatusCode,
    details: BTreeMap<String, Value>,
    #[source]
    cause: Option<BoxError>,
}

/// Result type alias for RelayGate operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = StatusCode::from_u16(code.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { code, message: message.into(), status, details: BTreeMap::new(), cause: None }
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &BTreeMap<String, Value> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn to_response_body(&self) -> ErrorResponse {
        ErrorResponse::new(self.code, self.message.clone(), self.details.clone())
    }

    // Constructors for the common cases

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn config_not_found(id: &str) -> Self {
        Self::new(ErrorCode::ConfigNotFound, "proxy config not found").with_detail("config_id", id)
    }

    pub fn token_not_found(id: &str) -> Self {
        Self::new(ErrorCode::TokenNotFound, "access token not found").with_detail("token_id", id)
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("{field} is required")).with_detail("field", field)
    }

    pub fn invalid_proxy_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidProxyConfig, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Transport-level forward failure. Never retried by the gateway.
    pub fn proxy_failed(target_host: &str, cause: reqwest::Error) -> Self {
        let timed_out = cause.is_timeout();
        let message =
            if timed_out { "upstream request timed out" } else { "upstream request failed" };
        let err = Self::new(ErrorCode::ProxyFailed, message).with_detail("target_host", target_host);
        let err = if timed_out { err.with_detail("timeout", true) } else { err };
        err.with_cause(cause)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = serde_json::Map::new();
        let mut first = None;
        for (field, errs) in errors.field_errors() {
            let messages: Vec<Value> = errs
                .iter()
                .map(|e| {
                    Value::String(
                        e.message.as_ref().map_or_else(|| e.code.to_string(), ToString::to_string),
                    )
                })
                .collect();
            if first.is_none() {
                first = messages.first().and_then(Value::as_str).map(|m| format!("{field}: {m}"));
            }
            fields.insert(field.to_string(), Value::Array(messages));
        }
        Self::new(ErrorCode::ValidationFailed, first.unwrap_or_else(|| "validation failed".into()))
            .with_detail("fields", Value::Object(fields))
    }
}

impl From<TokenValidationError> for AppError {
    fn from(err: TokenValidationError) -> Self {
        Self::validation(err.field(), err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let code = match &rejection {
            JsonRejection::JsonDataError(_) => ErrorCode::InvalidInput,
            _ => ErrorCode::InvalidFormat,
        };
        Self::new(code, rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(ErrorCode::InvalidInput, rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.code.category() {
            ErrorCategory::System if self.status.is_server_error() => {
                tracing::error!(
                    code = %self.code,
                    cause = ?self.cause,
                    "{}",
                    self.message
                );
            },
            _ if self.status.is_server_error() => {
                tracing::warn!(code = %self.code, cause = ?self.cause, "{}", self.message);
            },
            _ => {
                tracing::debug!(code = %self.code, "{}", self.message);
            },
        }
        (self.status, Json(self.to_response_body())).into_response()
    }
}
