//! API Routes
//!
//! Admin surface for tenant configs, their access tokens and gateway metrics.
//! Authentication happens in the dispatcher before a request reaches here.

mod configs;
mod metrics;
mod tokens;

#[cfg(test)]
mod configs_tests;
#[cfg(test)]
mod metrics_tests;

use axum::{
    extract::{FromRequest, FromRequestParts},
    routing::{get, post, put},
    Json, Router,
};
use relaygate_core::AppError;
use relaygate_types::ErrorCode;
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Tenant configs
        .route("/configs", get(configs::list_configs).post(configs::create_config))
        .route("/configs/export", get(configs::export_configs))
        .route("/configs/import", post(configs::import_configs))
        .route("/configs/batch", post(configs::batch_configs))
        .route(
            "/configs/:id",
            get(configs::get_config).put(configs::update_config).delete(configs::delete_config),
        )
        // Access tokens
        .route("/configs/:id/tokens", get(tokens::list_tokens).post(tokens::create_token))
        .route(
            "/configs/:id/tokens/:token_id",
            put(tokens::update_token).delete(tokens::delete_token),
        )
        // Metrics
        .route("/metrics", get(metrics::get_snapshot))
        .route("/metrics/health", get(metrics::get_health))
        .route("/metrics/reset", post(metrics::reset_metrics))
        .route("/metrics/prometheus", get(metrics::get_prometheus))
}

/// Unknown path under `/api`, reached only after admin auth.
pub async fn not_found() -> AppError {
    AppError::new(ErrorCode::NotFound, "endpoint not found")
}

/// `{success: true, data, message?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data, message: None })
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self { success: true, data, message: Some(message.into()) })
    }
}

/// JSON body whose rejections render as the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string whose rejections render as the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
