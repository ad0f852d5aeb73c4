//! Tenant config handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use relaygate_core::{AppError, AppResult};
use relaygate_types::models::{
    BatchOperationResult, BatchRequest, ConfigFilter, ConfigListResponse, CreateConfigRequest,
    ExportData, ImportRequest, ImportResult, ProxyConfig, UpdateConfigRequest,
};

use super::{ApiJson, ApiQuery, ApiResponse};
use crate::state::AppState;

pub async fn list_configs(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ConfigFilter>,
) -> Json<ApiResponse<ConfigListResponse>> {
    ApiResponse::ok(state.store().list(&filter))
}

pub async fn create_config(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateConfigRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProxyConfig>>)> {
    let config = state.store().add(payload)?;
    Ok((StatusCode::CREATED, ApiResponse::with_message(config, "config created")))
}

pub async fn get_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProxyConfig>>> {
    let config = state.store().get(&id).ok_or_else(|| AppError::config_not_found(&id))?;
    Ok(ApiResponse::ok(config))
}

pub async fn update_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateConfigRequest>,
) -> AppResult<Json<ApiResponse<ProxyConfig>>> {
    let config = state.store().update(&id, payload)?;
    Ok(ApiResponse::with_message(config, "config updated"))
}

pub async fn delete_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProxyConfig>>> {
    let config = state.store().delete(&id)?;
    Ok(ApiResponse::with_message(config, "config deleted"))
}

pub async fn export_configs(State(state): State<AppState>) -> Json<ApiResponse<ExportData>> {
    ApiResponse::ok(state.store().export())
}

pub async fn import_configs(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ImportRequest>,
) -> AppResult<Json<ApiResponse<ImportResult>>> {
    let result = state.store().import(payload)?;
    let message = format!(
        "imported {}, skipped {}, failed {}",
        result.imported_count, result.skipped_count, result.error_count
    );
    Ok(ApiResponse::with_message(result, message))
}

pub async fn batch_configs(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BatchRequest>,
) -> AppResult<Json<ApiResponse<BatchOperationResult>>> {
    Ok(ApiResponse::ok(state.store().batch(payload)?))
}
