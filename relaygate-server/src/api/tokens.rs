//! Access token handlers. The raw secret only appears in the create response.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use relaygate_core::AppResult;
use relaygate_types::models::{CreateTokenRequest, CreatedToken, TokenInfo, UpdateTokenRequest};

use super::{ApiJson, ApiResponse};
use crate::state::AppState;

pub async fn list_tokens(
    State(state): State<AppState>,
    Path(config_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<TokenInfo>>>> {
    Ok(ApiResponse::ok(state.store().list_tokens(&config_id)?))
}

pub async fn create_token(
    State(state): State<AppState>,
    Path(config_id): Path<String>,
    ApiJson(payload): ApiJson<CreateTokenRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreatedToken>>)> {
    let created = state.store().create_token(&config_id, payload, state.gateway().hasher())?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(created, "store this token now, it will not be shown again"),
    ))
}

pub async fn update_token(
    State(state): State<AppState>,
    Path((config_id, token_id)): Path<(String, String)>,
    ApiJson(payload): ApiJson<UpdateTokenRequest>,
) -> AppResult<Json<ApiResponse<TokenInfo>>> {
    let info = state.store().update_token(&config_id, &token_id, payload)?;
    Ok(ApiResponse::with_message(info, "token updated"))
}

pub async fn delete_token(
    State(state): State<AppState>,
    Path((config_id, token_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Option<()>>>> {
    state.store().delete_token(&config_id, &token_id)?;
    Ok(ApiResponse::with_message(None, "token deleted"))
}
