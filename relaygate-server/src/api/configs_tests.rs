#![allow(clippy::unwrap_used, reason = "test assertions")]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use relaygate_types::models::{
    BatchAction, BatchRequest, ConfigFilter, CreateConfigRequest, ImportRequest, TargetProtocol,
    UpdateConfigRequest,
};
use relaygate_types::ErrorCode;

use super::configs::{
    batch_configs, create_config, delete_config, export_configs, get_config, import_configs,
    list_configs, update_config,
};
use super::{ApiJson, ApiQuery};
use crate::test_helpers::{test_app_state, test_app_state_with, test_settings};

fn create_req(subdomain: &str) -> CreateConfigRequest {
    CreateConfigRequest {
        name: format!("{subdomain} tenant"),
        subdomain: subdomain.to_string(),
        target_url: format!("{subdomain}.upstream.example.com"),
        protocol: TargetProtocol::Https,
        enabled: true,
        default_proxy: None,
        description: None,
    }
}

#[tokio::test]
async fn test_create_then_get() {
    let (state, _tmp) = test_app_state();
    let (status, Json(created)) =
        create_config(State(state.clone()), ApiJson(create_req("shop"))).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.success);
    assert_eq!(created.data.subdomain, "shop");

    let Json(fetched) = get_config(State(state), Path(created.data.id.clone())).await.unwrap();
    assert_eq!(fetched.data, created.data);
}

#[tokio::test]
async fn test_get_unknown_is_config_not_found() {
    let (state, _tmp) = test_app_state();
    let err = get_config(State(state), Path("missing".to_string())).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigNotFound);
}

#[tokio::test]
async fn test_duplicate_subdomain_conflicts() {
    let (state, _tmp) = test_app_state();
    let (status, _) =
        create_config(State(state.clone()), ApiJson(create_req("shop"))).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let err = create_config(State(state), ApiJson(create_req("SHOP"))).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateSubdomain);
    assert_eq!(err.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_filters_and_pages() {
    let (state, _tmp) = test_app_state();
    for sub in ["alpha", "beta", "gamma"] {
        let (status, _) =
            create_config(State(state.clone()), ApiJson(create_req(sub))).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    let filter = ConfigFilter { search: Some("ALP".to_string()), ..Default::default() };
    let Json(page) = list_configs(State(state.clone()), ApiQuery(filter)).await;
    assert_eq!(page.data.total, 1);
    assert_eq!(page.data.configs[0].subdomain, "alpha");

    let filter = ConfigFilter { limit: Some(2), page: Some(2), ..Default::default() };
    let Json(page) = list_configs(State(state), ApiQuery(filter)).await;
    assert_eq!(page.data.total, 3);
    assert_eq!(page.data.total_pages, 2);
    assert_eq!(page.data.configs.len(), 1);
}

#[tokio::test]
async fn test_update_and_delete() {
    let (state, _tmp) = test_app_state();
    let (_, Json(created)) =
        create_config(State(state.clone()), ApiJson(create_req("shop"))).await.unwrap();
    let id = created.data.id;

    let update = UpdateConfigRequest { enabled: Some(false), ..Default::default() };
    let Json(updated) =
        update_config(State(state.clone()), Path(id.clone()), ApiJson(update)).await.unwrap();
    assert!(!updated.data.enabled);
    assert_eq!(updated.message.as_deref(), Some("config updated"));

    let Json(deleted) = delete_config(State(state.clone()), Path(id.clone())).await.unwrap();
    assert!(deleted.success);
    let err = delete_config(State(state), Path(id)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigNotFound);
}

#[tokio::test]
async fn test_batch_reports_per_id() {
    let (state, _tmp) = test_app_state();
    let (_, Json(created)) =
        create_config(State(state.clone()), ApiJson(create_req("shop"))).await.unwrap();

    let req = BatchRequest {
        action: BatchAction::Disable,
        ids: vec![created.data.id.clone(), "ghost".to_string()],
    };
    let Json(result) = batch_configs(State(state.clone()), ApiJson(req)).await.unwrap();
    assert_eq!(result.data.success_count, 1);
    assert_eq!(result.data.failed_count, 1);
    assert_eq!(result.data.failed[0].id, "ghost");
    assert!(!state.store().get(&created.data.id).unwrap().enabled);

    let empty = BatchRequest { action: BatchAction::Delete, ids: Vec::new() };
    let err = batch_configs(State(state), ApiJson(empty)).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn test_export_import_into_fresh_state() {
    let (source, _tmp) = test_app_state();
    let (_, Json(created)) =
        create_config(State(source.clone()), ApiJson(create_req("shop"))).await.unwrap();
    let Json(exported) = export_configs(State(source)).await;
    assert_eq!(exported.data.total_count, 1);

    let other = tempfile::TempDir::new().unwrap();
    let target = test_app_state_with(test_settings(&other));
    let Json(result) =
        import_configs(State(target.clone()), ApiJson(ImportRequest::from(exported.data)))
            .await
            .unwrap();
    assert_eq!(result.data.imported_count, 1);
    assert_eq!(result.data.error_count, 0);

    let restored = target.store().get(&created.data.id).unwrap();
    assert_eq!(restored.subdomain, "shop");
}

#[tokio::test]
async fn test_mutations_survive_restart() {
    let tmp = tempfile::TempDir::new().unwrap();
    let id = {
        let state = test_app_state_with(test_settings(&tmp));
        let (_, Json(created)) =
            create_config(State(state), ApiJson(create_req("shop"))).await.unwrap();
        created.data.id
    };

    let reopened = test_app_state_with(test_settings(&tmp));
    assert_eq!(reopened.store().get(&id).unwrap().subdomain, "shop");
}
