//! Test helpers for relaygate-server unit tests.

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use relaygate_types::models::GatewayConfig;
use tempfile::TempDir;

use crate::router::build_router;
use crate::state::AppState;

pub const TEST_ADMIN_KEY: &str = "test-admin-key";

pub fn test_settings(dir: &TempDir) -> GatewayConfig {
    GatewayConfig {
        admin_key: TEST_ADMIN_KEY.to_string(),
        static_dir: dir.path().join("public").to_string_lossy().into_owned(),
        data_file: Some(dir.path().join("configs.json")),
        ..Default::default()
    }
}

/// Create a minimal `AppState` for testing.
///
/// Returns `(AppState, TempDir)`; keep `TempDir` alive for the test duration.
pub fn test_app_state() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let state = test_app_state_with(test_settings(&temp_dir));
    (state, temp_dir)
}

pub fn test_app_state_with(settings: GatewayConfig) -> AppState {
    AppState::from_settings(settings).expect("failed to create test AppState")
}

fn write_index(state: &AppState) {
    let public = std::path::Path::new(&state.settings().static_dir).to_path_buf();
    std::fs::create_dir_all(&public).expect("failed to create static dir");
    std::fs::write(public.join("index.html"), "<html>relaygate</html>")
        .expect("failed to write index.html");
}

/// Full router behind an in-memory transport, with a static dir holding `index.html`.
pub fn test_server(state: AppState) -> TestServer {
    write_index(&state);
    TestServer::new(build_router(state)).expect("failed to start test server")
}

/// Same router on a real loopback socket, so handlers see the peer address.
pub fn test_http_server(state: AppState) -> TestServer {
    write_index(&state);
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
    TestServer::builder().http_transport().build(app).expect("failed to start test server")
}

/// Attach the test admin key.
pub fn authed(request: TestRequest) -> TestRequest {
    request.add_header(
        HeaderName::from_static("x-admin-key"),
        HeaderValue::from_static(TEST_ADMIN_KEY),
    )
}
