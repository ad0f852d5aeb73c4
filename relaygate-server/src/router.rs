//! Top-level HTTP surface.
//!
//! Every request goes through [`classify`] first; the route kind decides
//! whether it is forwarded, authenticated into the admin API, answered as a
//! probe or served from the static directory.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Request},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceExt;
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::api;
use crate::state::AppState;
use relaygate_core::proxy::middleware::cors_middleware;
use relaygate_core::proxy::{classify, RouteKind};

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.settings().static_dir.clone();
    let body_limit = state.settings().max_body_bytes;

    let api = Router::new()
        .nest("/api", api::router())
        .fallback(api::not_found)
        .with_state(state.clone());

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/version", get(version_info));

    // SPA fallback: unknown static paths serve index.html
    let index_path = format!("{}/index.html", static_dir);
    let statics = Router::new().fallback_service(
        ServeDir::new(&static_dir)
            .append_index_html_on_directories(true)
            .fallback(ServeFile::new(&index_path)),
    );

    let dispatcher = Arc::new(Dispatcher { state, api, public, statics });

    Router::new()
        .fallback(move |request: Request| {
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.dispatch(request).await }
        })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors_middleware))
}

struct Dispatcher {
    state: AppState,
    api: Router,
    public: Router,
    statics: Router,
}

impl Dispatcher {
    async fn dispatch(&self, request: Request) -> Response {
        let host = request_host(&request);
        let gateway = self.state.gateway();
        let kind = classify(request.method(), request.uri().path(), host.as_deref(), |label| {
            gateway.is_tenant(label)
        });

        match kind {
            RouteKind::Preflight => StatusCode::OK.into_response(),
            RouteKind::Proxy { tenant } => gateway.handle(tenant.as_deref(), request).await,
            RouteKind::Admin | RouteKind::Token => {
                let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|c| c.0.ip());
                let ip = self.state.admin().client_ip(request.headers(), peer);
                match self.state.admin().authorize(request.headers(), ip) {
                    Ok(()) => serve(&self.api, request).await,
                    Err(e) => e.into_response(),
                }
            },
            RouteKind::Public => serve(&self.public, request).await,
            RouteKind::Static => serve(&self.statics, request).await,
        }
    }
}

async fn serve(router: &Router, request: Request) -> Response {
    match router.clone().oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// `Host` header, or the URI authority for HTTP/2.
fn request_host(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(serde_json::json!({"status": "ok"})))
}

async fn version_info() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({
            "version": option_env!("GIT_VERSION").unwrap_or("dev"),
            "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
            "cargo_version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
