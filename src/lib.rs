pub mod auth;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod state;
pub mod stores;
pub mod sweeper;
pub mod workspace;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::backend::BackendFactory;
use crate::config::Config;
use crate::middleware::route_guard::guard_navigation;
use crate::navigation::RouteTable;
use crate::state::{AppState, SharedState};
use crate::workspace::WorkspaceRegistry;

pub fn build_state(backends: Arc<dyn BackendFactory>, config: Config) -> SharedState {
    Arc::new(AppState {
        routes: RouteTable::new(config.require_auth),
        workspaces: WorkspaceRegistry::new(backends),
        config,
    })
}

pub fn build_app(backends: Arc<dyn BackendFactory>, config: Config) -> Router {
    router(build_state(backends, config))
}

pub fn router(state: SharedState) -> Router {
    let max_body = state.config.max_upload_size;

    // UI bundle: unknown paths fall back to index.html, behind the navigation guard
    let static_dir = &state.config.static_dir;
    let ui = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));
    let ui = Router::new()
        .fallback_service(ui)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            guard_navigation,
        ));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .fallback_service(ui.with_state::<()>(state.clone()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(security_headers)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
