pub mod config;
pub mod context;
pub mod error;
pub mod state;
pub mod auth;
pub mod db;
pub mod models;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::config::Config;
use crate::db::users::UserRepository;
use crate::middleware::tenant::resolve_tenant;
use crate::services::users::UserService;
use crate::state::{AppState, SharedState};
use crate::store::{DocumentStore, SharedContainer};

/// Build the application around an already opened users container.
pub fn build_app(users_container: SharedContainer, config: Config) -> Router {
    let store = DocumentStore::new(users_container, config.store_timeout);
    let users = UserService::new(UserRepository::new(store));

    let state: SharedState = Arc::new(AppState {
        users,
        config,
    });

    let api = routes::api_routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        resolve_tenant,
    ));

    // Each `layer` wraps the previous ones, so the request id is set before
    // the trace span opens.
    let mut app = Router::new()
        .merge(api)
        .route("/health", axum::routing::get(health))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout,
        ))
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::map_response(error::json_error_body))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(middleware::trace::layer())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    if !state.config.cors_origins.is_empty() {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(state.config.cors_origins.clone()))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE]),
        );
    }

    app.with_state(state)
}

async fn health() -> &'static str {
    tracing::debug!("Health check");
    "OK"
}
