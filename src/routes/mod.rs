use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    middleware,
    routing::get,
};

use crate::{
    middleware::{
        hosts::enforce_allowed_hosts,
        session::{SessionSettings, ensure_session},
    },
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod account;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;

// Page routes without bound state; it is provided by `app`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(catalog::router())
        .merge(cart::router())
        .merge(account::router())
        .merge(orders::router())
}

/// Full storefront: pages, health, docs, session and host checks.
pub fn app(state: AppState) -> Router {
    let session_settings = SessionSettings {
        secure_cookies: !state.config.debug,
    };

    Router::new()
        .route("/health", get(health::health_check))
        .merge(create_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(session_settings, ensure_session))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            enforce_allowed_hosts,
        ))
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
