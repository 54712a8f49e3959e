// Routing behavior that never reaches the database; the pool connects lazily.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use axum_storefront::{
    config::AppConfig,
    payments::MockPaymentGateway,
    routes,
    state::AppState,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

fn config(debug: bool, allowed_hosts: &[&str]) -> AppConfig {
    AppConfig {
        database_url: "postgres://storefront@localhost/unused".into(),
        host: "127.0.0.1".into(),
        port: 3000,
        jwt_secret: "test-secret".into(),
        stripe_secret_key: String::new(),
        stripe_publishable_key: "pk_test".into(),
        stripe_api_base: "http://localhost:12111".into(),
        debug,
        allowed_hosts: allowed_hosts.iter().map(|h| h.to_string()).collect(),
    }
}

fn app(config: AppConfig) -> anyhow::Result<Router> {
    let pool = PgPoolOptions::new().connect_lazy(&config.database_url)?;
    let state = AppState::new(pool, config, Arc::new(MockPaymentGateway::new()));
    Ok(routes::app(state))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::HOST, "localhost:3000")
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn health_route_sets_session_cookie() -> anyhow::Result<()> {
    let response = app(config(false, &[]))?.oneshot(get("/health")).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()?;
    assert!(cookie.starts_with("sessionid="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    Ok(())
}

#[tokio::test]
async fn order_history_redirects_anonymous_visitors() -> anyhow::Result<()> {
    let response = app(config(true, &[]))?
        .oneshot(get("/order_history/"))
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/account/signin/?next=%2Forder_history%2F"
    );
    Ok(())
}

#[tokio::test]
async fn sign_out_expires_both_cookies() -> anyhow::Result<()> {
    let request = Request::post("/account/signout/")
        .header(header::HOST, "localhost")
        .header(header::COOKIE, "sessionid=abc123; auth_token=jwt")
        .body(Body::empty())?;
    let response = app(config(true, &[]))?.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).expect("location"),
        "/account/signin/"
    );

    let cookies: Vec<&str> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("auth_token=;") && c.contains("Max-Age=0")));
    assert!(cookies.iter().any(|c| c.starts_with("sessionid=;") && c.contains("Max-Age=0")));
    Ok(())
}

#[tokio::test]
async fn disallowed_host_is_rejected() -> anyhow::Result<()> {
    let request = Request::get("/health")
        .header(header::HOST, "evil.example.com")
        .body(Body::empty())?;
    let response = app(config(false, &["shop.example.com"]))?
        .oneshot(request)
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_path_is_not_found() -> anyhow::Result<()> {
    let response = app(config(true, &[]))?
        .oneshot(get("/no/such/page"))
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn sign_in_page_echoes_next() -> anyhow::Result<()> {
    let response = app(config(true, &[]))?
        .oneshot(get("/account/signin/?next=/order/1"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["data"]["next"], "/order/1");
    Ok(())
}

#[tokio::test]
async fn sign_up_page_answers_get() -> anyhow::Result<()> {
    let response = app(config(true, &[]))?
        .oneshot(get("/account/create/"))
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    let fields = body["data"]["fields"].as_array().expect("fields");
    assert!(fields.iter().any(|f| f == "password2"));
    Ok(())
}

#[tokio::test]
async fn blank_sign_in_is_rejected_with_field_errors() -> anyhow::Result<()> {
    let request = Request::post("/account/signin/")
        .header(header::HOST, "localhost")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=&password="))?;
    let response = app(config(true, &[]))?.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.headers().get(header::LOCATION).is_none());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert!(body["data"]["fields"].get("username").is_some());
    assert!(body["data"]["fields"].get("password").is_some());
    Ok(())
}

#[tokio::test]
async fn encoded_next_survives_the_sign_in_round_trip() -> anyhow::Result<()> {
    let response = app(config(true, &[]))?
        .oneshot(get("/order/0b9e6f0e-3c1a-4a8e-9d51-1f2a3b4c5d6e?tab=items"))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("location")
        .to_str()?
        .to_string();

    let response = app(config(true, &[]))?.oneshot(get(&location)).await?;
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body: serde_json::Value = serde_json::from_slice(&bytes)?;
    assert_eq!(body["data"]["next"], "/order/0b9e6f0e-3c1a-4a8e-9d51-1f2a3b4c5d6e?tab=items");
    Ok(())
}
