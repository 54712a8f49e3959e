//! Anonymous session identity.
//!
//! Every visitor carries an opaque `sessionid` cookie; it is the only key
//! linking a browser to its cart. [`ensure_session`] allocates one the first
//! time a browser shows up and hands it to handlers as [`CartSession`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{error::AppError, middleware::cookies::site_cookie};

pub const SESSION_COOKIE: &str = "sessionid";

const SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSession(String);

impl CartSession {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    fn allocate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn key(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub secure_cookies: bool,
}

fn is_valid_session_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 64
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Attach the caller's session, allocating and setting the cookie when absent.
pub async fn ensure_session(
    State(settings): State<SessionSettings>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let existing = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value())
        .filter(|key| is_valid_session_key(key))
        .map(CartSession::new);

    let (session, fresh) = match existing {
        Some(session) => (session, false),
        None => (CartSession::allocate(), true),
    };

    request.extensions_mut().insert(session.clone());
    let response = next.run(request).await;

    if !fresh {
        return response;
    }

    tracing::debug!(session = %session.key(), "allocated session");
    let cookie = site_cookie(
        SESSION_COOKIE,
        session.key(),
        Some(SESSION_MAX_AGE_SECS),
        settings.secure_cookies,
    );
    (jar.add(cookie), response).into_response()
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CartSession>()
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("session middleware not installed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, header},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|session: CartSession| async move { session.key().to_string() }),
            )
            .layer(middleware::from_fn_with_state(
                SessionSettings {
                    secure_cookies: false,
                },
                ensure_session,
            ))
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn allocates_and_sets_cookie_for_new_visitor() {
        let response = app()
            .oneshot(HttpRequest::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap()
            .to_string();
        let key = body_string(response).await;

        assert_eq!(key.len(), 32);
        assert!(cookie.starts_with(&format!("sessionid={key};")));
    }

    #[tokio::test]
    async fn reuses_existing_session() {
        let response = app()
            .oneshot(
                HttpRequest::get("/")
                    .header(header::COOKIE, "sessionid=existing-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(response).await, "existing-key");
    }

    #[tokio::test]
    async fn padded_cookie_name_is_recognised() {
        let response = app()
            .oneshot(
                HttpRequest::get("/")
                    .header(header::COOKIE, "theme=dark;  sessionid=existing-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_string(response).await, "existing-key");
    }

    #[tokio::test]
    async fn malformed_cookie_gets_replaced() {
        let response = app()
            .oneshot(
                HttpRequest::get("/")
                    .header(header::COOKIE, "sessionid=bad key!")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::SET_COOKIE).is_some());
        assert_ne!(body_string(response).await, "bad key!");
    }
}
