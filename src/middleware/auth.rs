use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    dto::auth::{Claims, SignInPage},
    error::{AppError, AppResult},
    state::AppState,
};

pub const AUTH_COOKIE: &str = "auth_token";

pub const SIGNIN_PATH: &str = "/account/signin/";

const TOKEN_TTL_HOURS: i64 = 24;

/// Lifetime of the auth cookie, matching the token expiry.
pub const TOKEN_TTL_SECS: i64 = TOKEN_TTL_HOURS * 60 * 60;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
}

/// Sign a session token for `user`.
pub fn issue_token(secret: &str, user: &AuthUser) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.user_id.to_string(),
        username: user.username.clone(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

/// Decode and verify a session token; `None` for anything invalid or expired.
pub fn decode_token(secret: &str, token: &str) -> Option<AuthUser> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).ok()?;

    Some(AuthUser {
        user_id,
        username: decoded.claims.username,
        role: decoded.claims.role,
    })
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(token) = jar.get(AUTH_COOKIE).map(|c| c.value()).filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Sends anonymous callers to the sign-in page, remembering where they were going.
#[derive(Debug)]
pub struct SignInRedirect {
    next: String,
}

impl SignInRedirect {
    fn from_parts(parts: &Parts) -> Self {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| parts.uri.path());
        Self {
            next: next.to_string(),
        }
    }

    fn location(&self) -> String {
        let page = SignInPage {
            next: Some(self.next.clone()),
        };
        match serde_urlencoded::to_string(&page) {
            Ok(query) => format!("{SIGNIN_PATH}?{query}"),
            Err(_) => SIGNIN_PATH.to_string(),
        }
    }
}

impl IntoResponse for SignInRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.location()).into_response()
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = SignInRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        token_from_parts(parts)
            .and_then(|token| decode_token(&state.config.jwt_secret, &token))
            .ok_or_else(|| SignInRedirect::from_parts(parts))
    }
}

impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(token_from_parts(parts).and_then(|token| decode_token(&state.config.jwt_secret, &token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request, StatusCode};

    fn user() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "ada".into(),
            role: "Customer".into(),
        }
    }

    #[test]
    fn token_round_trips_identity() {
        let user = user();
        let token = issue_token("secret", &user).unwrap();
        let decoded = decode_token("secret", &token).expect("valid token");

        assert_eq!(decoded.user_id, user.user_id);
        assert_eq!(decoded.username, "ada");
        assert_eq!(decoded.role, "Customer");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token("secret", &user()).unwrap();
        assert!(decode_token("other", &token).is_none());
        assert!(decode_token("secret", "garbage").is_none());
    }

    #[test]
    fn cookie_wins_over_bearer_header() {
        let (mut parts, _) = Request::builder()
            .uri("/order_history/")
            .header(header::AUTHORIZATION, "Bearer header-token")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(token_from_parts(&parts).as_deref(), Some("header-token"));

        parts.headers.insert(
            header::COOKIE,
            HeaderValue::from_static("auth_token=cookie-token"),
        );
        assert_eq!(token_from_parts(&parts).as_deref(), Some("cookie-token"));
    }

    #[test]
    fn redirect_targets_signin_with_next() {
        let response = SignInRedirect {
            next: "/order_history/".into(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/account/signin/?next=%2Forder_history%2F"
        );
    }

    #[test]
    fn redirect_keeps_and_encodes_query_string() {
        let (parts, _) = Request::builder()
            .uri("/order/7?tab=items")
            .body(())
            .unwrap()
            .into_parts();
        let redirect = SignInRedirect::from_parts(&parts);

        assert_eq!(redirect.next, "/order/7?tab=items");
        assert_eq!(
            redirect.location(),
            "/account/signin/?next=%2Forder%2F7%3Ftab%3Ditems"
        );
    }
}
