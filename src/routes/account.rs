use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::{
    dto::auth::{SignInPage, SignInRequest, SignUpPage, SignUpRequest},
    error::AppResult,
    middleware::{
        auth::{AUTH_COOKIE, AuthUser, SIGNIN_PATH, TOKEN_TTL_SECS, issue_token},
        cookies::{removal_cookie, site_cookie},
        session::SESSION_COOKIE,
    },
    models::User,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

const SIGNUP_PATH: &str = "/account/create/";

pub fn router() -> Router<AppState> {
    Router::new()
        .route(SIGNUP_PATH, get(sign_up_page).post(sign_up))
        .route(SIGNIN_PATH, get(sign_in_page).post(sign_in))
        .route("/account/signout/", get(sign_out).post(sign_out))
}

fn secure_cookies(state: &AppState) -> bool {
    !state.config.debug
}

fn auth_cookie(state: &AppState, auth: &AuthUser) -> AppResult<Cookie<'static>> {
    let token = issue_token(&state.config.jwt_secret, auth)?;
    Ok(site_cookie(
        AUTH_COOKIE,
        token,
        Some(TOKEN_TTL_SECS),
        secure_cookies(state),
    ))
}

#[utoipa::path(
    get,
    path = "/account/create/",
    responses(
        (status = 200, description = "Fields the sign-up form posts", body = ApiResponse<SignUpPage>)
    ),
    tag = "Account"
)]
pub async fn sign_up_page() -> Json<ApiResponse<SignUpPage>> {
    Json(ApiResponse::success("Create an account", SignUpPage::default(), None))
}

#[utoipa::path(
    post,
    path = "/account/create/",
    request_body(content = SignUpRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Account created and signed in", body = ApiResponse<User>),
        (status = 400, description = "Username already taken"),
        (status = 422, description = "Invalid sign-up form")
    ),
    tag = "Account"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<SignUpRequest>,
) -> AppResult<Response> {
    let (user, auth) = auth_service::register(&state, payload).await?;
    let cookie = auth_cookie(&state, &auth)?;

    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(ApiResponse::success("User created", user, None)),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/account/signin/",
    params(SignInPage),
    responses(
        (status = 200, description = "Where to post credentials and where to return afterwards", body = ApiResponse<SignInPage>)
    ),
    tag = "Account"
)]
pub async fn sign_in_page(Query(page): Query<SignInPage>) -> Json<ApiResponse<SignInPage>> {
    Json(ApiResponse::success("Sign in", page, None))
}

#[utoipa::path(
    post,
    path = "/account/signin/",
    request_body(content = SignInRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in and sent home, or sent to sign-up on bad credentials"),
        (status = 422, description = "Blank username or password")
    ),
    tag = "Account"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(payload): Form<SignInRequest>,
) -> AppResult<Response> {
    let Some(auth) = auth_service::sign_in(&state, payload).await? else {
        return Ok(Redirect::to(SIGNUP_PATH).into_response());
    };

    let cookie = auth_cookie(&state, &auth)?;
    tracing::info!(user_id = %auth.user_id, "signed in");

    Ok((jar.add(cookie), Redirect::to("/")).into_response())
}

#[utoipa::path(
    post,
    path = "/account/signout/",
    responses(
        (status = 303, description = "Cookies cleared; redirects to sign-in")
    ),
    tag = "Account"
)]
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let secure = secure_cookies(&state);
    let jar = jar
        .add(removal_cookie(AUTH_COOKIE, secure))
        .add(removal_cookie(SESSION_COOKIE, secure));
    (jar, Redirect::to(SIGNIN_PATH))
}
