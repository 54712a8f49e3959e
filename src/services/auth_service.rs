use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{DateTime, Utc};
use password_hash::rand_core::OsRng;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit::{AuditAction, record_audit},
    dto::auth::{SignInRequest, SignUpRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    state::AppState,
};

/// Group every self-registered account joins.
pub const CUSTOMER_ROLE: &str = "Customer";

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn auth_user(&self) -> AuthUser {
        AuthUser {
            user_id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Create a customer account and sign it in.
pub async fn register(state: &AppState, payload: SignUpRequest) -> AppResult<(User, AuthUser)> {
    payload.validate()?;

    let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(payload.username.as_str())
        .fetch_optional(&state.pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::BadRequest(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password1)?;

    let row: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, first_name, last_name, password_hash, role)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payload.username.as_str())
    .bind(payload.email.as_str())
    .bind(payload.first_name.as_str())
    .bind(payload.last_name.as_str())
    .bind(password_hash)
    .bind(CUSTOMER_ROLE)
    .fetch_one(&state.pool)
    .await?;

    let auth = row.auth_user();
    tracing::info!(user_id = %auth.user_id, username = %auth.username, "customer registered");
    record_audit(
        &state.orm,
        Some(auth.user_id),
        AuditAction::UserRegister,
        Some(serde_json::json!({ "user_id": auth.user_id })),
    )
    .await;

    Ok((User::from(row), auth))
}

/// Check credentials; `None` when the username is unknown or the password is wrong.
pub async fn sign_in(state: &AppState, payload: SignInRequest) -> AppResult<Option<AuthUser>> {
    payload.validate()?;

    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(payload.username.as_str())
        .fetch_optional(&state.pool)
        .await?;

    let Some(row) = row else {
        tracing::debug!(username = %payload.username, "sign-in for unknown user");
        return Ok(None);
    };

    if !verify_password(&payload.password, &row.password_hash)? {
        tracing::debug!(username = %payload.username, "sign-in with wrong password");
        return Ok(None);
    }

    let auth = row.auth_user();
    record_audit(
        &state.orm,
        Some(auth.user_id),
        AuditAction::UserSignIn,
        Some(serde_json::json!({ "user_id": auth.user_id })),
    )
    .await;

    Ok(Some(auth))
}

/// Email on file for the signed-in account.
pub async fn current_email(state: &AppState, user: &AuthUser) -> AppResult<String> {
    let email: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;

    email.map(|(email,)| email).ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn blank_credentials_fail_validation() {
        let blank = SignInRequest {
            username: String::new(),
            password: String::new(),
        };
        let errors = blank.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));

        let filled = SignInRequest {
            username: "ada".into(),
            password: "wrong".into(),
        };
        assert!(filled.validate().is_ok());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }
}
