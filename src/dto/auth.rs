use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 150), custom(function = "validate_username"))]
    pub username: String,
    #[validate(email, length(max = 250))]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password1: String,
    #[validate(must_match(other = "password1"))]
    pub password2: String,
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct SignInRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Sign-up landing; names the form fields `POST /account/create/` expects.
#[derive(Debug, Serialize, ToSchema)]
pub struct SignUpPage {
    pub fields: Vec<String>,
}

impl Default for SignUpPage {
    fn default() -> Self {
        let fields = [
            "first_name",
            "last_name",
            "username",
            "email",
            "password1",
            "password2",
        ];
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Sign-in landing; `next` is the page that asked for authentication.
#[derive(Debug, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct SignInPage {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub exp: usize,
}

/// Usernames may hold letters, digits and `@ . + - _`.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_chars"))
    }
}
