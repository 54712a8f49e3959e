//! Stripe REST client for the customer and charge endpoints.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{Charge, ChargeRequest, CustomerId, NewCustomer, PaymentError, PaymentGateway};

#[derive(Debug, Clone)]
pub struct StripeGateway {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        }
    }

    async fn post_form<T>(&self, path: &str, form: &[(&str, String)]) -> Result<T, PaymentError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| PaymentError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
    message: Option<String>,
}

/// Map a non-2xx processor reply to a [`PaymentError`].
fn classify_error(status: StatusCode, body: &str) -> PaymentError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();

    match parsed {
        Some(ErrorEnvelope { error }) if error.kind.as_deref() == Some("card_error") => {
            PaymentError::Card {
                code: error.decline_code.or(error.code),
                message: error
                    .message
                    .unwrap_or_else(|| "Your card was declined.".to_string()),
            }
        }
        Some(ErrorEnvelope { error }) => PaymentError::Api {
            status: status.as_u16(),
            message: error.message.unwrap_or_else(|| status.to_string()),
        },
        None => PaymentError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        },
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_customer(&self, customer: NewCustomer) -> Result<CustomerId, PaymentError> {
        let resp: CustomerResponse = self
            .post_form(
                "/v1/customers",
                &[("email", customer.email), ("source", customer.source)],
            )
            .await?;
        Ok(CustomerId(resp.id))
    }

    async fn create_charge(&self, charge: ChargeRequest) -> Result<Charge, PaymentError> {
        self.post_form(
            "/v1/charges",
            &[
                ("amount", charge.amount.to_string()),
                ("currency", charge.currency),
                ("description", charge.description),
                ("customer", charge.customer.0),
            ],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_errors_prefer_decline_code() {
        let body = r#"{"error":{"type":"card_error","code":"card_declined","decline_code":"insufficient_funds","message":"Your card has insufficient funds."}}"#;

        match classify_error(StatusCode::PAYMENT_REQUIRED, body) {
            PaymentError::Card { code, message } => {
                assert_eq!(code.as_deref(), Some("insufficient_funds"));
                assert_eq!(message, "Your card has insufficient funds.");
            }
            other => panic!("expected card error, got {other:?}"),
        }
    }

    #[test]
    fn other_error_types_are_api_errors() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"No such token: 'tok_x'"}}"#;

        match classify_error(StatusCode::BAD_REQUEST, body) {
            PaymentError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No such token: 'tok_x'");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_bodies_keep_status() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "<html>upstream</html>");
        assert!(matches!(err, PaymentError::Api { status: 502, .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = StripeGateway::new("https://api.stripe.com/", "sk_test");
        assert_eq!(gateway.api_base, "https://api.stripe.com");
    }
}
