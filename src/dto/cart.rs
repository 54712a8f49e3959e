use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    #[schema(value_type = String, example = "39.98")]
    pub subtotal: Decimal,
}

/// The cart page: active lines, totals and what the payment form needs.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    #[schema(value_type = String, example = "39.98")]
    pub total: Decimal,
    pub counter: i64,
    /// Total in cents, as sent to the payment processor.
    pub stripe_total: i64,
    pub description: String,
    pub data_key: String,
}

/// Fields posted by the hosted checkout widget.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutForm {
    #[serde(rename = "stripeToken")]
    pub token: String,
    #[serde(rename = "stripeEmail")]
    pub email: String,
    #[serde(rename = "stripeBillingName")]
    pub billing_name: String,
    #[serde(rename = "stripeBillingAddressLine1")]
    pub billing_address1: String,
    #[serde(rename = "stripeBillingAddressCity")]
    pub billing_city: String,
    #[serde(rename = "stripeBillingAddressZip")]
    pub billing_postcode: String,
    #[serde(rename = "stripeBillingAddressCountryCode")]
    pub billing_country: String,
    #[serde(rename = "stripeShippingName")]
    pub shipping_name: String,
    #[serde(rename = "stripeShippingAddressLine1")]
    pub shipping_address1: String,
    #[serde(rename = "stripeShippingAddressCity")]
    pub shipping_city: String,
    #[serde(rename = "stripeShippingAddressZip")]
    pub shipping_postcode: String,
    #[serde(rename = "stripeShippingAddressCountryCode")]
    pub shipping_country: String,
}
