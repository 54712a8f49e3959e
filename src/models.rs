use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{categories, order_items, orders, products, reviews, users};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    pub image: Option<String>,
    pub stock: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Account details safe to hand back to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    #[schema(value_type = String, example = "39.98")]
    pub total: Decimal,
    pub email_address: String,
    pub billing_name: String,
    pub billing_address1: String,
    pub billing_city: String,
    pub billing_postcode: String,
    pub billing_country: String,
    pub shipping_name: String,
    pub shipping_address1: String,
    pub shipping_city: String,
    pub shipping_postcode: String,
    pub shipping_country: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product: String,
    pub quantity: i32,
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    #[schema(value_type = String, example = "39.98")]
    pub subtotal: Decimal,
}

pub fn category_url(slug: &str) -> String {
    format!("/category/{slug}")
}

pub fn product_url(category_slug: &str, product_slug: &str) -> String {
    format!("/category/{category_slug}/{product_slug}")
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            url: category_url(&model.slug),
            name: model.name,
            slug: model.slug,
            description: model.description,
            image: model.image,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            price: model.price,
            image: model.image,
            stock: model.stock,
            available: model.available,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            user_id: model.user_id,
            content: model.content,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            total: model.total,
            email_address: model.email_address,
            billing_name: model.billing_name,
            billing_address1: model.billing_address1,
            billing_city: model.billing_city,
            billing_postcode: model.billing_postcode,
            billing_country: model.billing_country,
            shipping_name: model.shipping_name,
            shipping_address1: model.shipping_address1,
            shipping_city: model.shipping_city,
            shipping_postcode: model.shipping_postcode,
            shipping_country: model.shipping_country,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            subtotal: model.price * Decimal::from(model.quantity),
            product: model.product,
            quantity: model.quantity,
            price: model.price,
        }
    }
}
