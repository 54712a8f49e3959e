use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Product, Review};

/// One page of the catalog, optionally scoped to a category.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProductPage {
    pub category: Option<Category>,
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub category: Category,
    pub url: String,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewForm {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub title: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResults {
    pub query: String,
    pub items: Vec<Product>,
}

/// Menu links and cart badge shown on every page.
#[derive(Debug, Serialize, ToSchema)]
pub struct Navigation {
    pub links: Vec<Category>,
    pub item_count: i64,
}
