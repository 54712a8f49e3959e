use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, record_audit},
    dto::catalog::{Navigation, ProductDetail, ProductPage, SearchResults},
    entity::{
        categories::{Column as CatCol, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews},
    },
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, session::CartSession},
    models::{Category, Product, Review, product_url},
    response::{ApiResponse, Meta},
    routes::params::{CATALOG_PAGE_SIZE, PageQuery, PageWindow},
    services::cart_service,
    state::AppState,
};

const REVIEW_MAX_CHARS: usize = 500;

/// Available products, optionally restricted to the category with `category_slug`.
pub async fn list_products(
    state: &AppState,
    category_slug: Option<&str>,
    query: PageQuery,
) -> AppResult<ApiResponse<ProductPage>> {
    let category = match category_slug {
        Some(slug) => Some(
            Categories::find()
                .filter(CatCol::Slug.eq(slug))
                .one(&state.orm)
                .await?
                .ok_or(AppError::NotFound)?,
        ),
        None => None,
    };

    let mut condition = Condition::all().add(ProdCol::Available.eq(true));
    if let Some(category) = &category {
        condition = condition.add(ProdCol::CategoryId.eq(category.id));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_asc(ProdCol::Name);

    let total = finder.clone().count(&state.orm).await?;
    let window = PageWindow::resolve(query.requested(), CATALOG_PAGE_SIZE, total);

    let items = finder
        .limit(window.per_page)
        .offset(window.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let data = ProductPage {
        category: category.map(Category::from),
        items,
    };
    Ok(ApiResponse::success("Products", data, Some(window.meta())))
}

/// A product addressed by its category slug and its own slug, with its reviews.
pub async fn product_detail(
    state: &AppState,
    category_slug: &str,
    product_slug: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    let (product, category) = Products::find()
        .find_also_related(Categories)
        .filter(ProdCol::Slug.eq(product_slug))
        .filter(CatCol::Slug.eq(category_slug))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let category = category.ok_or(AppError::NotFound)?;

    let reviews = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    let data = ProductDetail {
        url: product_url(&category.slug, &product.slug),
        product: Product::from(product),
        category: Category::from(category),
        reviews,
    };
    Ok(ApiResponse::success("Product", data, None))
}

/// Post a review on the product page, then show the page again.
///
/// Anonymous visitors and blank content are ignored, not rejected.
pub async fn review_product(
    state: &AppState,
    user: Option<&AuthUser>,
    category_slug: &str,
    product_slug: &str,
    content: &str,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find()
        .find_also_related(Categories)
        .filter(ProdCol::Slug.eq(product_slug))
        .filter(CatCol::Slug.eq(category_slug))
        .one(&state.orm)
        .await?
        .map(|(product, _)| product)
        .ok_or(AppError::NotFound)?;

    if let Some(user) = user {
        submit_review(state, user, product.id, content).await?;
    }

    product_detail(state, category_slug, product_slug).await
}

async fn submit_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    content: &str,
) -> AppResult<Option<Review>> {
    if content.trim().is_empty() {
        return Ok(None);
    }
    if content.chars().count() > REVIEW_MAX_CHARS {
        return Err(AppError::BadRequest(format!(
            "review must be at most {REVIEW_MAX_CHARS} characters"
        )));
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        user_id: Set(user.user_id),
        content: Set(content.to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::debug!(product_id = %product_id, user_id = %user.user_id, "review created");
    record_audit(
        &state.orm,
        Some(user.user_id),
        AuditAction::ReviewCreate,
        Some(serde_json::json!({ "product_id": product_id, "review_id": review.id })),
    )
    .await;

    Ok(Some(Review::from(review)))
}

/// Escape LIKE wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Case-insensitive substring match on product names. Availability is not
/// filtered here, unlike the catalog listing.
pub async fn search(state: &AppState, title: Option<String>) -> AppResult<ApiResponse<SearchResults>> {
    let query = title.unwrap_or_default();

    let items: Vec<Product> = Products::find()
        .filter(Expr::col(ProdCol::Name).ilike(like_pattern(&query)))
        .order_by_asc(ProdCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::count(items.len() as i64);
    Ok(ApiResponse::success(
        "Search results",
        SearchResults { query, items },
        Some(meta),
    ))
}

/// Menu links plus the number of units sitting in the visitor's cart.
pub async fn navigation(state: &AppState, session: &CartSession) -> AppResult<ApiResponse<Navigation>> {
    let links = Categories::find()
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Category::from)
        .collect();

    let item_count = cart_service::item_count(state, session).await?;

    Ok(ApiResponse::success(
        "Navigation",
        Navigation { links, item_count },
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_terms_are_wrapped() {
        assert_eq!(like_pattern("shirt"), "%shirt%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
