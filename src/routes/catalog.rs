use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::catalog::{Navigation, ProductDetail, ProductPage, ReviewForm, SearchQuery, SearchResults},
    error::AppResult,
    middleware::{auth::AuthUser, session::CartSession},
    response::ApiResponse,
    routes::params::PageQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(all_products))
        .route("/category/{category_slug}", get(products_by_category))
        .route(
            "/category/{category_slug}/{product_slug}",
            get(product_detail).post(review_product),
        )
        .route("/search/", get(search))
        .route("/menu", get(menu))
}

#[utoipa::path(
    get,
    path = "/",
    params(PageQuery),
    responses(
        (status = 200, description = "Available products, four per page", body = ApiResponse<ProductPage>)
    ),
    tag = "Catalog"
)]
pub async fn all_products(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ProductPage>>> {
    let resp = catalog_service::list_products(&state, None, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/category/{category_slug}",
    params(
        ("category_slug" = String, Path, description = "Category slug"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Available products in the category", body = ApiResponse<ProductPage>),
        (status = 404, description = "Unknown category")
    ),
    tag = "Catalog"
)]
pub async fn products_by_category(
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ApiResponse<ProductPage>>> {
    let resp = catalog_service::list_products(&state, Some(&category_slug), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/category/{category_slug}/{product_slug}",
    params(
        ("category_slug" = String, Path, description = "Category slug"),
        ("product_slug" = String, Path, description = "Product slug")
    ),
    responses(
        (status = 200, description = "Product with its reviews", body = ApiResponse<ProductDetail>),
        (status = 404, description = "No such product in that category")
    ),
    tag = "Catalog"
)]
pub async fn product_detail(
    State(state): State<AppState>,
    Path((category_slug, product_slug)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = catalog_service::product_detail(&state, &category_slug, &product_slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/category/{category_slug}/{product_slug}",
    params(
        ("category_slug" = String, Path, description = "Category slug"),
        ("product_slug" = String, Path, description = "Product slug")
    ),
    request_body(content = ReviewForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Review stored when signed in and non-blank", body = ApiResponse<ProductDetail>),
        (status = 400, description = "Review too long"),
        (status = 404, description = "No such product in that category")
    ),
    tag = "Catalog"
)]
pub async fn review_product(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path((category_slug, product_slug)): Path<(String, String)>,
    Form(form): Form<ReviewForm>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = catalog_service::review_product(
        &state,
        user.as_ref(),
        &category_slug,
        &product_slug,
        &form.content,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/search/",
    params(("title" = Option<String>, Query, description = "Substring of the product name")),
    responses(
        (status = 200, description = "Products whose name contains the term", body = ApiResponse<SearchResults>)
    ),
    tag = "Catalog"
)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<SearchResults>>> {
    let resp = catalog_service::search(&state, query.title).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/menu",
    responses(
        (status = 200, description = "Category links and cart item count", body = ApiResponse<Navigation>)
    ),
    tag = "Catalog"
)]
pub async fn menu(
    State(state): State<AppState>,
    session: CartSession,
) -> AppResult<Json<ApiResponse<Navigation>>> {
    let resp = catalog_service::navigation(&state, &session).await?;
    Ok(Json(resp))
}
