use axum::{
    Form, Json, Router,
    extract::{Path, State},
    response::Redirect,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::{CartView, CheckoutForm},
        orders::OrderWithItems,
    },
    error::AppResult,
    middleware::{auth::AuthUser, session::CartSession},
    response::ApiResponse,
    services::{cart_service, order_service},
    state::AppState,
};

const CART_PATH: &str = "/cart";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart_detail).post(checkout))
        .route("/cart/add/{product_id}", get(add_to_cart).post(add_to_cart))
        .route("/cart/remove/{product_id}", get(remove_one).post(remove_one))
        .route(
            "/cart/remove_product/{product_id}",
            get(remove_product).post(remove_product),
        )
        .route("/thankyou/{order_id}", get(thank_you))
}

#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Active cart lines with totals", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn cart_detail(
    State(state): State<AppState>,
    session: CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::cart_view(&state, &session).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/cart/add/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 303, description = "Added; redirects to the cart"),
        (status = 404, description = "Product not found")
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<Uuid>,
) -> AppResult<Redirect> {
    cart_service::add_to_cart(&state, &session, product_id).await?;
    Ok(Redirect::to(CART_PATH))
}

#[utoipa::path(
    post,
    path = "/cart/remove/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 303, description = "One unit removed; redirects to the cart"),
        (status = 404, description = "No cart or no such line")
    ),
    tag = "Cart"
)]
pub async fn remove_one(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<Uuid>,
) -> AppResult<Redirect> {
    cart_service::remove_one(&state, &session, product_id).await?;
    Ok(Redirect::to(CART_PATH))
}

#[utoipa::path(
    post,
    path = "/cart/remove_product/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 303, description = "Line removed; redirects to the cart"),
        (status = 404, description = "No cart or no such line")
    ),
    tag = "Cart"
)]
pub async fn remove_product(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<Uuid>,
) -> AppResult<Redirect> {
    cart_service::remove_product(&state, &session, product_id).await?;
    Ok(Redirect::to(CART_PATH))
}

#[utoipa::path(
    post,
    path = "/cart",
    request_body(content = CheckoutForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Order placed; redirects to the thank-you page"),
        (status = 400, description = "Cart is empty"),
        (status = 402, description = "Card declined"),
        (status = 502, description = "Payment processor failure")
    ),
    tag = "Cart"
)]
pub async fn checkout(
    State(state): State<AppState>,
    session: CartSession,
    user: Option<AuthUser>,
    Form(form): Form<CheckoutForm>,
) -> AppResult<Redirect> {
    let order = order_service::checkout(&state, &session, user.as_ref(), form).await?;
    Ok(Redirect::to(&format!("/thankyou/{}", order.id)))
}

#[utoipa::path(
    get,
    path = "/thankyou/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order confirmation", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found")
    ),
    tag = "Cart"
)]
pub async fn thank_you(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::order_confirmation(&state, order_id).await?;
    Ok(Json(resp))
}
