use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order_history/", get(order_history))
        .route("/order/{id}", get(view_order))
}

#[utoipa::path(
    get,
    path = "/order_history/",
    responses(
        (status = 200, description = "Orders placed with the account's email", body = ApiResponse<OrderList>),
        (status = 303, description = "Not signed in; redirects to sign-in")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn order_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::order_history(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/order/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its line items", body = ApiResponse<OrderWithItems>),
        (status = 303, description = "Not signed in; redirects to sign-in"),
        (status = 404, description = "No such order for this account")
    ),
    security(("cookie_auth" = []), ("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn view_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::order_for_user(&state, &user, id).await?;
    Ok(Json(resp))
}
