use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::cart::{CartLine, CartView},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::session::CartSession,
    models::Product,
    payments::CHARGE_DESCRIPTION,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Quantity after one more add, or `None` when the stock cap is reached.
pub fn next_quantity(current: i32, stock: i32) -> Option<i32> {
    (current < stock).then_some(current + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Decrement(i32),
    Delete,
}

impl RemoveOutcome {
    pub fn for_quantity(quantity: i32) -> Self {
        if quantity > 1 {
            RemoveOutcome::Decrement(quantity - 1)
        } else {
            RemoveOutcome::Delete
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    pub total: Decimal,
    pub counter: i64,
}

impl CartTotals {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = (&'a Decimal, i32)>) -> Self {
        lines
            .into_iter()
            .fold(CartTotals::default(), |acc, (price, quantity)| CartTotals {
                total: acc.total + *price * Decimal::from(quantity),
                counter: acc.counter + i64::from(quantity),
            })
    }
}

/// Amount in cents: the decimal total times 100, truncated.
pub fn to_minor_units(total: Decimal) -> AppResult<i64> {
    total
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.trunc().to_i64())
        .ok_or_else(|| AppError::BadRequest(format!("amount {total} is out of range")))
}

pub async fn find_cart(state: &AppState, session: &CartSession) -> AppResult<Option<CartModel>> {
    Ok(Carts::find()
        .filter(CartCol::SessionKey.eq(session.key()))
        .one(&state.orm)
        .await?)
}

async fn get_or_create_cart(state: &AppState, session: &CartSession) -> AppResult<CartModel> {
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        session_key: Set(session.key().to_string()),
        date_added: Set(Utc::now().date_naive()),
    };
    Carts::insert(cart)
        .on_conflict(
            OnConflict::column(CartCol::SessionKey)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    find_cart(state, session)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart vanished after insert")))
}

/// Put one unit of `product_id` in the session's cart, respecting stock on increment.
pub async fn add_to_cart(state: &AppState, session: &CartSession, product_id: Uuid) -> AppResult<()> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let cart = get_or_create_cart(state, session).await?;

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&state.orm)
        .await?;

    match existing {
        Some(item) => match next_quantity(item.quantity, product.stock) {
            Some(quantity) => {
                let mut active: CartItemActive = item.into();
                active.quantity = Set(quantity);
                active.update(&state.orm).await?;
                tracing::debug!(cart_id = %cart.id, product_id = %product.id, quantity, "cart item incremented");
            }
            None => {
                tracing::debug!(cart_id = %cart.id, product_id = %product.id, stock = product.stock, "stock cap reached");
            }
        },
        None => {
            let item = CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(1),
                active: Set(true),
            };
            CartItems::insert(item)
                .on_conflict(
                    OnConflict::columns([CartItemCol::CartId, CartItemCol::ProductId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&state.orm)
                .await?;
            tracing::debug!(cart_id = %cart.id, product_id = %product.id, "cart item created");
        }
    }

    Ok(())
}

#[derive(FromRow)]
struct CartLineRow {
    item_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    category_id: Uuid,
    name: String,
    slug: String,
    description: String,
    price: Decimal,
    image: Option<String>,
    stock: i32,
    available: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        CartLine {
            id: row.item_id,
            subtotal: row.price * Decimal::from(row.quantity),
            quantity: row.quantity,
            product: Product {
                id: row.product_id,
                category_id: row.category_id,
                name: row.name,
                slug: row.slug,
                description: row.description,
                price: row.price,
                image: row.image,
                stock: row.stock,
                available: row.available,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

async fn active_lines(pool: &DbPool, cart_id: Uuid) -> AppResult<Vec<CartLine>> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ci.id AS item_id, ci.quantity,
               p.id AS product_id, p.category_id, p.name, p.slug, p.description,
               p.price, p.image, p.stock, p.available, p.created_at, p.updated_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1 AND ci.active
        ORDER BY p.name
        "#,
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}

/// The session's active cart lines with totals; a missing cart reads as empty.
pub async fn cart_view(state: &AppState, session: &CartSession) -> AppResult<ApiResponse<CartView>> {
    let items = match find_cart(state, session).await? {
        Some(cart) => active_lines(&state.pool, cart.id).await?,
        None => Vec::new(),
    };

    let totals = CartTotals::from_lines(items.iter().map(|line| (&line.product.price, line.quantity)));
    let view = CartView {
        stripe_total: to_minor_units(totals.total)?,
        total: totals.total,
        counter: totals.counter,
        description: CHARGE_DESCRIPTION.to_string(),
        data_key: state.config.stripe_publishable_key.clone(),
        items,
    };

    let meta = Meta::count(view.items.len() as i64);
    Ok(ApiResponse::success("Cart", view, Some(meta)))
}

/// Units across every item in the session's cart, for the menu badge.
pub async fn item_count(state: &AppState, session: &CartSession) -> AppResult<i64> {
    let count: (Option<i64>,) = sqlx::query_as(
        r#"
        SELECT SUM(ci.quantity)::BIGINT
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        WHERE c.session_key = $1
        "#,
    )
    .bind(session.key())
    .fetch_one(&state.pool)
    .await?;

    Ok(count.0.unwrap_or(0))
}

async fn cart_item_for(
    state: &AppState,
    session: &CartSession,
    product_id: Uuid,
) -> AppResult<crate::entity::cart_items::Model> {
    let cart = find_cart(state, session).await?.ok_or(AppError::NotFound)?;
    CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

/// Take one unit of `product_id` out of the cart, deleting the line at zero.
pub async fn remove_one(state: &AppState, session: &CartSession, product_id: Uuid) -> AppResult<()> {
    let item = cart_item_for(state, session, product_id).await?;

    match RemoveOutcome::for_quantity(item.quantity) {
        RemoveOutcome::Decrement(quantity) => {
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.update(&state.orm).await?;
            tracing::debug!(product_id = %product_id, quantity, "cart item decremented");
        }
        RemoveOutcome::Delete => {
            CartItems::delete_by_id(item.id).exec(&state.orm).await?;
            tracing::debug!(product_id = %product_id, "cart item removed");
        }
    }

    Ok(())
}

/// Drop the whole line for `product_id`, whatever its quantity.
pub async fn remove_product(state: &AppState, session: &CartSession, product_id: Uuid) -> AppResult<()> {
    let item = cart_item_for(state, session, product_id).await?;
    CartItems::delete_by_id(item.id).exec(&state.orm).await?;
    tracing::debug!(product_id = %product_id, quantity = item.quantity, "cart line removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn increment_stops_at_stock() {
        assert_eq!(next_quantity(1, 3), Some(2));
        assert_eq!(next_quantity(2, 3), Some(3));
        assert_eq!(next_quantity(3, 3), None);
        assert_eq!(next_quantity(1, 0), None);
    }

    #[test]
    fn repeated_adds_settle_on_stock() {
        let stock = 4;
        let mut quantity = 1;
        for _ in 0..stock {
            if let Some(next) = next_quantity(quantity, stock) {
                quantity = next;
            }
        }
        assert_eq!(quantity, stock);
    }

    #[test]
    fn removing_last_unit_deletes() {
        assert_eq!(RemoveOutcome::for_quantity(1), RemoveOutcome::Delete);
        assert_eq!(RemoveOutcome::for_quantity(0), RemoveOutcome::Delete);
        assert_eq!(RemoveOutcome::for_quantity(3), RemoveOutcome::Decrement(2));
    }

    #[test]
    fn totals_sum_price_times_quantity() {
        let a = dec("19.99");
        let b = dec("5.00");
        let totals = CartTotals::from_lines([(&a, 2), (&b, 3)]);
        assert_eq!(totals.total, dec("54.98"));
        assert_eq!(totals.counter, 5);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let totals = CartTotals::from_lines(std::iter::empty::<(&Decimal, i32)>());
        assert_eq!(totals, CartTotals::default());
        assert_eq!(to_minor_units(totals.total).unwrap(), 0);
    }

    #[test]
    fn minor_units_truncate() {
        assert_eq!(to_minor_units(dec("54.98")).unwrap(), 5498);
        assert_eq!(to_minor_units(dec("0.019")).unwrap(), 1);
        assert_eq!(to_minor_units(dec("10")).unwrap(), 1000);
    }
}
