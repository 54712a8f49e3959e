use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use sea_orm::sea_query::Expr;
use uuid::Uuid;

use crate::{
    audit::{AuditAction, record_audit},
    dto::{
        cart::CheckoutForm,
        orders::{OrderList, OrderWithItems},
    },
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, session::CartSession},
    models::{Order, OrderItem},
    payments::{
        CHARGE_CURRENCY, CHARGE_DESCRIPTION, Charge, ChargeRequest, NewCustomer, PaymentGateway,
    },
    response::{ApiResponse, Meta},
    services::{
        auth_service,
        cart_service::{self, CartTotals},
    },
    state::AppState,
};

/// Register the buyer with the processor and charge `amount` cents.
pub async fn collect_payment(
    gateway: &dyn PaymentGateway,
    form: &CheckoutForm,
    amount: i64,
) -> AppResult<Charge> {
    let customer = gateway
        .create_customer(NewCustomer {
            email: form.email.clone(),
            source: form.token.clone(),
        })
        .await?;

    let charge = gateway
        .create_charge(ChargeRequest {
            amount,
            currency: CHARGE_CURRENCY.to_string(),
            description: CHARGE_DESCRIPTION.to_string(),
            customer,
        })
        .await?;

    if !charge.paid {
        return Err(AppError::PaymentDeclined(
            "The payment was not completed.".into(),
        ));
    }

    Ok(charge)
}

/// Charge the session's active cart and turn it into an order.
///
/// The charge happens first; the order rows, stock decrements and cart
/// clean-up then commit together. If that write fails the customer has
/// already paid, so the charge id is logged for manual reconciliation.
pub async fn checkout(
    state: &AppState,
    session: &CartSession,
    user: Option<&AuthUser>,
    form: CheckoutForm,
) -> AppResult<OrderModel> {
    let cart = cart_service::find_cart(state, session)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let lines: Vec<(CartItemModel, ProductModel)> = CartItems::find()
        .find_also_related(Products)
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::Active.eq(true))
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| (item, p)))
        .collect();

    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let totals = CartTotals::from_lines(lines.iter().map(|(item, p)| (&p.price, item.quantity)));
    let amount = cart_service::to_minor_units(totals.total)?;

    let charge = match collect_payment(state.payments.as_ref(), &form, amount).await {
        Ok(charge) => charge,
        Err(err) => {
            if matches!(err, AppError::PaymentDeclined(_)) {
                tracing::warn!(cart_id = %cart.id, amount, error = %err, "card declined");
            }
            return Err(err);
        }
    };
    tracing::info!(cart_id = %cart.id, charge_id = %charge.id, amount, "charge accepted");

    let order = match persist_order(state, &form, totals, &lines).await {
        Ok(order) => order,
        Err(err) => {
            tracing::error!(
                charge_id = %charge.id,
                amount,
                email = %form.email,
                error = %err,
                "customer charged but order was not recorded"
            );
            return Err(err);
        }
    };

    tracing::info!(order_id = %order.id, total = %order.total, "order placed");
    record_audit(
        &state.orm,
        user.map(|u| u.user_id),
        AuditAction::Checkout,
        Some(serde_json::json!({ "order_id": order.id, "charge_id": charge.id })),
    )
    .await;

    Ok(order)
}

async fn persist_order(
    state: &AppState,
    form: &CheckoutForm,
    totals: CartTotals,
    lines: &[(CartItemModel, ProductModel)],
) -> AppResult<OrderModel> {
    let txn = state.orm.begin().await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        token: Set(form.token.clone()),
        total: Set(totals.total),
        email_address: Set(form.email.clone()),
        billing_name: Set(form.billing_name.clone()),
        billing_address1: Set(form.billing_address1.clone()),
        billing_city: Set(form.billing_city.clone()),
        billing_postcode: Set(form.billing_postcode.clone()),
        billing_country: Set(form.billing_country.clone()),
        shipping_name: Set(form.shipping_name.clone()),
        shipping_address1: Set(form.shipping_address1.clone()),
        shipping_city: Set(form.shipping_city.clone()),
        shipping_postcode: Set(form.shipping_postcode.clone()),
        shipping_country: Set(form.shipping_country.clone()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (item, product) in lines {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product: Set(product.name.clone()),
            quantity: Set(item.quantity),
            price: Set(product.price),
        }
        .insert(&txn)
        .await?;

        // no floor: concurrent checkouts can take stock negative
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .filter(ProdCol::Id.eq(product.id))
            .exec(&txn)
            .await?;

        CartItems::delete_by_id(item.id).exec(&txn).await?;
    }

    txn.commit().await?;
    Ok(order)
}

async fn order_with_items(state: &AppState, order: OrderModel) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}

/// The thank-you page for a freshly placed order.
pub async fn order_confirmation(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_with_items(state, order).await?;
    Ok(ApiResponse::success("Thank you for your order", data, Some(Meta::empty())))
}

/// Orders whose email matches the signed-in account's email.
pub async fn order_history(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let email = auth_service::current_email(state, user).await?;

    let items: Vec<Order> = Orders::find()
        .filter(OrderCol::EmailAddress.eq(email))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::count(items.len() as i64);
    Ok(ApiResponse::success("Order history", OrderList { items }, Some(meta)))
}

pub async fn order_for_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let email = auth_service::current_email(state, user).await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(id))
                .add(OrderCol::EmailAddress.eq(email)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_with_items(state, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::payments::{CustomerId, MockPaymentGateway, PaymentError};

    fn form() -> CheckoutForm {
        CheckoutForm {
            token: "tok_visa".into(),
            email: "buyer@example.com".into(),
            billing_name: "Buyer".into(),
            billing_address1: "1 Main St".into(),
            billing_city: "Springfield".into(),
            billing_postcode: "12345".into(),
            billing_country: "US".into(),
            shipping_name: "Buyer".into(),
            shipping_address1: "1 Main St".into(),
            shipping_city: "Springfield".into(),
            shipping_postcode: "12345".into(),
            shipping_country: "US".into(),
        }
    }

    #[tokio::test]
    async fn charges_customer_created_from_token() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_customer()
            .with(eq(NewCustomer {
                email: "buyer@example.com".into(),
                source: "tok_visa".into(),
            }))
            .times(1)
            .returning(|_| Ok(CustomerId("cus_123".into())));
        gateway
            .expect_create_charge()
            .with(eq(ChargeRequest {
                amount: 3998,
                currency: "usd".into(),
                description: "Z-Store - New Order".into(),
                customer: CustomerId("cus_123".into()),
            }))
            .times(1)
            .returning(|req| {
                Ok(Charge {
                    id: "ch_1".into(),
                    amount: req.amount,
                    paid: true,
                })
            });

        let charge = collect_payment(&gateway, &form(), 3998).await.unwrap();
        assert_eq!(charge.id, "ch_1");
        assert_eq!(charge.amount, 3998);
    }

    #[tokio::test]
    async fn card_decline_maps_to_payment_declined() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_customer()
            .returning(|_| Ok(CustomerId("cus_123".into())));
        gateway.expect_create_charge().returning(|_| {
            Err(PaymentError::Card {
                code: Some("card_declined".into()),
                message: "Your card was declined.".into(),
            })
        });

        let err = collect_payment(&gateway, &form(), 100).await.unwrap_err();
        assert!(matches!(err, AppError::PaymentDeclined(_)));
    }

    #[tokio::test]
    async fn unpaid_charge_is_a_decline() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_customer()
            .returning(|_| Ok(CustomerId("cus_123".into())));
        gateway.expect_create_charge().returning(|req| {
            Ok(Charge {
                id: "ch_pending".into(),
                amount: req.amount,
                paid: false,
            })
        });

        let err = collect_payment(&gateway, &form(), 100).await.unwrap_err();
        assert!(matches!(err, AppError::PaymentDeclined(_)));
    }

    #[tokio::test]
    async fn customer_failure_skips_charge() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_customer().returning(|_| {
            Err(PaymentError::Api {
                status: 500,
                message: "boom".into(),
            })
        });
        gateway.expect_create_charge().times(0);

        let err = collect_payment(&gateway, &form(), 100).await.unwrap_err();
        assert!(matches!(err, AppError::Payment(_)));
    }
}
