use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{SignInPage, SignInRequest, SignUpPage, SignUpRequest},
        cart::{CartLine, CartView, CheckoutForm},
        catalog::{Navigation, ProductDetail, ProductPage, ReviewForm, SearchResults},
        orders::{OrderList, OrderWithItems},
    },
    middleware::auth::AUTH_COOKIE,
    models::{Category, Order, OrderItem, Product, Review, User},
    response::{ApiResponse, Meta},
    routes::{account, cart, catalog, health, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(AUTH_COOKIE))),
        );
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        catalog::all_products,
        catalog::products_by_category,
        catalog::product_detail,
        catalog::review_product,
        catalog::search,
        catalog::menu,
        cart::cart_detail,
        cart::add_to_cart,
        cart::remove_one,
        cart::remove_product,
        cart::checkout,
        cart::thank_you,
        account::sign_up_page,
        account::sign_up,
        account::sign_in_page,
        account::sign_in,
        account::sign_out,
        orders::order_history,
        orders::view_order
    ),
    components(
        schemas(
            Category,
            Product,
            Review,
            User,
            Order,
            OrderItem,
            ProductPage,
            ProductDetail,
            ReviewForm,
            SearchResults,
            Navigation,
            CartLine,
            CartView,
            CheckoutForm,
            OrderList,
            OrderWithItems,
            SignUpRequest,
            SignInRequest,
            SignInPage,
            SignUpPage,
            params::PageQuery,
            health::HealthData,
            Meta,
            ApiResponse<ProductPage>,
            ApiResponse<ProductDetail>,
            ApiResponse<CartView>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<User>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness check"),
        (name = "Catalog", description = "Categories, products, reviews and search"),
        (name = "Cart", description = "Session cart and checkout"),
        (name = "Orders", description = "Order history for signed-in customers"),
        (name = "Account", description = "Sign-up, sign-in and sign-out"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
