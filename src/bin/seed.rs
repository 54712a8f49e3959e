use std::str::FromStr;

use axum_storefront::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    services::auth_service::{CUSTOMER_ROLE, hash_password},
};
use rust_decimal::Decimal;
use uuid::Uuid;

struct SeedProduct {
    category: &'static str,
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    price: &'static str,
    stock: i32,
}

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Shirts", "shirts", "Tees and button-downs"),
    ("Hoodies", "hoodies", "Warm layers for cold server rooms"),
    ("Accessories", "accessories", "Mugs, stickers and the rest"),
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        category: "shirts",
        name: "Ferris T-Shirt",
        slug: "ferris-t-shirt",
        description: "Soft cotton tee with an orange crab",
        price: "19.99",
        stock: 25,
    },
    SeedProduct {
        category: "shirts",
        name: "Oxford Shirt",
        slug: "oxford-shirt",
        description: "Button-down for release day",
        price: "39.50",
        stock: 10,
    },
    SeedProduct {
        category: "hoodies",
        name: "Async Hoodie",
        slug: "async-hoodie",
        description: "Zip hoodie that never blocks",
        price: "55.00",
        stock: 12,
    },
    SeedProduct {
        category: "accessories",
        name: "Ferris Mug",
        slug: "ferris-mug",
        description: "Coffee tastes better with Ferris",
        price: "12.00",
        stock: 40,
    },
    SeedProduct {
        category: "accessories",
        name: "Sticker Pack",
        slug: "sticker-pack",
        description: "Decorate your laptop",
        price: "5.00",
        stock: 200,
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    seed_categories(&pool).await?;
    seed_products(&pool).await?;
    let user_id = ensure_customer(&pool, "customer", "customer@example.com", "customer123").await?;

    println!("Seed completed. Customer ID: {user_id}");
    Ok(())
}

async fn seed_categories(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for &(name, slug, description) in CATEGORIES {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, slug, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .bind(description)
        .execute(pool)
        .await?;
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for product in PRODUCTS {
        let price = Decimal::from_str(product.price)?;
        sqlx::query(
            r#"
            INSERT INTO products (id, category_id, name, slug, description, price, stock)
            SELECT $1, c.id, $2, $3, $4, $5, $6
            FROM categories c
            WHERE c.slug = $7
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product.name)
        .bind(product.slug)
        .bind(product.description)
        .bind(price)
        .bind(product.stock)
        .bind(product.category)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn ensure_customer(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<Uuid> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        println!("Customer {username} already present");
        return Ok(id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, email, first_name, last_name, password_hash, role)
        VALUES ($1, $2, $3, 'Demo', 'Customer', $4, $5)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(CUSTOMER_ROLE)
    .fetch_one(pool)
    .await?;

    println!("Created customer {username} ({email})");
    Ok(id)
}
