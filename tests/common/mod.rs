//! Common test utilities
//!
//! Tests share one database. Nothing is truncated: every fixture gets a
//! unique name, so test binaries and tests within them can run in parallel.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use game_store::api::middleware::hash_api_key;
use game_store::db::SCHEMA_SQL;
use game_store::domain::{Identity, OperationContext, Role};

pub const TEST_API_KEY: &str = "test_key_123";

/// Arbitrary key serializing concurrent schema application
const SCHEMA_LOCK_KEY: i64 = 7_340_112;

/// Connect, apply the schema and seed the test API key
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    // DDL is not safe to run concurrently; hold a session lock on one connection
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .expect("Failed to take schema lock");
    (&mut *conn)
        .execute(SCHEMA_SQL)
        .await
        .expect("Failed to apply schema");
    sqlx::query("SELECT pg_advisory_unlock($1)")
        .bind(SCHEMA_LOCK_KEY)
        .execute(&mut *conn)
        .await
        .expect("Failed to release schema lock");
    drop(conn);

    sqlx::query(
        r#"
        INSERT INTO api_keys (name, key_prefix, key_hash, is_active)
        VALUES ('Test Key', 'test_', $1, TRUE)
        ON CONFLICT (key_hash) DO NOTHING
        "#,
    )
    .bind(hash_api_key(TEST_API_KEY))
    .execute(&pool)
    .await
    .expect("Failed to seed API key");

    pool
}

/// Short random token for unique fixture names and search filters
pub fn unique_token() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub async fn create_user(pool: &PgPool, role: Role) -> i64 {
    let token = unique_token();
    sqlx::query_scalar(
        r#"
        INSERT INTO users (username, email, password_hash, role)
        VALUES ($1, $2, 'not-a-real-hash', $3)
        RETURNING id
        "#,
    )
    .bind(format!("player_{}", token))
    .bind(format!("player_{}@example.test", token))
    .bind(role.to_string())
    .fetch_one(pool)
    .await
    .expect("Failed to seed user")
}

pub async fn create_category(pool: &PgPool) -> i64 {
    sqlx::query_scalar("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(format!("Category {}", unique_token()))
        .fetch_one(pool)
        .await
        .expect("Failed to seed category")
}

/// Game fixture; only title and prices matter to most tests
pub struct GameSeed {
    pub title: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub category_id: Option<i64>,
    pub is_featured: bool,
}

impl GameSeed {
    pub fn new(title: impl Into<String>, price: Decimal) -> Self {
        Self {
            title: title.into(),
            price,
            discount_price: None,
            category_id: None,
            is_featured: false,
        }
    }

    pub fn discounted(mut self, discount_price: Decimal) -> Self {
        self.discount_price = Some(discount_price);
        self
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }
}

pub async fn create_game(pool: &PgPool, seed: GameSeed) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO games (
            title, description, price, discount_price, category_id, developer, is_featured
        )
        VALUES ($1, 'fixture', $2, $3, $4, 'Fixture Studio', $5)
        RETURNING id
        "#,
    )
    .bind(seed.title)
    .bind(seed.price)
    .bind(seed.discount_price)
    .bind(seed.category_id)
    .bind(seed.is_featured)
    .fetch_one(pool)
    .await
    .expect("Failed to seed game")
}

/// Record a purchase directly, bypassing checkout
pub async fn insert_purchase(pool: &PgPool, user_id: i64, game_id: i64, price_paid: Decimal) {
    sqlx::query("INSERT INTO purchases (user_id, game_id, price_paid) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(game_id)
        .bind(price_paid)
        .execute(pool)
        .await
        .expect("Failed to seed purchase");
}

pub fn context_for(user_id: i64, role: Role) -> OperationContext {
    OperationContext::new()
        .with_identity(Identity::new(user_id, role))
        .with_correlation_id(Uuid::new_v4())
}

pub async fn new_user_context(pool: &PgPool) -> (i64, OperationContext) {
    let user_id = create_user(pool, Role::User).await;
    (user_id, context_for(user_id, Role::User))
}

pub async fn new_admin_context(pool: &PgPool) -> (i64, OperationContext) {
    let user_id = create_user(pool, Role::Admin).await;
    (user_id, context_for(user_id, Role::Admin))
}
