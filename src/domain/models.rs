//! Read models
//!
//! Rows returned by catalog, cart, library and review queries. Monetary
//! columns are `NUMERIC(10, 2)` and serialize as 2-digit decimal strings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::Pricing;

/// Catalog listing entry
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GameSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub effective_price: Decimal,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub developer: String,
    pub publisher: String,
    pub release_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub banner_image: Option<String>,
    pub is_featured: bool,
    pub rating: Decimal,
    pub created_at: DateTime<Utc>,
}

impl GameSummary {
    pub fn pricing(&self) -> Pricing {
        Pricing::from_store(self.price, self.discount_price)
    }
}

/// Full game page: summary plus media, reviews, the caller's relation to
/// the game and similar games from the same category
#[derive(Debug, Clone, Serialize)]
pub struct GameDetail {
    #[serde(flatten)]
    pub game: GameSummary,
    pub video_url: Option<String>,
    pub discount_percent: u32,
    pub review_count: i64,
    pub viewer: ViewerState,
    pub images: Vec<GameImage>,
    pub reviews: Vec<ReviewView>,
    pub similar: Vec<GameSummary>,
}

/// Caller's relation to a game. All false for anonymous callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ViewerState {
    pub owned: bool,
    pub in_cart: bool,
    pub in_wishlist: bool,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GameImage {
    pub id: i64,
    pub image: String,
    pub sort_order: i32,
}

/// Minimal search hit used by type-ahead search
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub effective_price: Decimal,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryWithCount {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
    pub game_count: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReviewView {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One cart entry joined with its game
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub game_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub category_name: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub effective_price: Decimal,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    pub fn pricing(&self) -> Pricing {
        Pricing::from_store(self.price, self.discount_price)
    }
}

/// Owned game with the price locked in at checkout
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LibraryEntry {
    pub game_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub developer: String,
    pub category_name: Option<String>,
    pub price_paid: Decimal,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistLine {
    pub game_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub category_name: Option<String>,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub effective_price: Decimal,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProfileStats {
    pub games_owned: i64,
    pub wishlist_count: i64,
    pub reviews_count: i64,
    pub cart_count: i64,
}
