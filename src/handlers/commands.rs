//! Command definitions
//!
//! Commands represent intentions to change the store state; results are
//! what each handler reports back.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{CartLine, DomainError, Money};

pub const MAX_COMMENT_CHARS: usize = 2000;

// =========================================================================
// Cart
// =========================================================================

/// Command to put a game into the caller's cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCartCommand {
    pub game_id: i64,
}

impl AddToCartCommand {
    pub fn new(game_id: i64) -> Self {
        Self { game_id }
    }
}

/// Cart size after a mutation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartMutationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<i64>,
    pub cart_count: i64,
}

/// Cart contents with totals computed at read time
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLine>,
    pub count: usize,
    pub total: Money,
    pub original_total: Money,
    pub savings: Money,
}

// =========================================================================
// Checkout
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutResult {
    pub total_charged: Money,
    pub games_count: usize,
    pub game_ids: Vec<i64>,
}

// =========================================================================
// Wishlist
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WishlistToggleResult {
    pub game_id: i64,
    /// true when the game was added, false when it was removed
    pub added: bool,
    pub wishlist_count: i64,
}

// =========================================================================
// Reviews
// =========================================================================

/// Command to create or replace the caller's review of a game
///
/// `rating` is kept as raw JSON so that `4.5`, `"6"` or `null` are reported
/// as invalid input instead of failing body deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReviewCommand {
    pub rating: Value,
    #[serde(default)]
    pub comment: Option<String>,
}

impl SubmitReviewCommand {
    pub fn new(rating: i64) -> Self {
        Self {
            rating: Value::from(rating),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Integer rating in 1..=5; integer strings are accepted as well
    pub fn validated_rating(&self) -> Result<i16, DomainError> {
        let rating = match &self.rating {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };

        match rating {
            Some(r) if (1..=5).contains(&r) => Ok(r as i16),
            _ => Err(DomainError::invalid_input(
                "rating must be an integer between 1 and 5",
            )),
        }
    }

    /// Trimmed comment, empty when absent
    pub fn validated_comment(&self) -> Result<String, DomainError> {
        let comment = self.comment.as_deref().unwrap_or("").trim();
        if comment.chars().count() > MAX_COMMENT_CHARS {
            return Err(DomainError::invalid_input(format!(
                "comment must be at most {} characters",
                MAX_COMMENT_CHARS
            )));
        }
        Ok(comment.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewResult {
    pub game_id: i64,
    pub rating: i16,
    /// false when an existing review was replaced
    pub created: bool,
    /// Aggregate rating of the game after this review
    pub game_rating: Decimal,
}

// =========================================================================
// Catalog administration
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryCommand {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryResult {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub description: Option<String>,
}

/// Command to list a new game. Prices are decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameCommand {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub discount_price: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub release_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl CreateGameCommand {
    pub fn new(title: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            price: price.into(),
            discount_price: None,
            category_id: None,
            developer: String::new(),
            publisher: String::new(),
            release_date: None,
            image: None,
            banner_image: None,
            video_url: None,
            is_featured: false,
        }
    }

    pub fn with_discount(mut self, discount_price: impl Into<String>) -> Self {
        self.discount_price = Some(discount_price.into());
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_developer(mut self, developer: impl Into<String>) -> Self {
        self.developer = developer.into();
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }
}

/// Command to change list price and discount of an existing game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePricingCommand {
    pub price: String,
    #[serde(default)]
    pub discount_price: Option<String>,
}

/// Partial edit of a game's listing. Absent fields keep their current value;
/// pricing goes through [`UpdatePricingCommand`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGameCommand {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub developer: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub release_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

impl UpdateGameCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_featured(mut self, is_featured: bool) -> Self {
        self.is_featured = Some(is_featured);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.developer.is_none()
            && self.publisher.is_none()
            && self.release_date.is_none()
            && self.image.is_none()
            && self.banner_image.is_none()
            && self.video_url.is_none()
            && self.is_featured.is_none()
    }
}
