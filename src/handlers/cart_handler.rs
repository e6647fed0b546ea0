//! Cart Handler
//!
//! Adds, removes and lists cart entries. Cart writes take the same per-user
//! row lock as checkout, so a game can never sit in the cart of a user who
//! has just bought it.

use sqlx::PgPool;

use crate::catalog::query::effective_price;
use crate::db;
use crate::domain::{CartLine, DomainError, Money, OperationContext};
use crate::error::AppError;

use super::ownership::{self, ensure_valid_id, user_not_found};
use super::{AddToCartCommand, CartMutationResult, CartSummary};

/// Handler for the caller's cart
pub struct CartHandler {
    pool: PgPool,
}

impl CartHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a game to the cart
    pub async fn add(
        &self,
        command: AddToCartCommand,
        context: &OperationContext,
    ) -> Result<CartMutationResult, AppError> {
        let user_id = context.require_user()?;
        let game_id = command.game_id;
        ensure_valid_id(game_id, "game_id")?;

        let mut tx = self.pool.begin().await?;

        if !ownership::lock_user(&mut *tx, user_id).await? {
            return Err(user_not_found(user_id).into());
        }

        if !ownership::game_exists(&mut *tx, game_id).await? {
            return Err(DomainError::game_not_found(game_id).into());
        }

        if ownership::owns_game(&mut *tx, user_id, game_id).await? {
            return Err(DomainError::AlreadyOwned { game_id }.into());
        }

        if ownership::in_cart(&mut *tx, user_id, game_id).await? {
            return Err(DomainError::AlreadyInCart { game_id }.into());
        }

        // The unique constraint has the final word on duplicates
        let inserted = sqlx::query("INSERT INTO cart_items (user_id, game_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(game_id)
            .execute(&mut *tx)
            .await;

        if let Err(e) = inserted {
            return Err(match e {
                e if db::is_unique_violation(&e) => DomainError::AlreadyInCart { game_id }.into(),
                e if db::is_foreign_key_violation(&e) => {
                    DomainError::game_not_found(game_id).into()
                }
                e => AppError::Database(e),
            });
        }

        let cart_count = ownership::cart_count(&mut *tx, user_id).await?;
        tx.commit().await?;

        tracing::info!(user_id, game_id, cart_count, "Game added to cart");

        Ok(CartMutationResult {
            game_id: Some(game_id),
            cart_count,
        })
    }

    /// Remove a game from the cart
    pub async fn remove(
        &self,
        game_id: i64,
        context: &OperationContext,
    ) -> Result<CartMutationResult, AppError> {
        let user_id = context.require_user()?;
        ensure_valid_id(game_id, "game_id")?;

        let deleted = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND game_id = $2")
            .bind(user_id)
            .bind(game_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(DomainError::NotFound(format!("cart entry for game {}", game_id)).into());
        }

        let cart_count = ownership::cart_count(&self.pool, user_id).await?;

        tracing::info!(user_id, game_id, cart_count, "Game removed from cart");

        Ok(CartMutationResult {
            game_id: Some(game_id),
            cart_count,
        })
    }

    /// Empty the cart. Always succeeds.
    pub async fn clear(&self, context: &OperationContext) -> Result<CartMutationResult, AppError> {
        let user_id = context.require_user()?;

        let removed = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(user_id, removed, "Cart cleared");

        Ok(CartMutationResult {
            game_id: None,
            cart_count: 0,
        })
    }

    /// Cart lines, newest first, with totals at current prices
    pub async fn get(&self, context: &OperationContext) -> Result<CartSummary, AppError> {
        let user_id = context.require_user()?;

        let items = sqlx::query_as::<_, CartLine>(concat!(
            "SELECT ci.game_id, g.title, g.image, c.name AS category_name, \
             g.price, g.discount_price, ",
            effective_price!(),
            " AS effective_price, ci.added_at \
             FROM cart_items ci \
             JOIN games g ON g.id = ci.game_id \
             LEFT JOIN categories c ON c.id = g.category_id \
             WHERE ci.user_id = $1 \
             ORDER BY ci.added_at DESC, ci.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        summarize(items)
    }
}

/// Totals over cart lines using `Money` arithmetic
pub(crate) fn summarize(items: Vec<CartLine>) -> Result<CartSummary, AppError> {
    let pricings: Vec<_> = items.iter().map(CartLine::pricing).collect();
    let effective: Vec<Money> = pricings.iter().map(|p| p.effective()).collect();
    let list: Vec<Money> = pricings.iter().map(|p| p.price).collect();

    let total = Money::sum(&effective).map_err(|e| AppError::Internal(e.to_string()))?;
    let original_total = Money::sum(&list).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(CartSummary {
        count: items.len(),
        items,
        total,
        original_total,
        savings: original_total.saturating_sub(&total),
    })
}
