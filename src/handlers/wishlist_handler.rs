//! Wishlist Handler
//!
//! Idempotent add/remove toggle and wishlist listing.

use std::time::Duration;

use sqlx::PgPool;

use crate::catalog::query::effective_price;
use crate::db;
use crate::domain::{DomainError, OperationContext, WishlistLine};
use crate::error::AppError;

use super::ownership::{self, ensure_valid_id};
use super::WishlistToggleResult;

/// Maximum toggle attempts when a concurrent insert wins the race
const MAX_ATTEMPTS: u32 = 3;

/// Handler for the caller's wishlist
pub struct WishlistHandler {
    pool: PgPool,
}

impl WishlistHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Remove the game if wishlisted, otherwise add it
    pub async fn toggle(
        &self,
        game_id: i64,
        context: &OperationContext,
    ) -> Result<WishlistToggleResult, AppError> {
        let user_id = context.require_user()?;
        ensure_valid_id(game_id, "game_id")?;

        let mut attempt = 1;
        loop {
            match self.try_toggle(user_id, game_id).await {
                Ok(result) => {
                    tracing::info!(
                        user_id,
                        game_id,
                        added = result.added,
                        wishlist_count = result.wishlist_count,
                        "Wishlist toggled"
                    );
                    return Ok(result);
                }
                Err(e) if db::is_unique_violation(&e) && attempt < MAX_ATTEMPTS => {
                    tracing::warn!(
                        user_id,
                        game_id,
                        "Concurrent wishlist insert, retrying (attempt {}/{})",
                        attempt,
                        MAX_ATTEMPTS
                    );
                    tokio::time::sleep(Duration::from_millis(10 * u64::from(attempt))).await;
                    attempt += 1;
                }
                Err(e) if db::is_unique_violation(&e) => {
                    return Err(DomainError::Conflict(format!(
                        "wishlist entry for game {} is being modified concurrently",
                        game_id
                    ))
                    .into());
                }
                Err(e) if db::is_foreign_key_violation(&e) => {
                    return Err(DomainError::game_not_found(game_id).into());
                }
                Err(e) => return Err(AppError::Database(e)),
            }
        }
    }

    /// One toggle attempt in its own transaction
    async fn try_toggle(
        &self,
        user_id: i64,
        game_id: i64,
    ) -> Result<WishlistToggleResult, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND game_id = $2")
            .bind(user_id)
            .bind(game_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query("INSERT INTO wishlist_items (user_id, game_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(game_id)
                .execute(&mut *tx)
                .await?;
        }

        let wishlist_count = ownership::wishlist_count(&mut *tx, user_id).await?;
        tx.commit().await?;

        Ok(WishlistToggleResult {
            game_id,
            added: !removed,
            wishlist_count,
        })
    }

    /// Wishlisted games, newest first
    pub async fn list(&self, context: &OperationContext) -> Result<Vec<WishlistLine>, AppError> {
        let user_id = context.require_user()?;

        let lines = sqlx::query_as::<_, WishlistLine>(concat!(
            "SELECT w.game_id, g.title, g.image, c.name AS category_name, \
             g.price, g.discount_price, ",
            effective_price!(),
            " AS effective_price, w.added_at \
             FROM wishlist_items w \
             JOIN games g ON g.id = w.game_id \
             LEFT JOIN categories c ON c.id = g.category_id \
             WHERE w.user_id = $1 \
             ORDER BY w.added_at DESC, w.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}
