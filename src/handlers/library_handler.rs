//! Library Handler
//!
//! Owned games and profile counters.

use sqlx::PgPool;

use crate::domain::{LibraryEntry, OperationContext, ProfileStats};
use crate::error::AppError;

pub struct LibraryHandler {
    pool: PgPool,
}

impl LibraryHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Owned games with the price paid, newest purchase first
    pub async fn library(&self, context: &OperationContext) -> Result<Vec<LibraryEntry>, AppError> {
        let user_id = context.require_user()?;

        let entries = sqlx::query_as::<_, LibraryEntry>(
            r#"
            SELECT p.game_id, g.title, g.image, g.developer, c.name AS category_name,
                   p.price_paid, p.purchased_at
            FROM purchases p
            JOIN games g ON g.id = p.game_id
            LEFT JOIN categories c ON c.id = g.category_id
            WHERE p.user_id = $1
            ORDER BY p.purchased_at DESC, p.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn stats(&self, context: &OperationContext) -> Result<ProfileStats, AppError> {
        let user_id = context.require_user()?;

        let stats = sqlx::query_as::<_, ProfileStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM purchases WHERE user_id = $1) AS games_owned,
                (SELECT COUNT(*) FROM wishlist_items WHERE user_id = $1) AS wishlist_count,
                (SELECT COUNT(*) FROM reviews WHERE user_id = $1) AS reviews_count,
                (SELECT COUNT(*) FROM cart_items WHERE user_id = $1) AS cart_count
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
