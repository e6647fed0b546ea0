//! Review Handler
//!
//! Creates or replaces a user's review and recomputes the game's aggregate
//! rating in the same transaction.

use rust_decimal::Decimal;
use sqlx::{Connection, PgPool};

use crate::db::{self, transaction_error};
use crate::domain::{DomainError, OperationContext};
use crate::error::AppError;

use super::ownership::{self, ensure_valid_id};
use super::{ReviewResult, SubmitReviewCommand};

/// Handler for review submission
pub struct ReviewHandler {
    pool: PgPool,
}

impl ReviewHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn submit(
        &self,
        game_id: i64,
        command: SubmitReviewCommand,
        context: &OperationContext,
    ) -> Result<ReviewResult, AppError> {
        let user_id = context.require_user()?;
        ensure_valid_id(game_id, "game_id")?;
        let rating = command.validated_rating()?;
        let comment = command.validated_comment()?;

        let result = write_review(&self.pool, user_id, game_id, rating, &comment).await?;

        tracing::info!(
            user_id,
            game_id,
            rating,
            created = result.created,
            game_rating = %result.game_rating,
            "Review submitted"
        );

        Ok(result)
    }
}

async fn write_review(
    pool: &PgPool,
    user_id: i64,
    game_id: i64,
    rating: i16,
    comment: &str,
) -> Result<ReviewResult, DomainError> {
    let fail = |e: sqlx::Error| transaction_error("submit_review", e);

    let mut tx = pool.begin().await.map_err(fail)?;

    // Serializes rating recomputation per game
    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM games WHERE id = $1 FOR UPDATE")
        .bind(game_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(fail)?;
    if locked.is_none() {
        return Err(DomainError::game_not_found(game_id));
    }

    if !ownership::owns_game(&mut *tx, user_id, game_id)
        .await
        .map_err(fail)?
    {
        return Err(DomainError::NotOwned { game_id });
    }

    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM reviews WHERE user_id = $1 AND game_id = $2")
            .bind(user_id)
            .bind(game_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(fail)?;

    let inserted = match existing {
        Some(_) => false,
        None => {
            // Savepoint, so a unique violation leaves the outer transaction
            // usable and the write falls through to the update branch.
            let mut savepoint = tx.begin().await.map_err(fail)?;
            let insert = sqlx::query(
                r#"
                INSERT INTO reviews (user_id, game_id, rating, comment)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(user_id)
            .bind(game_id)
            .bind(rating)
            .bind(comment)
            .execute(&mut *savepoint)
            .await;

            match insert {
                Ok(_) => {
                    savepoint.commit().await.map_err(fail)?;
                    true
                }
                Err(e) if db::is_unique_violation(&e) => {
                    savepoint.rollback().await.map_err(fail)?;
                    false
                }
                Err(e) => return Err(fail(e)),
            }
        }
    };

    if !inserted {
        sqlx::query(
            r#"
            UPDATE reviews
            SET rating = $3, comment = $4, updated_at = NOW()
            WHERE user_id = $1 AND game_id = $2
            "#,
        )
        .bind(user_id)
        .bind(game_id)
        .bind(rating)
        .bind(comment)
        .execute(&mut *tx)
        .await
        .map_err(fail)?;
    }

    let game_rating: Decimal = sqlx::query_scalar(
        r#"
        UPDATE games
        SET rating = COALESCE(
            (SELECT ROUND(AVG(rating), 2) FROM reviews WHERE game_id = $1),
            0
        )
        WHERE id = $1
        RETURNING rating
        "#,
    )
    .bind(game_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(fail)?;

    tx.commit().await.map_err(fail)?;

    Ok(ReviewResult {
        game_id,
        rating,
        created: inserted,
        game_rating,
    })
}
