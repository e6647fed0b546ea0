//! Checkout Handler
//!
//! Converts the caller's cart into purchases in a single transaction.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::Instrument;

use crate::catalog::query::effective_price;
use crate::db::transaction_error;
use crate::domain::{DomainError, Money, OperationContext};
use crate::error::AppError;

use super::ownership::{self, user_not_found};
use super::CheckoutResult;

/// Handler for atomic checkout
pub struct CheckoutHandler {
    pool: PgPool,
}

impl CheckoutHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Purchase every game in the cart at its current effective price.
    ///
    /// Either every cart line becomes a purchase and the cart is emptied, or
    /// nothing changes.
    pub async fn execute(&self, context: &OperationContext) -> Result<CheckoutResult, AppError> {
        let user_id = context.require_user()?;

        if ownership::cart_count(&self.pool, user_id).await? == 0 {
            return Err(DomainError::EmptyCart.into());
        }

        // Once started, the settlement runs to commit or rollback even if the
        // caller goes away.
        let pool = self.pool.clone();
        let settlement = tokio::spawn(settle(pool, user_id).in_current_span());

        let result = settlement
            .await
            .map_err(|e| AppError::Internal(format!("checkout task failed: {}", e)))??;

        tracing::info!(
            user_id,
            games_count = result.games_count,
            total = %result.total_charged,
            "Checkout completed"
        );

        Ok(result)
    }
}

async fn settle(pool: PgPool, user_id: i64) -> Result<CheckoutResult, DomainError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| transaction_error("checkout", e))?;

    // Serializes concurrent checkouts (and cart writes) of the same user
    let user_exists = ownership::lock_user(&mut *tx, user_id)
        .await
        .map_err(|e| transaction_error("checkout", e))?;
    if !user_exists {
        return Err(user_not_found(user_id));
    }

    let lines: Vec<(i64, Decimal)> = sqlx::query_as(concat!(
        "SELECT ci.game_id, ",
        effective_price!(),
        " AS effective_price \
         FROM cart_items ci \
         JOIN games g ON g.id = ci.game_id \
         WHERE ci.user_id = $1 \
         ORDER BY ci.game_id ASC \
         FOR UPDATE OF ci"
    ))
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| transaction_error("checkout", e))?;

    // A concurrent checkout emptied the cart while we waited for the lock
    if lines.is_empty() {
        return Err(DomainError::EmptyCart);
    }

    let prices: Vec<Money> = lines.iter().map(|(_, price)| Money::from_store(*price)).collect();
    let total_charged = Money::sum(&prices).map_err(|e| {
        tracing::error!(user_id, error = %e, "Checkout total out of range");
        DomainError::TransactionFailed
    })?;

    for ((game_id, _), price) in lines.iter().zip(&prices) {
        sqlx::query("INSERT INTO purchases (user_id, game_id, price_paid) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(*game_id)
            .bind(price.value())
            .execute(&mut *tx)
            .await
            .map_err(|e| transaction_error("checkout", e))?;
    }

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| transaction_error("checkout", e))?;

    tx.commit()
        .await
        .map_err(|e| transaction_error("checkout", e))?;

    Ok(CheckoutResult {
        total_charged,
        games_count: lines.len(),
        game_ids: lines.into_iter().map(|(game_id, _)| game_id).collect(),
    })
}
