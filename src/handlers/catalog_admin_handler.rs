//! Catalog Admin Handler
//!
//! Category and game maintenance, restricted to admin identities. Pricing
//! changes only affect future checkouts; recorded purchases keep the price
//! that was paid.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::catalog::CatalogRepository;
use crate::db;
use crate::domain::{DomainError, GameSummary, Money, OperationContext, Pricing};
use crate::error::AppError;

use super::ownership::ensure_valid_id;
use super::{
    CategoryResult, CreateCategoryCommand, CreateGameCommand, UpdateGameCommand,
    UpdatePricingCommand,
};

pub struct CatalogAdminHandler {
    pool: PgPool,
    catalog: CatalogRepository,
}

impl CatalogAdminHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            catalog: CatalogRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn create_category(
        &self,
        command: CreateCategoryCommand,
        context: &OperationContext,
    ) -> Result<CategoryResult, AppError> {
        let admin_id = context.require_admin()?;

        let name = command.name.trim();
        if name.is_empty() {
            return Err(DomainError::invalid_input("category name must not be empty").into());
        }

        let category = sqlx::query_as::<_, CategoryResult>(
            r#"
            INSERT INTO categories (name, icon, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, icon, description
            "#,
        )
        .bind(name)
        .bind(&command.icon)
        .bind(&command.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                AppError::from(DomainError::Conflict(format!("category '{}' already exists", name)))
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(admin_id, category_id = category.id, "Category created");

        Ok(category)
    }

    /// Refused while any game still references the category
    pub async fn delete_category(
        &self,
        category_id: i64,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        let admin_id = context.require_admin()?;
        ensure_valid_id(category_id, "category_id")?;

        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
                .bind(category_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(DomainError::NotFound(format!("category {}", category_id)).into());
        }

        let games: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games WHERE category_id = $1")
            .bind(category_id)
            .fetch_one(&mut *tx)
            .await?;
        if games > 0 {
            return Err(DomainError::Conflict(format!(
                "category {} is still used by {} games",
                category_id, games
            ))
            .into());
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(admin_id, category_id, "Category deleted");

        Ok(())
    }

    pub async fn create_game(
        &self,
        command: CreateGameCommand,
        context: &OperationContext,
    ) -> Result<GameSummary, AppError> {
        let admin_id = context.require_admin()?;

        let title = command.title.trim();
        if title.is_empty() {
            return Err(DomainError::invalid_input("title must not be empty").into());
        }
        if let Some(category_id) = command.category_id {
            ensure_valid_id(category_id, "category_id")?;
        }
        let pricing = parse_pricing(&command.price, command.discount_price.as_deref())?;

        let game_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO games (
                title, description, price, discount_price, category_id, developer,
                publisher, release_date, image, banner_image, video_url, is_featured
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(title)
        .bind(&command.description)
        .bind(pricing.price.value())
        .bind(pricing.discount_price.map(|d| d.value()))
        .bind(command.category_id)
        .bind(&command.developer)
        .bind(&command.publisher)
        .bind(command.release_date)
        .bind(&command.image)
        .bind(&command.banner_image)
        .bind(&command.video_url)
        .bind(command.is_featured)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| category_reference_error(e, command.category_id))?;

        tracing::info!(admin_id, game_id, price = %pricing.price, "Game created");

        self.fetch_summary(game_id).await
    }

    /// Replace list price and discount of a game
    pub async fn update_pricing(
        &self,
        game_id: i64,
        command: UpdatePricingCommand,
        context: &OperationContext,
    ) -> Result<GameSummary, AppError> {
        let admin_id = context.require_admin()?;
        ensure_valid_id(game_id, "game_id")?;
        let pricing = parse_pricing(&command.price, command.discount_price.as_deref())?;

        let updated = sqlx::query("UPDATE games SET price = $2, discount_price = $3 WHERE id = $1")
            .bind(game_id)
            .bind(pricing.price.value())
            .bind(pricing.discount_price.map(|d| d.value()))
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            return Err(DomainError::game_not_found(game_id).into());
        }

        tracing::info!(
            admin_id,
            game_id,
            price = %pricing.price,
            effective = %pricing.effective(),
            "Game pricing updated"
        );

        self.fetch_summary(game_id).await
    }

    /// Change listing fields of a game; fields left out keep their value
    pub async fn update_game(
        &self,
        game_id: i64,
        command: UpdateGameCommand,
        context: &OperationContext,
    ) -> Result<GameSummary, AppError> {
        let admin_id = context.require_admin()?;
        ensure_valid_id(game_id, "game_id")?;
        if command.is_empty() {
            return Err(DomainError::invalid_input("no fields to update").into());
        }
        let title = match command.title.as_deref().map(str::trim) {
            Some("") => return Err(DomainError::invalid_input("title must not be empty").into()),
            title => title.map(str::to_string),
        };
        if let Some(category_id) = command.category_id {
            ensure_valid_id(category_id, "category_id")?;
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE games SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(title) = title {
                fields.push("title = ").push_bind_unseparated(title);
            }
            if let Some(description) = command.description.clone() {
                fields.push("description = ").push_bind_unseparated(description);
            }
            if let Some(category_id) = command.category_id {
                fields.push("category_id = ").push_bind_unseparated(category_id);
            }
            if let Some(developer) = command.developer.clone() {
                fields.push("developer = ").push_bind_unseparated(developer);
            }
            if let Some(publisher) = command.publisher.clone() {
                fields.push("publisher = ").push_bind_unseparated(publisher);
            }
            if let Some(release_date) = command.release_date {
                fields.push("release_date = ").push_bind_unseparated(release_date);
            }
            if let Some(image) = command.image.clone() {
                fields.push("image = ").push_bind_unseparated(image);
            }
            if let Some(banner_image) = command.banner_image.clone() {
                fields.push("banner_image = ").push_bind_unseparated(banner_image);
            }
            if let Some(video_url) = command.video_url.clone() {
                fields.push("video_url = ").push_bind_unseparated(video_url);
            }
            if let Some(is_featured) = command.is_featured {
                fields.push("is_featured = ").push_bind_unseparated(is_featured);
            }
        }
        builder.push(" WHERE id = ").push_bind(game_id);

        let updated = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| category_reference_error(e, command.category_id))?
            .rows_affected();

        if updated == 0 {
            return Err(DomainError::game_not_found(game_id).into());
        }

        tracing::info!(admin_id, game_id, "Game listing updated");

        self.fetch_summary(game_id).await
    }

    /// Refused once anyone owns the game, so purchase records are never lost
    pub async fn delete_game(
        &self,
        game_id: i64,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        let admin_id = context.require_admin()?;
        ensure_valid_id(game_id, "game_id")?;

        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM games WHERE id = $1 FOR UPDATE")
                .bind(game_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(DomainError::game_not_found(game_id).into());
        }

        let owners: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE game_id = $1")
            .bind(game_id)
            .fetch_one(&mut *tx)
            .await?;
        if owners > 0 {
            return Err(DomainError::Conflict(format!(
                "game {} is owned by {} users",
                game_id, owners
            ))
            .into());
        }

        sqlx::query("DELETE FROM games WHERE id = $1")
            .bind(game_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(admin_id, game_id, "Game deleted");

        Ok(())
    }

    async fn fetch_summary(&self, game_id: i64) -> Result<GameSummary, AppError> {
        self.catalog
            .summary(game_id)
            .await?
            .ok_or_else(|| DomainError::game_not_found(game_id).into())
    }
}

fn parse_pricing(price: &str, discount_price: Option<&str>) -> Result<Pricing, DomainError> {
    let price: Money = price
        .parse()
        .map_err(|e| DomainError::invalid_input(format!("price: {}", e)))?;

    let discount_price = discount_price
        .filter(|d| !d.trim().is_empty())
        .map(|d| d.parse::<Money>())
        .transpose()
        .map_err(|e| DomainError::invalid_input(format!("discount_price: {}", e)))?;

    Pricing::new(price, discount_price).map_err(|e| DomainError::invalid_input(e.to_string()))
}

fn category_reference_error(err: sqlx::Error, category_id: Option<i64>) -> AppError {
    match (db::is_foreign_key_violation(&err), category_id) {
        (true, Some(id)) => DomainError::NotFound(format!("category {}", id)).into(),
        _ => AppError::Database(err),
    }
}
