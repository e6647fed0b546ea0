//! Catalog read side
//!
//! Paged catalog queries, type-ahead search, featured games, categories and
//! the game detail page.

use sqlx::PgPool;

use crate::domain::{
    CategoryWithCount, DomainError, GameDetail, GameImage, GameSummary, OperationContext,
    ReviewView, SearchHit, ViewerState,
};
use crate::error::AppError;
use crate::handlers::ownership::{self, ensure_valid_id};

use super::query::{count_query, effective_price, game_columns, game_summary_select, page_query};
use super::{CatalogPage, CatalogQuery, Pagination};

/// Type-ahead search needs at least this many characters
pub const QUICK_SEARCH_MIN_CHARS: usize = 2;
pub const QUICK_SEARCH_LIMIT: i64 = 10;
pub const FEATURED_LIMIT: i64 = 5;
pub const RECENT_REVIEWS_LIMIT: i64 = 10;
pub const SIMILAR_GAMES_LIMIT: i64 = 4;

#[derive(sqlx::FromRow)]
struct GameDetailRow {
    #[sqlx(flatten)]
    game: GameSummary,
    video_url: Option<String>,
}

/// Read-only access to the catalog
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One catalog page plus the exact total for the same predicate.
    ///
    /// Both statements run in one read-only snapshot so `total` matches the
    /// rows the page was cut from.
    pub async fn query(&self, query: &CatalogQuery) -> Result<CatalogPage, AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let games: Vec<GameSummary> = page_query(query)
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        let total: i64 = count_query(query)
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            total,
            page = query.page,
            limit = query.limit,
            returned = games.len(),
            "Catalog query"
        );

        Ok(CatalogPage {
            games,
            pagination: Pagination::new(total, query.page, query.limit),
        })
    }

    /// Up to 10 games whose title or developer contains `term`
    pub async fn quick_search(&self, term: &str) -> Result<Vec<SearchHit>, AppError> {
        let term = match super::search_term(term) {
            Some(term) if term.chars().count() >= QUICK_SEARCH_MIN_CHARS => term,
            _ => return Ok(Vec::new()),
        };

        let pattern = super::like_pattern(&term);
        let hits = sqlx::query_as::<_, SearchHit>(concat!(
            "SELECT g.id, g.title, g.image, ",
            effective_price!(),
            " AS effective_price FROM games g \
             WHERE g.title ILIKE $1 OR g.developer ILIKE $1 \
             ORDER BY g.title ASC, g.id ASC LIMIT $2"
        ))
        .bind(pattern)
        .bind(QUICK_SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(hits)
    }

    /// Newest featured games
    pub async fn featured(&self) -> Result<Vec<GameSummary>, AppError> {
        let games = sqlx::query_as::<_, GameSummary>(concat!(
            game_summary_select!(),
            " WHERE g.is_featured ORDER BY g.created_at DESC, g.id DESC LIMIT $1"
        ))
        .bind(FEATURED_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(games)
    }

    pub async fn categories(&self) -> Result<Vec<CategoryWithCount>, AppError> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.id, c.name, c.icon, c.description, COUNT(g.id) AS game_count
            FROM categories c
            LEFT JOIN games g ON g.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Single listing entry, `None` if the game does not exist
    pub async fn summary(&self, game_id: i64) -> Result<Option<GameSummary>, AppError> {
        let game =
            sqlx::query_as::<_, GameSummary>(concat!(game_summary_select!(), " WHERE g.id = $1"))
                .bind(game_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(game)
    }

    /// Game page with extra images, the most recent reviews, similar games
    /// and, for an identified caller, whether they own, cart or wishlist it
    pub async fn get_game(
        &self,
        game_id: i64,
        context: &OperationContext,
    ) -> Result<GameDetail, AppError> {
        ensure_valid_id(game_id, "game_id")?;

        let row = sqlx::query_as::<_, GameDetailRow>(concat!(
            "SELECT ",
            game_columns!(),
            ", g.video_url FROM games g LEFT JOIN categories c ON c.id = g.category_id \
             WHERE g.id = $1"
        ))
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DomainError::game_not_found(game_id))?;

        let images = sqlx::query_as::<_, GameImage>(
            r#"
            SELECT id, image, sort_order
            FROM game_images
            WHERE game_id = $1
            ORDER BY sort_order ASC, id ASC
            "#,
        )
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;

        let reviews = sqlx::query_as::<_, ReviewView>(
            r#"
            SELECT r.id, r.user_id, u.username, r.rating, r.comment, r.created_at, r.updated_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.game_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            LIMIT $2
            "#,
        )
        .bind(game_id)
        .bind(RECENT_REVIEWS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let review_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE game_id = $1")
                .bind(game_id)
                .fetch_one(&self.pool)
                .await?;

        let similar = match row.game.category_id {
            Some(category_id) => {
                sqlx::query_as::<_, GameSummary>(concat!(
                    game_summary_select!(),
                    " WHERE g.category_id = $1 AND g.id <> $2 \
                     ORDER BY g.rating DESC, g.id ASC LIMIT $3"
                ))
                .bind(category_id)
                .bind(game_id)
                .bind(SIMILAR_GAMES_LIMIT)
                .fetch_all(&self.pool)
                .await?
            }
            None => Vec::new(),
        };

        let viewer = match context.current_user_id() {
            Some(user_id) => self.viewer_state(user_id, game_id).await?,
            None => ViewerState::default(),
        };

        let discount_percent = row.game.pricing().discount_percent();

        Ok(GameDetail {
            game: row.game,
            video_url: row.video_url,
            discount_percent,
            review_count,
            viewer,
            images,
            reviews,
            similar,
        })
    }

    async fn viewer_state(&self, user_id: i64, game_id: i64) -> Result<ViewerState, AppError> {
        Ok(ViewerState {
            owned: ownership::owns_game(&self.pool, user_id, game_id).await?,
            in_cart: ownership::in_cart(&self.pool, user_id, game_id).await?,
            in_wishlist: ownership::in_wishlist(&self.pool, user_id, game_id).await?,
        })
    }
}
