//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use crate::catalog::{CatalogPage, CatalogParams, CatalogQuery, CatalogRepository};
use crate::domain::{
    CategoryWithCount, GameDetail, GameSummary, LibraryEntry, OperationContext, ProfileStats,
    SearchHit, WishlistLine,
};
use crate::error::AppError;
use crate::handlers::{
    AddToCartCommand, CartHandler, CartMutationResult, CartSummary, CatalogAdminHandler,
    CategoryResult, CheckoutHandler, CheckoutResult, CreateCategoryCommand, CreateGameCommand,
    LibraryHandler, ReviewHandler, ReviewResult, SubmitReviewCommand, UpdateGameCommand,
    UpdatePricingCommand, WishlistHandler, WishlistToggleResult,
};

// =========================================================================
// Request/Response types
// =========================================================================

/// Decoded query-string pairs; repeated keys are kept rather than rejected
type QueryPairs = Query<Vec<(String, String)>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub game_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitReviewRequest {
    pub rating: Value,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub games: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryWithCount>,
}

#[derive(Debug, Serialize)]
pub struct WishlistResponse {
    pub count: usize,
    pub items: Vec<WishlistLine>,
}

#[derive(Debug, Serialize)]
pub struct LibraryResponse {
    pub count: usize,
    pub games: Vec<LibraryEntry>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<PgPool> {
    Router::new()
        // Catalog
        .route("/games", get(list_games))
        .route("/games/search", get(search_games))
        .route("/games/featured", get(featured_games))
        .route("/games/:game_id", get(get_game))
        .route("/games/:game_id/reviews", post(submit_review))
        .route("/categories", get(list_categories))
        // Cart and checkout
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_to_cart))
        .route("/cart/items/:game_id", delete(remove_from_cart))
        .route("/cart/checkout", post(checkout))
        // Wishlist, library, profile
        .route("/wishlist", get(get_wishlist))
        .route("/wishlist/:game_id/toggle", post(toggle_wishlist))
        .route("/library", get(get_library))
        .route("/me/stats", get(get_profile_stats))
        // Admin
        .route("/admin/categories", post(create_category))
        .route("/admin/categories/:category_id", delete(delete_category))
        .route("/admin/games", post(create_game))
        .route("/admin/games/:game_id", patch(update_game).delete(delete_game))
        .route("/admin/games/:game_id/pricing", patch(update_pricing))
}

// =========================================================================
// Catalog
// =========================================================================

/// GET /games
async fn list_games(
    State(pool): State<PgPool>,
    Query(pairs): QueryPairs,
) -> Result<Json<CatalogPage>, AppError> {
    let query = CatalogQuery::from(&CatalogParams::from_pairs(pairs));
    let page = CatalogRepository::new(pool).query(&query).await?;
    Ok(Json(page))
}

/// GET /games/search?q=
async fn search_games(
    State(pool): State<PgPool>,
    Query(pairs): QueryPairs,
) -> Result<Json<SearchResponse>, AppError> {
    let term = pairs
        .into_iter()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value)
        .unwrap_or_default();
    let games = CatalogRepository::new(pool).quick_search(&term).await?;
    Ok(Json(SearchResponse { games }))
}

async fn featured_games(State(pool): State<PgPool>) -> Result<Json<GamesResponse>, AppError> {
    let games = CatalogRepository::new(pool).featured().await?;
    Ok(Json(GamesResponse { games }))
}

async fn get_game(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<i64>,
) -> Result<Json<GameDetail>, AppError> {
    let game = CatalogRepository::new(pool)
        .get_game(game_id, &context)
        .await?;
    Ok(Json(game))
}

async fn list_categories(
    State(pool): State<PgPool>,
) -> Result<Json<CategoriesResponse>, AppError> {
    let categories = CatalogRepository::new(pool).categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}

/// POST /games/:game_id/reviews
///
/// 201 for a new review, 200 when an existing one was replaced.
async fn submit_review(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<i64>,
    Json(request): Json<SubmitReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResult>), AppError> {
    let command = SubmitReviewCommand {
        rating: request.rating,
        comment: request.comment,
    };

    let result = ReviewHandler::new(pool)
        .submit(game_id, command, &context)
        .await?;

    let status = if result.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)))
}

// =========================================================================
// Cart
// =========================================================================

async fn get_cart(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<CartSummary>, AppError> {
    let cart = CartHandler::new(pool).get(&context).await?;
    Ok(Json(cart))
}

async fn add_to_cart(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartMutationResult>), AppError> {
    let result = CartHandler::new(pool)
        .add(AddToCartCommand::new(request.game_id), &context)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

async fn remove_from_cart(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<i64>,
) -> Result<Json<CartMutationResult>, AppError> {
    let result = CartHandler::new(pool).remove(game_id, &context).await?;
    Ok(Json(result))
}

async fn clear_cart(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<CartMutationResult>, AppError> {
    let result = CartHandler::new(pool).clear(&context).await?;
    Ok(Json(result))
}

/// POST /cart/checkout
async fn checkout(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<CheckoutResult>, AppError> {
    let result = CheckoutHandler::new(pool).execute(&context).await?;
    Ok(Json(result))
}

// =========================================================================
// Wishlist, library, profile
// =========================================================================

async fn get_wishlist(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<WishlistResponse>, AppError> {
    let items = WishlistHandler::new(pool).list(&context).await?;
    Ok(Json(WishlistResponse {
        count: items.len(),
        items,
    }))
}

async fn toggle_wishlist(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<i64>,
) -> Result<Json<WishlistToggleResult>, AppError> {
    let result = WishlistHandler::new(pool).toggle(game_id, &context).await?;
    Ok(Json(result))
}

async fn get_library(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<LibraryResponse>, AppError> {
    let games = LibraryHandler::new(pool).library(&context).await?;
    Ok(Json(LibraryResponse {
        count: games.len(),
        games,
    }))
}

async fn get_profile_stats(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
) -> Result<Json<ProfileStats>, AppError> {
    let stats = LibraryHandler::new(pool).stats(&context).await?;
    Ok(Json(stats))
}

// =========================================================================
// Admin
// =========================================================================

async fn create_category(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(command): Json<CreateCategoryCommand>,
) -> Result<(StatusCode, Json<CategoryResult>), AppError> {
    let category = CatalogAdminHandler::new(pool)
        .create_category(command, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn delete_category(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(category_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    CatalogAdminHandler::new(pool)
        .delete_category(category_id, &context)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_game(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Json(command): Json<CreateGameCommand>,
) -> Result<(StatusCode, Json<GameSummary>), AppError> {
    let game = CatalogAdminHandler::new(pool)
        .create_game(command, &context)
        .await?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn update_game(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<i64>,
    Json(command): Json<UpdateGameCommand>,
) -> Result<Json<GameSummary>, AppError> {
    let game = CatalogAdminHandler::new(pool)
        .update_game(game_id, command, &context)
        .await?;
    Ok(Json(game))
}

async fn update_pricing(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<i64>,
    Json(command): Json<UpdatePricingCommand>,
) -> Result<Json<GameSummary>, AppError> {
    let game = CatalogAdminHandler::new(pool)
        .update_pricing(game_id, command, &context)
        .await?;
    Ok(Json(game))
}

async fn delete_game(
    State(pool): State<PgPool>,
    Extension(context): Extension<OperationContext>,
    Path(game_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    CatalogAdminHandler::new(pool)
        .delete_game(game_id, &context)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
