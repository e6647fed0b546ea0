//! API Integration Tests
//!
//! Drives the full router, middleware included, against Postgres.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use game_store::api::{self, routes::AddToCartRequest};

mod common;
use common::{GameSeed, TEST_API_KEY};

fn request(method: &str, uri: &str, user_id: Option<i64>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", TEST_API_KEY);
    if let Some(user_id) = user_id {
        builder = builder.header("X-Request-User-Id", user_id.to_string());
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let pool = common::setup_test_db().await;
    let app = api::build_router(pool);

    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-correlation-id"));
}

#[tokio::test]
async fn test_api_key_is_required() {
    let pool = common::setup_test_db().await;
    let app = api::build_router(pool);

    let req = Request::builder()
        .uri("/api/v1/games")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error_code"], "missing_api_key");

    let req = Request::builder()
        .uri("/api/v1/games")
        .header("X-API-Key", "not-a-key")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error_code"], "invalid_api_key");
}

#[tokio::test]
async fn test_acting_user_is_validated() {
    let pool = common::setup_test_db().await;
    let app = api::build_router(pool);

    let mut req = request("GET", "/api/v1/cart", None, None);
    req.headers_mut()
        .insert("x-request-user-id", "abc".parse().unwrap());
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "invalid_user_id");

    let (status, json) = send(&app, request("GET", "/api/v1/cart", Some(i64::MAX), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error_code"], "unknown_user");

    // Anonymous callers can browse but not shop
    let (status, _) = send(&app, request("GET", "/api/v1/categories", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, json) = send(&app, request("GET", "/api/v1/cart", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error_code"], "unauthorized");
}

#[tokio::test]
async fn test_cart_and_checkout_flow() {
    let pool = common::setup_test_db().await;
    let user_id = common::create_user(&pool, game_store::domain::Role::User).await;
    let a = common::create_game(
        &pool,
        GameSeed::new("Api A", dec!(20.00)).discounted(dec!(15.00)),
    )
    .await;
    let b = common::create_game(&pool, GameSeed::new("Api B", dec!(30.00))).await;
    let app = api::build_router(pool.clone());

    // 1. Add both games
    for game_id in [a, b] {
        let body = serde_json::to_value(AddToCartRequest { game_id }).unwrap();
        let req = request("POST", "/api/v1/cart/items", Some(user_id), Some(body));
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // 2. Adding again conflicts
    let (status, json) = send(
        &app,
        request("POST", "/api/v1/cart/items", Some(user_id), Some(json!({ "game_id": a }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error_code"], "already_in_cart");

    // 3. Cart totals
    let (status, json) = send(&app, request("GET", "/api/v1/cart", Some(user_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["total"], "45.00");
    assert_eq!(json["savings"], "5.00");

    // 4. Checkout
    let checkout = || request("POST", "/api/v1/cart/checkout", Some(user_id), None);
    let (status, json) = send(&app, checkout()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["games_count"], 2);
    assert_eq!(json["total_charged"], "45.00");

    // 5. Cart is empty, a second checkout is refused
    let (status, json) = send(&app, checkout()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "empty_cart");

    // 6. Library holds both games
    let (status, json) = send(&app, request("GET", "/api/v1/library", Some(user_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);

    let (status, json) = send(&app, request("GET", "/api/v1/me/stats", Some(user_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["games_owned"], 2);
    assert_eq!(json["cart_count"], 0);
}

#[tokio::test]
async fn test_review_flow() {
    let pool = common::setup_test_db().await;
    let user_id = common::create_user(&pool, game_store::domain::Role::User).await;
    let game_id = common::create_game(&pool, GameSeed::new("Api Reviewed", dec!(10.00))).await;
    let app = api::build_router(pool.clone());
    let uri = format!("/api/v1/games/{}/reviews", game_id);
    let review = |body: Value| request("POST", &uri, Some(user_id), Some(body));

    let (status, json) = send(&app, review(json!({ "rating": 5 }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error_code"], "not_owned");

    common::insert_purchase(&pool, user_id, game_id, dec!(10.00)).await;

    let (status, json) = send(&app, review(json!({ "rating": 6 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "invalid_input");

    let body = json!({ "rating": 4, "comment": "Tight controls" });
    let (status, json) = send(&app, review(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["created"], true);

    let (status, json) = send(&app, review(json!({ "rating": "2" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["created"], false);

    let detail_uri = format!("/api/v1/games/{}", game_id);
    let (status, json) = send(&app, request("GET", &detail_uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["rating"], "2.00");
    assert_eq!(json["reviews"].as_array().unwrap().len(), 1);
    assert_eq!(json["review_count"], 1);
    assert_eq!(json["viewer"]["owned"], false);

    let (_, json) = send(&app, request("GET", &detail_uri, Some(user_id), None)).await;
    assert_eq!(json["viewer"]["owned"], true);
    assert_eq!(json["viewer"]["in_cart"], false);
    assert_eq!(json["viewer"]["in_wishlist"], false);
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let pool = common::setup_test_db().await;
    let token = common::unique_token();
    for i in 0..3 {
        let seed = GameSeed::new(format!("Listing {} {}", token, i), dec!(12.00));
        common::create_game(&pool, seed).await;
    }
    let app = api::build_router(pool);

    let uri = format!("/api/v1/games?search={}&limit=2&page=2&sort=bogus", token);
    let (status, json) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pagination"]["total"], 3);
    assert_eq!(json["pagination"]["pages"], 2);
    assert_eq!(json["games"].as_array().unwrap().len(), 1);

    let uri = format!("/api/v1/games/search?q={}", token);
    let (status, json) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["games"].as_array().unwrap().len(), 3);

    let (status, json) = send(&app, request("GET", "/api/v1/games/0", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "invalid_input");
}

#[tokio::test]
async fn test_catalog_tolerates_odd_query_strings() {
    let pool = common::setup_test_db().await;
    let token = common::unique_token();
    let seed = GameSeed::new(format!("Odd {}", token), dec!(3.00));
    let game_id = common::create_game(&pool, seed).await;
    let app = api::build_router(pool);

    // NUL bytes are dropped before the term reaches the database
    let (head, tail) = token.split_at(6);
    for uri in [
        format!("/api/v1/games?search={}%00{}", head, tail),
        format!("/api/v1/games/search?q={}%00{}", head, tail),
    ] {
        let (status, json) = send(&app, request("GET", &uri, None, None)).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(json["games"][0]["id"], game_id, "{}", uri);
    }

    let (status, json) = send(&app, request("GET", "/api/v1/games?search=%00", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["pagination"]["total"].as_i64().unwrap() >= 1);

    // Repeated keys keep their first value
    let uri = format!("/api/v1/games?search={}&sort=price&sort=title&search=zzz", token);
    let (status, json) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["games"][0]["id"], game_id);

    let uri = format!("/api/v1/games/search?q={}&q=zzz", token);
    let (status, json) = send(&app, request("GET", &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["games"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_wishlist_toggle_endpoint() {
    let pool = common::setup_test_db().await;
    let user_id = common::create_user(&pool, game_store::domain::Role::User).await;
    let game_id = common::create_game(&pool, GameSeed::new("Api Wish", dec!(8.00))).await;
    let app = api::build_router(pool);
    let uri = format!("/api/v1/wishlist/{}/toggle", game_id);

    let (status, json) = send(&app, request("POST", &uri, Some(user_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["added"], true);
    assert_eq!(json["wishlist_count"], 1);

    let (_, json) = send(&app, request("GET", "/api/v1/wishlist", Some(user_id), None)).await;
    assert_eq!(json["count"], 1);

    let (status, json) = send(&app, request("POST", &uri, Some(user_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["added"], false);
    assert_eq!(json["wishlist_count"], 0);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let pool = common::setup_test_db().await;
    let user_id = common::create_user(&pool, game_store::domain::Role::User).await;
    let admin_id = common::create_user(&pool, game_store::domain::Role::Admin).await;
    let app = api::build_router(pool);
    let body = json!({ "title": "Admin Made", "price": "19.99", "discount_price": "9.99" });

    let create = |user_id: i64| {
        request("POST", "/api/v1/admin/games", Some(user_id), Some(body.clone()))
    };

    let (status, _) = send(&app, create(user_id)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(&app, create(admin_id)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["effective_price"], "9.99");

    let game_uri = format!("/api/v1/admin/games/{}", json["id"].as_i64().unwrap());
    let edit = json!({ "publisher": "Admin Press", "is_featured": true });
    let patch = |user_id: i64, body: Value| request("PATCH", &game_uri, Some(user_id), Some(body));

    let (status, _) = send(&app, patch(user_id, edit.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = send(&app, patch(admin_id, edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["publisher"], "Admin Press");
    assert_eq!(json["is_featured"], true);
    assert_eq!(json["title"], "Admin Made");

    let (status, json) = send(&app, patch(admin_id, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_code"], "invalid_input");

    let (status, _) = send(&app, request("DELETE", &game_uri, Some(admin_id), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
