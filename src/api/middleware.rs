//! API Middleware
//!
//! API key authentication, identity resolution and request logging.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Identity, OperationContext, Role};
use crate::error::{AppError, AppResult};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const USER_ID_HEADER: &str = "x-request-user-id";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// API Key authentication result
#[derive(Debug, Clone)]
pub struct AuthenticatedApiKey {
    pub id: Uuid,
    pub name: String,
}

/// Hex-encoded sha256 of a plaintext API key, as stored in `api_keys.key_hash`
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

// =========================================================================
// API Key Authentication Middleware
// =========================================================================

/// Validate X-API-Key and resolve X-Request-User-Id into an `Identity`.
///
/// Requests without a user header proceed anonymously; handlers that need a
/// user reject them.
pub async fn auth_middleware(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let api_key = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::MissingApiKey)?;

    let api_key_record: Option<(Uuid, String, bool)> = sqlx::query_as(
        r#"
        SELECT id, name, is_active
        FROM api_keys
        WHERE key_hash = $1
        "#,
    )
    .bind(hash_api_key(api_key))
    .fetch_optional(&pool)
    .await?;

    let (api_key_id, name, is_active) = api_key_record.ok_or(AppError::InvalidApiKey)?;

    if !is_active {
        return Err(AppError::ApiKeyDisabled);
    }

    request
        .extensions_mut()
        .insert(AuthenticatedApiKey { id: api_key_id, name });

    let correlation_id = headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let mut context = OperationContext::new()
        .with_api_key(api_key_id)
        .with_correlation_id(correlation_id);

    if let Some(raw) = headers.get(USER_ID_HEADER) {
        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or(AppError::InvalidUserHeader)?;

        let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&pool)
            .await?;

        let role = role.ok_or(AppError::UnknownUser(user_id))?;

        context = context.with_identity(Identity::new(user_id, Role::from(role)));
    }

    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let masked_value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
///
/// Runs inside the request-id layer, so the correlation header is always set.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let headers = mask_headers_for_logging(request.headers());
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        correlation_id = %correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = %start.elapsed().as_millis(),
        correlation_id = %correlation_id,
        "Request completed"
    );

    response
}
