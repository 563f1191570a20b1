//! Endpoints every role router mounts: auth check, logout and welcome text.

use axum::{Extension, Json, extract::State};
use chrono::DateTime;

use crate::{
    auth, db,
    error::AppError,
    middleware::auth::AuthContext,
    models::session::{LogoutRequest, MessageResponse, required},
    state::AppState,
};

/// `POST /auth` - the token is valid for this router's role.
///
/// The guard has already done the work; reaching the handler means yes.
pub async fn auth_check(Extension(caller): Extension<AuthContext>) -> Json<MessageResponse> {
    tracing::debug!(account_id = %caller.account_id, role = caller.role.as_str(), "Auth check");
    Json(MessageResponse::new("Authorized"))
}

/// `POST /logout` - revoke a token.
///
/// # Request Body
///
/// ```json
/// { "token": "eyJhbGciOi..." }
/// ```
///
/// # Response
///
/// - **200**: token revoked, or it already was
/// - **400**: no token in the body
/// - **401**: not a live token signed by this server
///
/// Revocations are kept until the token's own expiry; older ones are pruned
/// on every logout.
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let token = required(&request.token, "Token is required")?;
    let claims = auth::decode_token(token, &state.config.jwt_secret)?;
    let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AppError::Unauthorized)?;

    let pruned = db::prune_revoked_tokens(&state.pool).await?;
    if pruned > 0 {
        tracing::debug!(pruned, "Pruned expired revocations");
    }

    let revoked = sqlx::query(
        "INSERT INTO expired_tokens (token, expires_at) VALUES ($1, $2) ON CONFLICT (token) DO NOTHING",
    )
    .bind(token)
    .bind(expires_at)
    .execute(&state.pool)
    .await?
    .rows_affected();

    if revoked == 0 {
        return Ok(Json(MessageResponse::new("User already logged out")));
    }

    Ok(Json(MessageResponse::new("Logged out successfully")))
}

pub async fn root_welcome() -> &'static str {
    "Welcome to GreenGlide Backend"
}

pub async fn api_welcome() -> &'static str {
    "Welcome to GreenGlide API"
}

pub async fn admin_welcome() -> &'static str {
    "Welcome to GreenGlide Admin API"
}

pub async fn customer_welcome() -> &'static str {
    "Welcome to GreenGlide Customer API"
}

pub async fn organisation_welcome() -> &'static str {
    "Welcome to GreenGlide Organisation API"
}

/// Fallback for unmatched routes.
pub async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}
