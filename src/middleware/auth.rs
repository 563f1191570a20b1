//! Bearer token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the token from the `Authorization: Bearer <token>` header
//! 2. Verify its signature and expiry
//! 3. Check that it was issued to the role the router serves
//! 4. Reject tokens that were revoked by logout
//! 5. Inject authentication context into the request

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    auth::{self, Role},
    error::AppError,
    state::AppState,
};

/// Authentication context attached to authenticated requests.
///
/// Route handlers extract this with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the admin, customer or organisation row
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Guard for `/api/admin` routes.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, Role::Admin, request, next).await
}

/// Guard for `/api/customer` routes.
pub async fn require_customer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, Role::Customer, request, next).await
}

/// Guard for `/api/organisation` routes.
pub async fn require_organisation(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, Role::Organisation, request, next).await
}

async fn authenticate(
    state: &AppState,
    role: Role,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)?;

    let claims = auth::decode_token(token, &state.config.jwt_secret)?;
    if claims.role != role {
        tracing::debug!(expected = role.as_str(), got = claims.role.as_str(), "Token role mismatch");
        return Err(AppError::Unauthorized);
    }

    // Tokens handed to logout stay valid cryptographically until they expire
    let revoked: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM expired_tokens WHERE token = $1)")
            .bind(token)
            .fetch_one(&state.pool)
            .await?;
    if revoked {
        return Err(AppError::Unauthorized);
    }

    let auth_context = AuthContext {
        account_id: claims.sub,
        email: claims.email,
        role: claims.role,
    };
    request.extensions_mut().insert(auth_context);

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}
