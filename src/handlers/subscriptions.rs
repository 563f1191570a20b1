//! Organisation subscription HTTP handlers.
//!
//! - POST /purchase-package - Buy a package for a number of vehicles
//! - POST /renew-package - Renew an owned subscription
//! - GET /get-subscription-detail/{subscriptionId}
//! - GET /get-all-subscription-detail - Current subscriptions
//! - GET /get-subscription-history - All subscriptions

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::subscription::{
        CurrentSubscriptionsResponse, PurchasePackageRequest, PurchaseResponse,
        RenewPackageRequest, SubscriptionDetailResponse, SubscriptionHistoryResponse,
    },
    services::subscription_service::{self, Purchase},
    state::AppState,
};

/// Purchase a package.
///
/// # Request Body
///
/// ```json
/// {
///   "packageId": "550e8400-...",
///   "startDate": "2025-03-01T00:00:00Z",
///   "vehicleCount": 3,
///   "paymentFrom": "Wallet"
/// }
/// ```
///
/// # Response (201)
///
/// The created subscription plus `gatewayResponse`: the gateway's order
/// (with its payment session) for `PaymentGateway`, `{}` for `Wallet`.
///
/// # Errors
///
/// - **400**: missing field, vehicleCount < 1, unknown paymentFrom
/// - **402**: wallet balance below package amount × vehicleCount
/// - **404**: package not found
pub async fn purchase_package(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    Json(request): Json<PurchasePackageRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    let purchase = Purchase::try_from(request)?;
    let response = subscription_service::purchase(&state, caller.account_id, purchase).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Renew a subscription, starting where it ends.
pub async fn renew_package(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    Json(request): Json<RenewPackageRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), AppError> {
    let response = subscription_service::renew(&state, caller.account_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_subscription_detail(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
    Path(subscription_id): Path<Uuid>,
) -> Result<Json<SubscriptionDetailResponse>, AppError> {
    let subscription =
        subscription_service::find_subscription(&pool, caller.account_id, subscription_id).await?;
    Ok(Json(SubscriptionDetailResponse { subscription }))
}

pub async fn get_all_subscription_detail(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<CurrentSubscriptionsResponse>, AppError> {
    let current_subscriptions =
        subscription_service::current_subscriptions(&pool, caller.account_id).await?;
    Ok(Json(CurrentSubscriptionsResponse {
        current_subscriptions,
    }))
}

pub async fn get_subscription_history(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<SubscriptionHistoryResponse>, AppError> {
    let subscription_history =
        subscription_service::subscription_history(&pool, caller.account_id).await?;
    Ok(Json(SubscriptionHistoryResponse {
        subscription_history,
    }))
}
