//! Organisation wallet HTTP handlers.

use axum::{Extension, Json, extract::State};

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::wallet::{
        AddWalletBalanceRequest, TopUpResponse, TransactionHistoryResponse,
        WalletBalanceResponse, WalletHistoryResponse,
    },
    services::wallet_service,
    state::AppState,
};

/// Start a wallet top-up.
///
/// # Request Body
///
/// ```json
/// { "amountPaise": 50000 }
/// ```
///
/// # Response (200)
///
/// The gateway order to pay. The balance changes only after the
/// `wallet-topup` webhook reports the payment as successful.
pub async fn add_wallet_balance(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    Json(request): Json<AddWalletBalanceRequest>,
) -> Result<Json<TopUpResponse>, AppError> {
    let amount_paise = request
        .amount_paise
        .ok_or_else(|| AppError::invalid("amountPaise is required"))?;

    let response = wallet_service::create_top_up(&state, caller.account_id, amount_paise).await?;
    Ok(Json(response))
}

pub async fn get_wallet_balance(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<WalletBalanceResponse>, AppError> {
    Ok(Json(wallet_service::balance(&pool, caller.account_id).await?))
}

pub async fn get_wallet_history(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<WalletHistoryResponse>, AppError> {
    let wallet_history = wallet_service::wallet_history(&pool, caller.account_id).await?;
    Ok(Json(WalletHistoryResponse {
        message: "Wallet history fetched successfully".to_string(),
        wallet_history,
    }))
}

pub async fn get_transaction_history(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<TransactionHistoryResponse>, AppError> {
    let transaction_history = wallet_service::transaction_history(&pool, caller.account_id).await?;
    Ok(Json(TransactionHistoryResponse {
        message: "Transaction history fetched successfully".to_string(),
        transaction_history,
    }))
}
