//! Wallet service - balance movements for organisations.
//!
//! This service handles:
//! - Top-up orders (pending until the gateway confirms payment)
//! - Webhook confirmation of top-ups
//! - Wallet debits for subscriptions, inside the caller's transaction
//! - Balance and history reads
//!
//! # Atomicity Guarantees
//!
//! Every balance change happens in a PostgreSQL transaction together with
//! its wallet entry and transaction record. Debits lock the organisation row
//! first; confirmations flip `is_paid` with a conditional update, so the same
//! webhook delivered twice credits once.

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        organisation::Organisation,
        wallet::{TopUpResponse, TransactionRecord, WalletBalanceResponse, WalletEntry},
        webhook::WebhookOutcome,
    },
    services::payment_gateway::{self, CreateOrderRequest, CustomerDetails},
    state::AppState,
};

pub async fn find_organisation(pool: &DbPool, organisation_id: Uuid) -> Result<Organisation, AppError> {
    sqlx::query_as::<_, Organisation>("SELECT * FROM organisations WHERE id = $1")
        .bind(organisation_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Organisation not found"))
}

/// Customer block the gateway shows on its checkout page.
///
/// The customer id is the organisation id, which is how webhooks find
/// their way back to the account.
pub fn customer_details(org: &Organisation) -> CustomerDetails {
    CustomerDetails {
        customer_id: org.id.to_string(),
        customer_name: org.name.clone(),
        customer_phone: org.phone_no.clone(),
        customer_email: org.email.clone(),
    }
}

/// Start a wallet top-up.
///
/// # Process
///
/// 1. Validate the amount
/// 2. Create a gateway order for it
/// 3. Record a pending Credit entry carrying the order id
///
/// The balance does not move here; see [`confirm_top_up`].
///
/// # Errors
///
/// - `InvalidRequest`: amount is zero or negative
/// - `NotFound`: organisation doesn't exist
/// - `PaymentGateway`: order creation failed
pub async fn create_top_up(
    state: &AppState,
    organisation_id: Uuid,
    amount_paise: i64,
) -> Result<TopUpResponse, AppError> {
    if amount_paise <= 0 {
        return Err(AppError::invalid("Amount must be positive"));
    }

    let org = find_organisation(&state.pool, organisation_id).await?;

    let order_id = payment_gateway::generate_order_id();
    let order = state
        .gateway
        .create_order(CreateOrderRequest::inr(
            order_id,
            amount_paise,
            customer_details(&org),
        ))
        .await?;

    sqlx::query(
        r#"
        INSERT INTO wallet_entries (organisation_id, amount_paise, entry_type, order_id, is_paid)
        VALUES ($1, $2, 'Credit', $3, FALSE)
        "#,
    )
    .bind(org.id)
    .bind(amount_paise)
    .bind(&order.order_id)
    .execute(&state.pool)
    .await?;

    tracing::info!(organisation_id = %org.id, order_id = %order.order_id, amount_paise, "Wallet top-up order created");

    Ok(TopUpResponse {
        message: "Order created successfully".to_string(),
        order_id: order.order_id,
        gateway_response: order.raw,
    })
}

/// Apply a successful top-up payment.
///
/// # Process
///
/// 1. Mark the pending entry paid (only if still unpaid)
/// 2. Credit the balance and the lifetime total
/// 3. Record a Credit transaction paid through the gateway
/// 4. Commit
pub async fn confirm_top_up(
    pool: &DbPool,
    organisation_id: Uuid,
    order_id: &str,
) -> Result<WebhookOutcome, AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM organisations WHERE id = $1)")
        .bind(organisation_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Ok(WebhookOutcome::UnknownCustomer);
    }

    let mut tx = pool.begin().await?;

    let amount_paise: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE wallet_entries
        SET is_paid = TRUE
        WHERE order_id = $1
          AND organisation_id = $2
          AND entry_type = 'Credit'
          AND is_paid = FALSE
        RETURNING amount_paise
        "#,
    )
    .bind(order_id)
    .bind(organisation_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(amount_paise) = amount_paise else {
        tx.rollback().await?;
        let known: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM wallet_entries WHERE order_id = $1 AND organisation_id = $2)",
        )
        .bind(order_id)
        .bind(organisation_id)
        .fetch_one(pool)
        .await?;
        return Ok(if known {
            WebhookOutcome::AlreadyProcessed
        } else {
            WebhookOutcome::UnknownOrder
        });
    };

    sqlx::query(
        r#"
        UPDATE organisations
        SET wallet_balance_paise = wallet_balance_paise + $1,
            total_added_paise = total_added_paise + $1,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(amount_paise)
    .bind(organisation_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO transaction_records (organisation_id, amount_paise, transaction_type, credited_in, debited_from)
        VALUES ($1, $2, 'Credit', 'Wallet', 'PaymentGateway')
        "#,
    )
    .bind(organisation_id)
    .bind(amount_paise)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(%organisation_id, order_id, amount_paise, "Wallet credited");
    Ok(WebhookOutcome::Applied)
}

/// Debit the wallet inside the caller's transaction.
///
/// Locks the organisation row, so concurrent debits serialize and the
/// balance can never go negative. Nothing is written when the balance is short.
///
/// # Errors
///
/// - `NotFound`: organisation doesn't exist
/// - `InsufficientBalance`: balance is lower than `amount_paise`
pub async fn debit_wallet(
    tx: &mut Transaction<'_, Postgres>,
    organisation_id: Uuid,
    amount_paise: i64,
    order_id: &str,
) -> Result<(), AppError> {
    let balance_paise: i64 = sqlx::query_scalar(
        "SELECT wallet_balance_paise FROM organisations WHERE id = $1 FOR UPDATE",
    )
    .bind(organisation_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::not_found("Organisation not found"))?;

    if balance_paise < amount_paise {
        return Err(AppError::InsufficientBalance);
    }

    sqlx::query(
        r#"
        UPDATE organisations
        SET wallet_balance_paise = wallet_balance_paise - $1,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(amount_paise)
    .bind(organisation_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO wallet_entries (organisation_id, amount_paise, entry_type, order_id, is_paid)
        VALUES ($1, $2, 'Debit', $3, TRUE)
        "#,
    )
    .bind(organisation_id)
    .bind(amount_paise)
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO transaction_records (organisation_id, amount_paise, transaction_type, debited_from)
        VALUES ($1, $2, 'Debit', 'Wallet')
        "#,
    )
    .bind(organisation_id)
    .bind(amount_paise)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn balance(pool: &DbPool, organisation_id: Uuid) -> Result<WalletBalanceResponse, AppError> {
    let org = find_organisation(pool, organisation_id).await?;
    Ok(WalletBalanceResponse {
        wallet_balance_paise: org.wallet_balance_paise,
        total_added_paise: org.total_added_paise,
    })
}

/// Wallet entries, newest first.
pub async fn wallet_history(pool: &DbPool, organisation_id: Uuid) -> Result<Vec<WalletEntry>, AppError> {
    find_organisation(pool, organisation_id).await?;
    let entries = sqlx::query_as::<_, WalletEntry>(
        "SELECT * FROM wallet_entries WHERE organisation_id = $1 ORDER BY transaction_date DESC",
    )
    .bind(organisation_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// Transaction records, newest first.
pub async fn transaction_history(
    pool: &DbPool,
    organisation_id: Uuid,
) -> Result<Vec<TransactionRecord>, AppError> {
    find_organisation(pool, organisation_id).await?;
    let records = sqlx::query_as::<_, TransactionRecord>(
        "SELECT * FROM transaction_records WHERE organisation_id = $1 ORDER BY transaction_date DESC",
    )
    .bind(organisation_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}
