//! Wallet ledger and transaction history models.
//!
//! Two histories are kept per organisation:
//! - `WalletEntry`: movements of the wallet balance itself (top-ups, debits).
//!   A top-up starts unpaid and is marked paid by the gateway webhook.
//! - `TransactionRecord`: every money movement the organisation made,
//!   including gateway payments that never touched the wallet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wallet entry from `wallet_entries`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletEntry {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub amount_paise: i64,
    /// "Credit" or "Debit"
    pub entry_type: String,
    pub order_id: Option<String>,
    pub is_paid: bool,
    pub transaction_date: DateTime<Utc>,
}

/// Transaction record from `transaction_records`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub amount_paise: i64,
    /// "Credit", "Debit" or "Refund"
    pub transaction_type: String,
    /// "Wallet" or "Original Payment Method"
    pub credited_in: Option<String>,
    /// "Wallet" or "PaymentGateway"
    pub debited_from: Option<String>,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWalletBalanceRequest {
    pub amount_paise: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceResponse {
    pub wallet_balance_paise: i64,
    pub total_added_paise: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpResponse {
    pub message: String,
    pub order_id: String,
    pub gateway_response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletHistoryResponse {
    pub message: String,
    pub wallet_history: Vec<WalletEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistoryResponse {
    pub message: String,
    pub transaction_history: Vec<TransactionRecord>,
}
