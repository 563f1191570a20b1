//! Inbound payment gateway webhooks.
//!
//! - POST /webhook/package-purchase
//! - POST /webhook/renew-package
//! - POST /webhook/wallet-topup
//!
//! The body is taken raw so the signature can be checked over the exact
//! bytes the gateway sent. Anything past signature and payload validation
//! is acknowledged with 200, including unknown orders, so the gateway does
//! not keep retrying deliveries that can never apply.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        session::MessageResponse,
        webhook::{GatewayWebhook, WebhookOutcome},
    },
    services::{subscription_service, wallet_service},
    state::AppState,
};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

#[derive(Debug, Clone, Copy)]
enum WebhookKind {
    PackagePurchase,
    PackageRenewal,
    WalletTopUp,
}

impl WebhookKind {
    fn as_str(&self) -> &'static str {
        match self {
            WebhookKind::PackagePurchase => "package-purchase",
            WebhookKind::PackageRenewal => "renew-package",
            WebhookKind::WalletTopUp => "wallet-topup",
        }
    }
}

pub async fn package_purchase(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    handle(&state, WebhookKind::PackagePurchase, &headers, &body).await
}

pub async fn renew_package(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    handle(&state, WebhookKind::PackageRenewal, &headers, &body).await
}

pub async fn wallet_topup(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    handle(&state, WebhookKind::WalletTopUp, &headers, &body).await
}

async fn handle(
    state: &AppState,
    kind: WebhookKind,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<MessageResponse>, AppError> {
    if state.config.cashfree_verify_webhooks {
        verify(state, headers, body)?;
    }

    let webhook = GatewayWebhook::parse(body)?;
    let order_id = webhook.order_id();

    let outcome = if !webhook.is_success() {
        WebhookOutcome::Ignored
    } else {
        match Uuid::parse_str(webhook.customer_id()) {
            Err(_) => WebhookOutcome::UnknownCustomer,
            Ok(organisation_id) => match kind {
                WebhookKind::PackagePurchase | WebhookKind::PackageRenewal => {
                    subscription_service::confirm_payment(&state.pool, organisation_id, order_id)
                        .await?
                }
                WebhookKind::WalletTopUp => {
                    wallet_service::confirm_top_up(&state.pool, organisation_id, order_id).await?
                }
            },
        }
    };

    match outcome {
        WebhookOutcome::Applied => {
            tracing::info!(webhook = kind.as_str(), order_id, "Webhook applied")
        }
        other => tracing::warn!(
            webhook = kind.as_str(),
            order_id,
            customer_id = webhook.customer_id(),
            outcome = ?other,
            "Webhook acknowledged without changes"
        ),
    }

    Ok(Json(MessageResponse::new(outcome.message())))
}

fn verify(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let signature = header_value(headers, SIGNATURE_HEADER)?;
    let timestamp = header_value(headers, TIMESTAMP_HEADER)?;

    if !state
        .gateway
        .verify_webhook_signature(timestamp, body, signature)
    {
        tracing::warn!("Webhook signature mismatch");
        return Err(AppError::InvalidSignature);
    }

    Ok(())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)
}
