//! Payment gateway integration (Cashfree PG).
//!
//! This module handles order creation against the gateway's REST API,
//! order id generation and HMAC verification of inbound webhooks.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Customer block sent with every order.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
}

/// Order creation request.
///
/// `order_amount` is in rupees because that is what the gateway expects;
/// everything inside this service is kept in paise.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub order_amount: f64,
    pub order_currency: String,
    pub customer_details: CustomerDetails,
}

impl CreateOrderRequest {
    pub fn inr(order_id: String, amount_paise: i64, customer_details: CustomerDetails) -> Self {
        Self {
            order_id,
            order_amount: paise_to_rupees(amount_paise),
            order_currency: "INR".to_string(),
            customer_details,
        }
    }
}

/// Gateway order as returned to API clients.
///
/// The raw gateway response is passed through so the frontend can open the
/// checkout with the payment session it contains.
#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_id: String,
    pub raw: serde_json::Value,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment order with the gateway.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, AppError>;

    /// Check the signature of a webhook delivery.
    fn verify_webhook_signature(&self, timestamp: &str, raw_body: &[u8], signature: &str) -> bool;
}

/// Credentials and endpoint for the Cashfree PG API.
#[derive(Debug, Clone)]
pub struct CashfreeConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    pub api_version: String,
}

pub struct CashfreeGateway {
    config: CashfreeConfig,
    client: reqwest::Client,
}

impl CashfreeGateway {
    pub fn new(config: CashfreeConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AppError::PaymentGateway(format!("HTTP client error: {}", e)))?;

        Ok(Self { config, client })
    }

    fn orders_url(&self) -> String {
        format!("{}/orders", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for CashfreeGateway {
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, AppError> {
        let response = self
            .client
            .post(self.orders_url())
            .header("x-client-id", &self.config.client_id)
            .header("x-client-secret", &self.config.client_secret)
            .header("x-api-version", &self.config.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Request failed: {}", e)))?;

        let status = response.status();
        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("Invalid response body: {}", e)))?;

        if !status.is_success() {
            return Err(AppError::PaymentGateway(format!(
                "HTTP {} creating order {}: {}",
                status, request.order_id, raw
            )));
        }

        tracing::info!(order_id = %request.order_id, amount = request.order_amount, "Gateway order created");

        Ok(GatewayOrder {
            order_id: request.order_id,
            raw,
        })
    }

    fn verify_webhook_signature(&self, timestamp: &str, raw_body: &[u8], signature: &str) -> bool {
        verify_signature(&self.config.client_secret, timestamp, raw_body, signature)
    }
}

/// Compute the webhook signature: base64(HMAC-SHA256(secret, timestamp + body)).
pub fn compute_signature(secret: &str, timestamp: &str, raw_body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.as_bytes());
    mac.update(raw_body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Constant-time check of a webhook signature.
pub fn verify_signature(secret: &str, timestamp: &str, raw_body: &[u8], signature: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(timestamp.as_bytes());
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}

/// Twelve hex characters derived from 16 random bytes.
pub fn generate_order_id() -> String {
    let bytes: [u8; 16] = rand::random();
    let digest = Sha256::digest(hex::encode(bytes).as_bytes());
    hex::encode(digest)[..12].to_string()
}

pub fn paise_to_rupees(paise: i64) -> f64 {
    paise as f64 / 100.0
}
