//! Payment gateway webhook payload.
//!
//! Only the fields the service acts on are modelled; everything else in the
//! gateway's payload is ignored.
//!
//! # Example
//!
//! ```json
//! {
//!   "data": {
//!     "order": { "order_id": "3f9a1c0b7e2d", "order_amount": 499.0 },
//!     "payment": { "payment_status": "SUCCESS" },
//!     "customer_details": { "customer_id": "550e8400-e29b-41d4-a716-446655440000" }
//!   },
//!   "type": "PAYMENT_SUCCESS_WEBHOOK"
//! }
//! ```

use serde::Deserialize;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct GatewayWebhook {
    pub data: GatewayWebhookData,
}

#[derive(Debug, Deserialize)]
pub struct GatewayWebhookData {
    pub order: WebhookOrder,
    pub payment: WebhookPayment,
    pub customer_details: WebhookCustomer,
}

#[derive(Debug, Deserialize)]
pub struct WebhookOrder {
    pub order_id: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayment {
    pub payment_status: String,
}

#[derive(Debug, Deserialize)]
pub struct WebhookCustomer {
    pub customer_id: String,
}

impl GatewayWebhook {
    pub fn parse(raw_body: &[u8]) -> Result<Self, AppError> {
        serde_json::from_slice(raw_body)
            .map_err(|e| AppError::invalid(format!("Malformed webhook payload: {}", e)))
    }

    pub fn order_id(&self) -> &str {
        &self.data.order.order_id
    }

    pub fn customer_id(&self) -> &str {
        &self.data.customer_details.customer_id
    }

    pub fn is_success(&self) -> bool {
        self.data.payment.payment_status == "SUCCESS"
    }
}

/// What a webhook delivery did.
///
/// Every outcome is acknowledged with 200 so the gateway stops retrying;
/// only `Applied` changed anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied,
    UnknownCustomer,
    UnknownOrder,
    AlreadyProcessed,
    /// Payment status other than SUCCESS
    Ignored,
}

impl WebhookOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            WebhookOutcome::Applied => "Payment recorded",
            WebhookOutcome::UnknownCustomer => "Customer not found",
            WebhookOutcome::UnknownOrder => "Order not found",
            WebhookOutcome::AlreadyProcessed => "Order already processed",
            WebhookOutcome::Ignored => "Payment not successful",
        }
    }
}
