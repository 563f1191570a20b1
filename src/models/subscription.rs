//! Organisation subscription models.
//!
//! A subscription is one paid period of a package for a number of vehicles.
//! Renewals create a new subscription that starts where the previous one ends.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Where the money for a subscription comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentSource {
    Wallet,
    PaymentGateway,
}

impl PaymentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentSource::Wallet => "Wallet",
            PaymentSource::PaymentGateway => "PaymentGateway",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "Wallet" => Ok(PaymentSource::Wallet),
            "PaymentGateway" => Ok(PaymentSource::PaymentGateway),
            _ => Err(AppError::invalid(
                "Invalid paymentFrom method. Must be 'Wallet' or 'PaymentGateway'",
            )),
        }
    }
}

/// Subscription record from `organisation_subscriptions`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub organisation_id: Uuid,
    pub package_id: Uuid,
    pub subscription_starts_on: DateTime<Utc>,
    /// Unit price per vehicle
    pub amount_paise: i64,
    pub vehicle_count: i32,
    pub total_paise: i64,
    pub days_count: i32,
    pub payment_from: String,
    pub order_id: String,
    pub active: bool,
    pub is_paid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Start of the subscription that renews `previous`.
pub fn renewal_start(previous_start: DateTime<Utc>, days_count: i32) -> Result<DateTime<Utc>, AppError> {
    previous_start
        .checked_add_signed(Duration::days(days_count as i64))
        .ok_or_else(|| AppError::invalid("Renewal date is out of range"))
}

/// Price for `vehicle_count` vehicles, rejecting overflow.
pub fn total_cost(unit_paise: i64, vehicle_count: i32) -> Result<i64, AppError> {
    unit_paise
        .checked_mul(vehicle_count as i64)
        .ok_or_else(|| AppError::invalid("Order total is too large"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePackageRequest {
    pub package_id: Option<Uuid>,
    pub start_date: Option<DateTime<Utc>>,
    pub vehicle_count: Option<i32>,
    pub payment_from: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewPackageRequest {
    pub subscription_id: Option<Uuid>,
    pub payment_from: Option<String>,
}

/// Response for purchase and renewal.
///
/// `gateway_response` is the gateway's order object for gateway payments and
/// an empty object for wallet payments.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub message: String,
    pub subscription: Subscription,
    pub gateway_response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetailResponse {
    pub subscription: Subscription,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSubscriptionsResponse {
    pub current_subscriptions: Vec<Subscription>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionHistoryResponse {
    pub subscription_history: Vec<Subscription>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn payment_source_parses_only_known_values() {
        assert_eq!(PaymentSource::parse("Wallet").unwrap(), PaymentSource::Wallet);
        assert_eq!(
            PaymentSource::parse("PaymentGateway").unwrap(),
            PaymentSource::PaymentGateway
        );
        assert!(PaymentSource::parse("wallet").is_err());
        assert!(PaymentSource::parse("Cash").is_err());
    }

    #[test]
    fn renewal_starts_after_previous_period() {
        let start = Utc.with_ymd_and_hms(2025, 1, 28, 0, 0, 0).unwrap();
        let renewed = renewal_start(start, 30).unwrap();
        assert_eq!(renewed, Utc.with_ymd_and_hms(2025, 2, 27, 0, 0, 0).unwrap());
    }

    #[test]
    fn renewal_past_calendar_range_is_an_error() {
        assert!(matches!(
            renewal_start(Utc::now(), 2_000_000_000),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn total_cost_multiplies_by_vehicles() {
        assert_eq!(total_cost(49_900, 3).unwrap(), 149_700);
        assert!(total_cost(i64::MAX, 2).is_err());
    }
}
