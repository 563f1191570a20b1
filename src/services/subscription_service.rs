//! Subscription purchase, renewal and payment confirmation.
//!
//! Both purchase and renewal end in [`settle`]: a wallet payment debits the
//! wallet and creates a paid, active subscription in one transaction; a
//! gateway payment creates an order and an unpaid subscription that the
//! webhook later confirms.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        organisation::Organisation,
        package::Package,
        subscription::{
            self, PaymentSource, PurchasePackageRequest, PurchaseResponse, RenewPackageRequest,
            Subscription,
        },
        webhook::WebhookOutcome,
    },
    services::{
        payment_gateway::{self, CreateOrderRequest},
        wallet_service,
    },
    state::AppState,
};

/// Terms of a subscription about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionTerms {
    pub package_id: Uuid,
    pub starts_on: DateTime<Utc>,
    pub unit_paise: i64,
    pub vehicle_count: i32,
    pub days_count: i32,
}

impl SubscriptionTerms {
    pub fn total_paise(&self) -> Result<i64, AppError> {
        subscription::total_cost(self.unit_paise, self.vehicle_count)
    }
}

/// Validated purchase request.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub package_id: Uuid,
    pub starts_on: DateTime<Utc>,
    pub vehicle_count: i32,
    pub source: PaymentSource,
}

impl TryFrom<PurchasePackageRequest> for Purchase {
    type Error = AppError;

    fn try_from(request: PurchasePackageRequest) -> Result<Self, Self::Error> {
        let (Some(package_id), Some(starts_on), Some(vehicle_count), Some(payment_from)) = (
            request.package_id,
            request.start_date,
            request.vehicle_count,
            request.payment_from,
        ) else {
            return Err(AppError::invalid(
                "packageId, startDate, vehicleCount and paymentFrom are required",
            ));
        };

        if vehicle_count < 1 {
            return Err(AppError::invalid("vehicleCount must be at least 1"));
        }

        Ok(Purchase {
            package_id,
            starts_on,
            vehicle_count,
            source: PaymentSource::parse(&payment_from)?,
        })
    }
}

pub async fn find_package(pool: &DbPool, package_id: Uuid) -> Result<Package, AppError> {
    sqlx::query_as::<_, Package>("SELECT * FROM organisation_packages WHERE id = $1")
        .bind(package_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Package not found"))
}

/// Buy a package for a number of vehicles.
///
/// # Errors
///
/// - `NotFound`: organisation or package doesn't exist
/// - `InsufficientBalance`: wallet payment and balance below the total
/// - `PaymentGateway`: gateway payment and order creation failed
pub async fn purchase(
    state: &AppState,
    organisation_id: Uuid,
    purchase: Purchase,
) -> Result<PurchaseResponse, AppError> {
    let org = wallet_service::find_organisation(&state.pool, organisation_id).await?;
    let package = find_package(&state.pool, purchase.package_id).await?;
    let days_count = package
        .coverage_days()
        .ok_or_else(|| AppError::invalid("Package has no coverage period"))?;

    let terms = SubscriptionTerms {
        package_id: package.id,
        starts_on: purchase.starts_on,
        unit_paise: package.amount_paise,
        vehicle_count: purchase.vehicle_count,
        days_count,
    };

    settle(state, &org, terms, purchase.source, "Package purchased successfully").await
}

/// Renew one of the caller's subscriptions.
///
/// The new subscription keeps the package, price, vehicles and period of
/// the previous one and starts the day it ends.
pub async fn renew(
    state: &AppState,
    organisation_id: Uuid,
    request: RenewPackageRequest,
) -> Result<PurchaseResponse, AppError> {
    let (Some(subscription_id), Some(payment_from)) = (request.subscription_id, request.payment_from)
    else {
        return Err(AppError::invalid("subscriptionId and paymentFrom are required"));
    };
    let source = PaymentSource::parse(&payment_from)?;

    let previous = find_subscription(&state.pool, organisation_id, subscription_id).await?;
    let org = wallet_service::find_organisation(&state.pool, organisation_id).await?;

    let terms = SubscriptionTerms {
        package_id: previous.package_id,
        starts_on: subscription::renewal_start(previous.subscription_starts_on, previous.days_count)?,
        unit_paise: previous.amount_paise,
        vehicle_count: previous.vehicle_count,
        days_count: previous.days_count,
    };

    settle(state, &org, terms, source, "Package renewed successfully").await
}

async fn settle(
    state: &AppState,
    org: &Organisation,
    terms: SubscriptionTerms,
    source: PaymentSource,
    message: &str,
) -> Result<PurchaseResponse, AppError> {
    let total_paise = terms.total_paise()?;
    let order_id = payment_gateway::generate_order_id();

    let (subscription, gateway_response) = match source {
        PaymentSource::Wallet => {
            let mut tx = state.pool.begin().await?;
            wallet_service::debit_wallet(&mut tx, org.id, total_paise, &order_id).await?;
            let subscription =
                insert_subscription(&mut *tx, org.id, &terms, total_paise, source, &order_id, true)
                    .await?;
            tx.commit().await?;
            (subscription, serde_json::json!({}))
        }
        PaymentSource::PaymentGateway => {
            let order = state
                .gateway
                .create_order(CreateOrderRequest::inr(
                    order_id,
                    total_paise,
                    wallet_service::customer_details(org),
                ))
                .await?;
            let subscription = insert_subscription(
                &state.pool,
                org.id,
                &terms,
                total_paise,
                source,
                &order.order_id,
                false,
            )
            .await?;
            (subscription, order.raw)
        }
    };

    tracing::info!(
        organisation_id = %org.id,
        subscription_id = %subscription.id,
        order_id = %subscription.order_id,
        payment_from = source.as_str(),
        total_paise,
        "Subscription created"
    );

    Ok(PurchaseResponse {
        message: message.to_string(),
        subscription,
        gateway_response,
    })
}

async fn insert_subscription<'e, E>(
    executor: E,
    organisation_id: Uuid,
    terms: &SubscriptionTerms,
    total_paise: i64,
    source: PaymentSource,
    order_id: &str,
    paid: bool,
) -> Result<Subscription, AppError>
where
    E: sqlx::PgExecutor<'e>,
{
    let subscription = sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO organisation_subscriptions (
            organisation_id,
            package_id,
            subscription_starts_on,
            amount_paise,
            vehicle_count,
            total_paise,
            days_count,
            payment_from,
            order_id,
            active,
            is_paid
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING *
        "#,
    )
    .bind(organisation_id)
    .bind(terms.package_id)
    .bind(terms.starts_on)
    .bind(terms.unit_paise)
    .bind(terms.vehicle_count)
    .bind(total_paise)
    .bind(terms.days_count)
    .bind(source.as_str())
    .bind(order_id)
    .bind(paid)
    .fetch_one(executor)
    .await?;

    Ok(subscription)
}

/// Mark a gateway-paid subscription paid and active.
///
/// Used by both the purchase and the renewal webhook.
pub async fn confirm_payment(
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

    let total_paise: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE organisation_subscriptions
        SET is_paid = TRUE,
            active = TRUE,
            updated_at = NOW()
        WHERE order_id = $1
          AND organisation_id = $2
          AND is_paid = FALSE
        RETURNING total_paise
        "#,
    )
    .bind(order_id)
    .bind(organisation_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(total_paise) = total_paise else {
        tx.rollback().await?;
        let known: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM organisation_subscriptions WHERE order_id = $1 AND organisation_id = $2)",
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
        INSERT INTO transaction_records (organisation_id, amount_paise, transaction_type, debited_from)
        VALUES ($1, $2, 'Debit', 'PaymentGateway')
        "#,
    )
    .bind(organisation_id)
    .bind(total_paise)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(%organisation_id, order_id, total_paise, "Subscription payment confirmed");
    Ok(WebhookOutcome::Applied)
}

pub async fn find_subscription(
    pool: &DbPool,
    organisation_id: Uuid,
    subscription_id: Uuid,
) -> Result<Subscription, AppError> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM organisation_subscriptions WHERE id = $1 AND organisation_id = $2",
    )
    .bind(subscription_id)
    .bind(organisation_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Subscription not found"))
}

/// Subscriptions whose coverage window has not ended yet.
pub async fn current_subscriptions(
    pool: &DbPool,
    organisation_id: Uuid,
) -> Result<Vec<Subscription>, AppError> {
    let subscriptions = sqlx::query_as::<_, Subscription>(
        r#"
        SELECT * FROM organisation_subscriptions
        WHERE organisation_id = $1
          AND subscription_starts_on + make_interval(days => days_count) > NOW()
        ORDER BY subscription_starts_on
        "#,
    )
    .bind(organisation_id)
    .fetch_all(pool)
    .await?;

    Ok(subscriptions)
}

/// Every subscription of the organisation, newest first.
pub async fn subscription_history(
    pool: &DbPool,
    organisation_id: Uuid,
) -> Result<Vec<Subscription>, AppError> {
    let subscriptions = sqlx::query_as::<_, Subscription>(
        "SELECT * FROM organisation_subscriptions WHERE organisation_id = $1 ORDER BY created_at DESC",
    )
    .bind(organisation_id)
    .fetch_all(pool)
    .await?;

    Ok(subscriptions)
}

/// Subscription histories for a page of organisations in one query.
pub async fn histories_for(
    pool: &DbPool,
    organisation_ids: &[Uuid],
) -> Result<Vec<Subscription>, AppError> {
    let subscriptions = sqlx::query_as::<_, Subscription>(
        "SELECT * FROM organisation_subscriptions WHERE organisation_id = ANY($1) ORDER BY created_at DESC",
    )
    .bind(organisation_ids)
    .fetch_all(pool)
    .await?;

    Ok(subscriptions)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn request(json: serde_json::Value) -> Result<Purchase, AppError> {
        Purchase::try_from(serde_json::from_value::<PurchasePackageRequest>(json).unwrap())
    }

    #[test]
    fn purchase_request_requires_every_field() {
        let result = request(serde_json::json!({
            "packageId": Uuid::new_v4(),
            "vehicleCount": 2,
            "paymentFrom": "Wallet"
        }));
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn purchase_request_rejects_zero_vehicles_and_unknown_source() {
        let package_id = Uuid::new_v4();
        let zero = request(serde_json::json!({
            "packageId": package_id,
            "startDate": "2025-03-01T00:00:00Z",
            "vehicleCount": 0,
            "paymentFrom": "Wallet"
        }));
        assert!(matches!(zero, Err(AppError::InvalidRequest(_))));

        let cash = request(serde_json::json!({
            "packageId": package_id,
            "startDate": "2025-03-01T00:00:00Z",
            "vehicleCount": 1,
            "paymentFrom": "Cash"
        }));
        assert!(matches!(cash, Err(AppError::InvalidRequest(_))));
    }

    #[test]
    fn purchase_request_parses_valid_body() {
        let package_id = Uuid::new_v4();
        let purchase = request(serde_json::json!({
            "packageId": package_id,
            "startDate": "2025-03-01T00:00:00Z",
            "vehicleCount": 4,
            "paymentFrom": "PaymentGateway"
        }))
        .unwrap();

        assert_eq!(purchase.package_id, package_id);
        assert_eq!(purchase.vehicle_count, 4);
        assert_eq!(purchase.source, PaymentSource::PaymentGateway);
        assert_eq!(
            purchase.starts_on,
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn terms_total_is_unit_price_times_vehicles() {
        let terms = SubscriptionTerms {
            package_id: Uuid::new_v4(),
            starts_on: Utc::now(),
            unit_paise: 25_000,
            vehicle_count: 6,
            days_count: 30,
        };
        assert_eq!(terms.total_paise().unwrap(), 150_000);
    }
}
