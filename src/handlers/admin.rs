//! Admin HTTP handlers.
//!
//! This module implements `/api/admin`:
//! - POST /signin, /verify-account - OTP login (admins are provisioned, not signed up)
//! - GET /profile
//! - GET /individual-users, /organisation-users - paginated, searchable listings
//! - GET, POST /packages/individual and /packages/organisation
//! - PUT /packages/{catalogue}/{packageId}

use std::collections::HashMap;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    auth::{self, Role},
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        admin::{Admin, AdminProfile, Paging, UserListQuery, UserPage},
        customer::{Customer, CustomerSummary},
        organisation::{Organisation, OrganisationWithHistory},
        package::{CreatePackageRequest, PackageListResponse, PackageResponse, UpdatePackageRequest},
        session::{EmailRequest, MessageResponse, TokenResponse, VerifyOtpRequest, required},
        subscription::Subscription,
    },
    services::{
        otp_service::{self, SIGN_UP_SUBJECT},
        package_service::{self, Catalogue},
        subscription_service,
    },
    state::AppState,
};

/// Send a login OTP to a known admin.
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = auth::normalize_email(required(&request.email, "Email is required")?);

    let admin_id: Uuid = sqlx::query_scalar("SELECT id FROM admins WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| otp_service::not_found(Role::Admin))?;

    otp_service::issue_otp(&state, Role::Admin, admin_id, &email, SIGN_UP_SUBJECT).await?;

    Ok(Json(MessageResponse::new("OTP sent to mail successfully")))
}

pub async fn verify_account(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = required(&request.email, "Email and OTP are required")?;
    let otp = required(&request.otp, "Email and OTP are required")?;

    let response = otp_service::verify_otp(&state, Role::Admin, email, otp).await?;
    Ok(Json(response))
}

pub async fn profile(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<AdminProfile>, AppError> {
    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
        .bind(caller.account_id)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| otp_service::not_found(Role::Admin))?;

    Ok(Json(admin.into()))
}

/// Filter shared by listing and counting: `$1` is the ILIKE pattern or NULL.
const USER_FILTER: &str =
    "($1::TEXT IS NULL OR name ILIKE $1 OR email ILIKE $1 OR phone_no ILIKE $1)";

/// List customers.
///
/// # Query Parameters
///
/// - `page` (default 1), `limit` (default 10, at most 100)
/// - `search`: case-insensitive match on name, email or phone number
pub async fn individual_users(
    State(pool): State<DbPool>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserPage<CustomerSummary>>, AppError> {
    let paging = query.paging();
    let offset = paging.offset()?;
    let pattern = paging.like_pattern();

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM customers WHERE {}", USER_FILTER))
        .bind(&pattern)
        .fetch_one(&pool)
        .await?;

    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT * FROM customers WHERE {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        USER_FILTER
    ))
    .bind(&pattern)
    .bind(paging.limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    Ok(Json(page(
        customers.into_iter().map(CustomerSummary::from).collect(),
        total,
        &paging,
    )))
}

/// List organisations with their subscription history.
pub async fn organisation_users(
    State(pool): State<DbPool>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserPage<OrganisationWithHistory>>, AppError> {
    let paging = query.paging();
    let offset = paging.offset()?;
    let pattern = paging.like_pattern();

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM organisations WHERE {}",
        USER_FILTER
    ))
    .bind(&pattern)
    .fetch_one(&pool)
    .await?;

    let organisations = sqlx::query_as::<_, Organisation>(&format!(
        "SELECT * FROM organisations WHERE {} ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        USER_FILTER
    ))
    .bind(&pattern)
    .bind(paging.limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let ids: Vec<Uuid> = organisations.iter().map(|o| o.id).collect();
    let subscriptions = subscription_service::histories_for(&pool, &ids).await?;

    Ok(Json(page(
        with_histories(organisations, subscriptions),
        total,
        &paging,
    )))
}

/// Attach each subscription to its organisation, keeping query order.
fn with_histories(
    organisations: Vec<Organisation>,
    subscriptions: Vec<Subscription>,
) -> Vec<OrganisationWithHistory> {
    let mut by_org: HashMap<Uuid, Vec<Subscription>> = HashMap::new();
    for subscription in subscriptions {
        by_org
            .entry(subscription.organisation_id)
            .or_default()
            .push(subscription);
    }

    organisations
        .into_iter()
        .map(|org| OrganisationWithHistory {
            subscription_history: by_org.remove(&org.id).unwrap_or_default(),
            profile: org.into(),
        })
        .collect()
}

fn page<T>(users: Vec<T>, total: i64, paging: &Paging) -> UserPage<T> {
    UserPage {
        users,
        total,
        page: paging.page,
        total_pages: paging.total_pages(total),
    }
}

pub async fn individual_packages(
    State(pool): State<DbPool>,
) -> Result<Json<PackageListResponse>, AppError> {
    list_packages(&pool, Catalogue::Individual).await
}

pub async fn organisation_packages(
    State(pool): State<DbPool>,
) -> Result<Json<PackageListResponse>, AppError> {
    list_packages(&pool, Catalogue::Organisation).await
}

async fn list_packages(
    pool: &DbPool,
    catalogue: Catalogue,
) -> Result<Json<PackageListResponse>, AppError> {
    let packages = package_service::list(pool, catalogue).await?;
    Ok(Json(PackageListResponse {
        message: "Packages fetched successfully".to_string(),
        packages,
    }))
}

/// Create a package.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Fleet Monthly",
///   "description": "Unlimited swaps",
///   "periodType": "monthly",
///   "daysCount": 30,
///   "amountPaise": 499900,
///   "features": ["Battery swap", "Roadside assist"]
/// }
/// ```
pub async fn create_individual_package(
    State(pool): State<DbPool>,
    Json(request): Json<CreatePackageRequest>,
) -> Result<(StatusCode, Json<PackageResponse>), AppError> {
    create_package(&pool, Catalogue::Individual, request).await
}

pub async fn create_organisation_package(
    State(pool): State<DbPool>,
    Json(request): Json<CreatePackageRequest>,
) -> Result<(StatusCode, Json<PackageResponse>), AppError> {
    create_package(&pool, Catalogue::Organisation, request).await
}

async fn create_package(
    pool: &DbPool,
    catalogue: Catalogue,
    request: CreatePackageRequest,
) -> Result<(StatusCode, Json<PackageResponse>), AppError> {
    let package = package_service::create(pool, catalogue, request.validate()?).await?;
    Ok((
        StatusCode::CREATED,
        Json(PackageResponse {
            message: "Package created successfully".to_string(),
            package,
        }),
    ))
}

pub async fn update_individual_package(
    State(pool): State<DbPool>,
    Path(package_id): Path<Uuid>,
    Json(request): Json<UpdatePackageRequest>,
) -> Result<Json<PackageResponse>, AppError> {
    update_package(&pool, Catalogue::Individual, package_id, request).await
}

pub async fn update_organisation_package(
    State(pool): State<DbPool>,
    Path(package_id): Path<Uuid>,
    Json(request): Json<UpdatePackageRequest>,
) -> Result<Json<PackageResponse>, AppError> {
    update_package(&pool, Catalogue::Organisation, package_id, request).await
}

async fn update_package(
    pool: &DbPool,
    catalogue: Catalogue,
    package_id: Uuid,
    request: UpdatePackageRequest,
) -> Result<Json<PackageResponse>, AppError> {
    let package = package_service::update(pool, catalogue, package_id, request).await?;
    Ok(Json(PackageResponse {
        message: "Package updated successfully".to_string(),
        package,
    }))
}
