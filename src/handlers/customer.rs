//! Customer (individual user) HTTP handlers.
//!
//! This module implements the `/api/customer` endpoints:
//! - POST /signup - Create account, mail verification OTP
//! - POST /verify-account - Confirm OTP, receive token
//! - POST /signin - Password sign-in
//! - POST /reset-password - Set a new password pending OTP verification
//! - POST /change-password - Change password (authenticated)

use axum::{Extension, Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    auth::{self, Role},
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        customer::{
            ChangePasswordRequest, Customer, CustomerSignupRequest, PasswordSigninRequest,
            ResetPasswordRequest,
        },
        session::{MessageResponse, TokenResponse, VerifyOtpRequest, required},
    },
    services::otp_service::{self, RESET_PASSWORD_SUBJECT, SIGN_UP_SUBJECT},
    state::AppState,
};

async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<Customer>, AppError> {
    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(customer)
}

/// Register a customer.
///
/// # Request Body
///
/// ```json
/// {
///   "email": "rider@example.com",
///   "password": "s3cret",
///   "name": "Asha",
///   "companyName": "Asha Logistics",
///   "phoneNo": "9876543210"
/// }
/// ```
///
/// # Response
///
/// - **201**: account created, OTP mailed
/// - **200**: account exists but is unverified, new OTP mailed
/// - **409**: verified account with this email exists
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<CustomerSignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let email = required(&request.email, "All fields are required")?;
    let password = required(&request.password, "All fields are required")?;
    let name = required(&request.name, "All fields are required")?;
    let company_name = required(&request.company_name, "All fields are required")?;
    let email = auth::normalize_email(email);

    if let Some(existing) = find_by_email(&state.pool, &email).await? {
        if existing.verified {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        otp_service::issue_otp(&state, Role::Customer, existing.id, &email, SIGN_UP_SUBJECT)
            .await?;
        return Ok((
            StatusCode::OK,
            Json(MessageResponse::new(
                "User already exists. OTP sent to your email. Verify Account",
            )),
        ));
    }

    let password_hash = auth::hash_password(password)?;
    let phone_no = request
        .phone_no
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let customer_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO customers (name, phone_no, email, company_name, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(phone_no)
    .bind(&email)
    .bind(company_name)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await?;

    otp_service::issue_otp(&state, Role::Customer, customer_id, &email, SIGN_UP_SUBJECT).await?;
    tracing::info!(%customer_id, "Customer registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Sign Up successful. OTP sent to your email. Verify Account",
        )),
    ))
}

pub async fn verify_account(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = required(&request.email, "Email and OTP are required")?;
    let otp = required(&request.otp, "Email and OTP are required")?;

    let response = otp_service::verify_otp(&state, Role::Customer, email, otp).await?;
    Ok(Json(response))
}

/// Password sign-in.
///
/// An unverified account gets a fresh OTP and a 403 instead of a token.
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<PasswordSigninRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = required(&request.email, "Email and password are required")?;
    let password = required(&request.password, "Email and password are required")?;
    let email = auth::normalize_email(email);

    let customer = find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| otp_service::not_found(Role::Customer))?;

    if !customer.verified {
        otp_service::issue_otp(&state, Role::Customer, customer.id, &email, SIGN_UP_SUBJECT)
            .await?;
        return Err(AppError::NotVerified(
            "Account not verified. A new OTP has been sent to your email".to_string(),
        ));
    }

    if !auth::verify_password(password, &customer.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = auth::issue_token(
        customer.id,
        &customer.email,
        Role::Customer,
        &state.config.jwt_secret,
        state.config.jwt_ttl_secs,
    )?;

    Ok(Json(TokenResponse {
        message: "Signed in successfully".to_string(),
        token,
    }))
}

/// Store a new password and require OTP verification before it can be used.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = required(&request.email, "Email and password are required")?;
    let password = required(&request.password, "Email and password are required")?;
    let email = auth::normalize_email(email);

    let customer = find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| otp_service::not_found(Role::Customer))?;

    let password_hash = auth::hash_password(password)?;
    sqlx::query(
        r#"
        UPDATE customers
        SET password_hash = $1,
            verified = FALSE,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(&password_hash)
    .bind(customer.id)
    .execute(&state.pool)
    .await?;

    otp_service::issue_otp(
        &state,
        Role::Customer,
        customer.id,
        &email,
        RESET_PASSWORD_SUBJECT,
    )
    .await?;

    Ok(Json(MessageResponse::new(
        "Password reset. Verify the OTP sent to your email to continue",
    )))
}

pub async fn change_password(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let old_password = required(&request.old_password, "Old and new password are required")?;
    let new_password = required(&request.new_password, "Old and new password are required")?;

    let password_hash: String =
        sqlx::query_scalar("SELECT password_hash FROM customers WHERE id = $1")
            .bind(caller.account_id)
            .fetch_optional(&pool)
            .await?
            .ok_or_else(|| otp_service::not_found(Role::Customer))?;

    if !auth::verify_password(old_password, &password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    sqlx::query("UPDATE customers SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(auth::hash_password(new_password)?)
        .bind(caller.account_id)
        .execute(&pool)
        .await?;

    tracing::info!(customer_id = %caller.account_id, "Password changed");
    Ok(Json(MessageResponse::new("Password changed successfully")))
}
