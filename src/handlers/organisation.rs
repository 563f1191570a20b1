//! Organisation account HTTP handlers.
//!
//! This module implements the account side of `/api/organisation`:
//! - POST /signup, /signin, /verify-account - OTP onboarding and login
//! - POST /registration - KYC document upload
//! - GET /registration-details - stored document paths
//! - POST /update-profile-details, GET /get-profile-details
//! - GET /get-all-packages - organisation package catalogue
//!
//! Subscriptions, wallet and webhooks live in their own modules.

use std::path::Path;

use axum::{
    Extension, Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    auth::{self, Role},
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        organisation::{
            Organisation, OrganisationSignupRequest, ProfileResponse, RegistrationDetailsResponse,
            RegistrationDocuments,
        },
        package::{Package, PackageListResponse},
        session::{EmailRequest, MessageResponse, TokenResponse, VerifyOtpRequest, required},
    },
    services::{
        otp_service::{self, SIGN_UP_SUBJECT},
        upload_service::{self, ADDRESS_PROOF, AADHAR, DRIVING_LICENSE, PROFILE_PICTURE},
        wallet_service,
    },
    state::AppState,
};

async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<Organisation>, AppError> {
    let org = sqlx::query_as::<_, Organisation>("SELECT * FROM organisations WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(org)
}

/// Register an organisation.
///
/// # Response
///
/// - **201**: account created, OTP mailed
/// - **200**: unverified account exists, OTP mailed again
/// - **409**: verified account with this email exists
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<OrganisationSignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let email = required(&request.email, "All fields are required")?;
    let name = required(&request.name, "All fields are required")?;
    let phone_no = required(&request.phone_no, "All fields are required")?;
    let email = auth::normalize_email(email);

    if let Some(existing) = find_by_email(&state.pool, &email).await? {
        if existing.verified {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        otp_service::issue_otp(&state, Role::Organisation, existing.id, &email, SIGN_UP_SUBJECT)
            .await?;
        return Ok((
            StatusCode::OK,
            Json(MessageResponse::new(
                "User already exists. OTP sent to your email. Verify Account",
            )),
        ));
    }

    let organisation_id: Uuid = sqlx::query_scalar(
        "INSERT INTO organisations (name, email, phone_no) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(&email)
    .bind(phone_no)
    .fetch_one(&state.pool)
    .await?;

    otp_service::issue_otp(&state, Role::Organisation, organisation_id, &email, SIGN_UP_SUBJECT)
        .await?;
    tracing::info!(%organisation_id, "Organisation registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Sign Up successful. OTP sent to your email. Verify Account",
        )),
    ))
}

/// OTP sign-in: mail a code to a known organisation.
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = auth::normalize_email(required(&request.email, "Email is required")?);

    let org = find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| otp_service::not_found(Role::Organisation))?;

    otp_service::issue_otp(&state, Role::Organisation, org.id, &email, SIGN_UP_SUBJECT).await?;

    Ok(Json(MessageResponse::new("OTP sent to mail successfully")))
}

pub async fn verify_account(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = required(&request.email, "Email and OTP are required")?;
    let otp = required(&request.otp, "Email and OTP are required")?;

    let response = otp_service::verify_otp(&state, Role::Organisation, email, otp).await?;
    Ok(Json(response))
}

/// Upload KYC documents.
///
/// Multipart fields `aadhar`, `drivingLicense` and `addressProof`, one file
/// each, at least one in total. A document that is uploaded again replaces
/// the stored file; documents not in this request are kept.
pub async fn registration(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>, AppError> {
    let upload_dir = Path::new(&state.config.upload_dir);
    let uploads = upload_service::receive(
        upload_dir,
        multipart,
        &[AADHAR, DRIVING_LICENSE, ADDRESS_PROOF],
        &[],
    )
    .await?;

    if uploads.files.is_empty() {
        return Err(AppError::invalid(
            "At least one registration document (Aadhar, Driving License, or Address Proof) is required.",
        ));
    }

    let previous = match wallet_service::find_organisation(&state.pool, caller.account_id).await {
        Ok(org) => RegistrationDocuments::from(&org),
        Err(e) => {
            uploads.discard().await;
            return Err(e);
        }
    };

    let updated = sqlx::query_as::<_, Organisation>(
        r#"
        UPDATE organisations
        SET aadhar_path = COALESCE($1, aadhar_path),
            driving_license_path = COALESCE($2, driving_license_path),
            address_proof_path = COALESCE($3, address_proof_path),
            updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(uploads.path(AADHAR))
    .bind(uploads.path(DRIVING_LICENSE))
    .bind(uploads.path(ADDRESS_PROOF))
    .bind(caller.account_id)
    .fetch_one(&state.pool)
    .await;

    let org = match updated {
        Ok(org) => org,
        Err(e) => {
            uploads.discard().await;
            return Err(e.into());
        }
    };

    let replaced = [
        (AADHAR, previous.aadhar_file_path),
        (DRIVING_LICENSE, previous.driving_license_file_path),
        (ADDRESS_PROOF, previous.address_proof_file_path),
    ];
    for (field, old_path) in replaced {
        if let (Some(_), Some(old_path)) = (uploads.file(field), old_path) {
            upload_service::remove_stored(upload_dir, &old_path).await;
        }
    }

    tracing::info!(organisation_id = %org.id, documents = uploads.files.len(), "Registration documents stored");

    Ok(Json(ProfileResponse {
        message: "Organisation documents registered successfully".to_string(),
        user: org.into(),
    }))
}

pub async fn registration_details(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<RegistrationDetailsResponse>, AppError> {
    let org = wallet_service::find_organisation(&pool, caller.account_id).await?;
    let documents = RegistrationDocuments::from(&org);

    if documents.is_empty() {
        return Err(AppError::not_found(
            "No registration documents found for this user.",
        ));
    }

    Ok(Json(RegistrationDetailsResponse {
        message: "Organisation registration documents retrieved successfully".to_string(),
        documents,
    }))
}

/// Update the display name and/or profile picture.
///
/// Multipart fields `name` (text) and `profilePicture` (file). The previous
/// picture is deleted from disk once the new one is stored.
pub async fn update_profile_details(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>, AppError> {
    let upload_dir = Path::new(&state.config.upload_dir);
    let uploads =
        upload_service::receive(upload_dir, multipart, &[PROFILE_PICTURE], &["name"]).await?;

    let existing = match wallet_service::find_organisation(&state.pool, caller.account_id).await {
        Ok(org) => org,
        Err(e) => {
            uploads.discard().await;
            return Err(e);
        }
    };

    let name = uploads
        .text("name")
        .filter(|n| *n != existing.name)
        .map(str::to_string);
    let picture = uploads.path(PROFILE_PICTURE);

    if name.is_none() && picture.is_none() {
        uploads.discard().await;
        return Err(AppError::invalid(
            "No valid profile details provided for update.",
        ));
    }

    let updated = sqlx::query_as::<_, Organisation>(
        r#"
        UPDATE organisations
        SET name = COALESCE($1, name),
            profile_picture_path = COALESCE($2, profile_picture_path),
            updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(&picture)
    .bind(existing.id)
    .fetch_one(&state.pool)
    .await;

    let org = match updated {
        Ok(org) => org,
        Err(e) => {
            uploads.discard().await;
            return Err(e.into());
        }
    };

    if let (Some(_), Some(old_path)) = (&picture, &existing.profile_picture_path) {
        upload_service::remove_stored(upload_dir, old_path).await;
    }

    Ok(Json(ProfileResponse {
        message: "Profile details updated successfully".to_string(),
        user: org.into(),
    }))
}

pub async fn get_profile_details(
    State(pool): State<DbPool>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<ProfileResponse>, AppError> {
    let org = wallet_service::find_organisation(&pool, caller.account_id).await?;

    Ok(Json(ProfileResponse {
        message: "Profile details fetched successfully".to_string(),
        user: org.into(),
    }))
}

/// Public package catalogue for organisations.
pub async fn get_all_packages(
    State(pool): State<DbPool>,
) -> Result<Json<PackageListResponse>, AppError> {
    let packages =
        sqlx::query_as::<_, Package>("SELECT * FROM organisation_packages ORDER BY created_at")
            .fetch_all(&pool)
            .await?;

    if packages.is_empty() {
        return Err(AppError::not_found("No packages found."));
    }

    Ok(Json(PackageListResponse {
        message: "Packages fetched successfully".to_string(),
        packages,
    }))
}
