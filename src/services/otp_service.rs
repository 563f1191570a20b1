//! OTP issuance and verification shared by the three account tables.
//!
//! Admins, customers and organisations all keep `otp` / `otp_expires_at`
//! columns. Issuing stores a fresh code and mails it; verifying checks it,
//! clears it and hands back a bearer token.

use uuid::Uuid;

use crate::{
    auth::{self, Role},
    error::AppError,
    models::session::TokenResponse,
    state::AppState,
};

pub const SIGN_UP_SUBJECT: &str = "Sign Up OTP";
pub const RESET_PASSWORD_SUBJECT: &str = "Reset Password OTP";

/// Table holding the accounts of a role.
///
/// Table names are compile-time constants, never request input.
fn table(role: Role) -> &'static str {
    match role {
        Role::Admin => "admins",
        Role::Customer => "customers",
        Role::Organisation => "organisations",
    }
}

pub fn otp_message(otp: &str) -> String {
    format!("Your OTP is: {}", otp)
}

/// Store a fresh OTP for the account and mail it.
pub async fn issue_otp(
    state: &AppState,
    role: Role,
    account_id: Uuid,
    email: &str,
    subject: &str,
) -> Result<(), AppError> {
    let otp = auth::generate_otp();
    let expires_at = auth::otp_expiry(state.config.otp_ttl_secs);

    let sql = format!(
        "UPDATE {} SET otp = $1, otp_expires_at = $2, updated_at = NOW() WHERE id = $3",
        table(role)
    );
    sqlx::query(&sql)
        .bind(&otp)
        .bind(expires_at)
        .bind(account_id)
        .execute(&state.pool)
        .await?;

    state.mailer.send(email, subject, &otp_message(&otp)).await?;
    tracing::info!(role = role.as_str(), %account_id, "OTP issued");

    Ok(())
}

#[derive(sqlx::FromRow)]
struct OtpRow {
    id: Uuid,
    email: String,
    otp: Option<String>,
    otp_expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Check an OTP, clear it, mark the account verified and issue a token.
///
/// # Errors
///
/// - `NotFound`: no account with this email for the role
/// - `InvalidOtp` / `OtpExpired`: code wrong, already used or expired
pub async fn verify_otp(
    state: &AppState,
    role: Role,
    email: &str,
    submitted: &str,
) -> Result<TokenResponse, AppError> {
    let email = auth::normalize_email(email);
    let sql = format!(
        "SELECT id, email, otp, otp_expires_at FROM {} WHERE email = $1",
        table(role)
    );
    let row = sqlx::query_as::<_, OtpRow>(&sql)
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| not_found(role))?;

    auth::check_otp(row.otp.as_deref(), row.otp_expires_at, submitted)?;

    // Admins are provisioned, never self-registered, so there is nothing to verify
    let sql = match role {
        Role::Admin => "UPDATE admins SET otp = NULL, otp_expires_at = NULL, updated_at = NOW() WHERE id = $1".to_string(),
        _ => format!(
            "UPDATE {} SET otp = NULL, otp_expires_at = NULL, verified = TRUE, updated_at = NOW() WHERE id = $1",
            table(role)
        ),
    };
    sqlx::query(&sql).bind(row.id).execute(&state.pool).await?;

    let token = auth::issue_token(
        row.id,
        &row.email,
        role,
        &state.config.jwt_secret,
        state.config.jwt_ttl_secs,
    )?;
    tracing::info!(role = role.as_str(), account_id = %row.id, "Account verified");

    Ok(TokenResponse {
        message: "Account verified successfully".to_string(),
        token,
    })
}

pub fn not_found(role: Role) -> AppError {
    match role {
        Role::Admin => AppError::not_found("Admin not found"),
        _ => AppError::not_found("User not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_mail_body_matches_format() {
        assert_eq!(otp_message("482913"), "Your OTP is: 482913");
    }

    #[test]
    fn each_role_has_its_own_table() {
        assert_eq!(table(Role::Admin), "admins");
        assert_eq!(table(Role::Customer), "customers");
        assert_eq!(table(Role::Organisation), "organisations");
    }
}
