//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Infrastructure Errors**: database, filesystem, mail delivery, token signing
/// - **Authentication Errors**: missing/invalid/revoked tokens, wrong OTP, bad credentials
/// - **Resource Errors**: requested records not found
/// - **Business Logic Errors**: insufficient wallet balance, duplicate accounts
/// - **Validation Errors**: missing or malformed request fields
/// - **Gateway Errors**: the payment gateway rejected or failed a call
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading or writing an uploaded file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Signing a token or hashing a password failed.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// The OTP mail could not be delivered.
    #[error("Mail delivery failed: {0}")]
    Mail(String),

    /// Bearer token is missing, malformed, expired, revoked or for another role.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Unauthorized")]
    Unauthorized,

    /// Submitted OTP does not match the one on record.
    #[error("Invalid OTP")]
    InvalidOtp,

    /// Submitted OTP matched but is past its expiry.
    #[error("OTP has expired")]
    OtpExpired,

    /// Password sign-in with wrong credentials.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Webhook signature did not verify.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Account exists but has not completed OTP verification.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("{0}")]
    NotVerified(String),

    /// Requested record does not exist or doesn't belong to the caller.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("{0}")]
    NotFound(String),

    /// An account with this email already exists.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    Conflict(String),

    /// Wallet balance is lower than the amount to debit.
    ///
    /// Returns HTTP 402 Payment Required.
    #[error("Insufficient wallet balance.")]
    InsufficientBalance,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// The payment gateway call failed.
    ///
    /// Returns HTTP 502 Bad Gateway.
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest(message.into())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::Unauthorized
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        AppError::InvalidRequest(format!("Multipart error: {}", e))
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Infrastructure failures are logged and reported as a generic 500 so that
/// driver or filesystem details never reach the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            AppError::InvalidOtp => (StatusCode::UNAUTHORIZED, "invalid_otp", self.to_string()),
            AppError::OtpExpired => (StatusCode::UNAUTHORIZED, "otp_expired", self.to_string()),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "invalid_signature",
                self.to_string(),
            ),
            AppError::NotVerified(ref msg) => (StatusCode::FORBIDDEN, "not_verified", msg.clone()),
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            AppError::InsufficientBalance => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_balance",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::PaymentGateway(ref msg) => {
                tracing::error!("Payment gateway failure: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "payment_gateway_error",
                    "The payment gateway could not process the request".to_string(),
                )
            }
            AppError::Database(_) | AppError::Io(_) | AppError::Crypto(_) | AppError::Mail(_) => {
                tracing::error!(error = ?self, "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
