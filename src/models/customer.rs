//! Customer (individual user) model and request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a customer record from the database.
///
/// Customers are the only role that signs in with a password; the OTP is
/// used to verify the email address after signup and after a password reset.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone_no: Option<String>,
    pub email: String,
    pub company_name: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub verified: bool,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub company_name: Option<String>,
    pub phone_no: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordSigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// Customer as listed to admins (no password hash or OTP).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub phone_no: Option<String>,
    pub email: String,
    pub company_name: Option<String>,
    pub role: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerSummary {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            phone_no: c.phone_no,
            email: c.email,
            company_name: c.company_name,
            role: c.role,
            verified: c.verified,
            created_at: c.created_at,
        }
    }
}
