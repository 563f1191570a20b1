//! Organisation account model and API request/response types.
//!
//! This module defines:
//! - `Organisation`: database entity for a fleet operator account
//! - Request bodies for signup and sign-in
//! - `OrganisationProfile` / `RegistrationDocuments`: response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents an organisation record from the database.
///
/// # Wallet
///
/// `wallet_balance_paise` only moves when money actually arrives (webhook
/// confirmation) or leaves (wallet-paid subscription). Pending top-ups live
/// in `wallet_entries` until then.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Organisation {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_no: String,
    pub role: String,
    pub verified: bool,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub profile_picture_path: Option<String>,
    pub aadhar_path: Option<String>,
    pub driving_license_path: Option<String>,
    pub address_proof_path: Option<String>,
    pub wallet_balance_paise: i64,
    pub total_added_paise: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for organisation signup.
///
/// Fields are optional at the type level so that a missing field produces
/// our own 400 response instead of the extractor's rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationSignupRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone_no: Option<String>,
}

/// Public view of an organisation (no OTP fields).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone_no: String,
    pub role: String,
    pub verified: bool,
    pub profile_picture_file_path: Option<String>,
    pub wallet_balance_paise: i64,
    pub total_added_paise: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Organisation> for OrganisationProfile {
    fn from(org: Organisation) -> Self {
        Self {
            id: org.id,
            name: org.name,
            email: org.email,
            phone_no: org.phone_no,
            role: org.role,
            verified: org.verified,
            profile_picture_file_path: org.profile_picture_path,
            wallet_balance_paise: org.wallet_balance_paise,
            total_added_paise: org.total_added_paise,
            created_at: org.created_at,
        }
    }
}

/// KYC document paths stored for an organisation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDocuments {
    pub aadhar_file_path: Option<String>,
    pub driving_license_file_path: Option<String>,
    pub address_proof_file_path: Option<String>,
    pub profile_picture_file_path: Option<String>,
}

impl RegistrationDocuments {
    pub fn is_empty(&self) -> bool {
        self.aadhar_file_path.is_none()
            && self.driving_license_file_path.is_none()
            && self.address_proof_file_path.is_none()
            && self.profile_picture_file_path.is_none()
    }
}

impl From<&Organisation> for RegistrationDocuments {
    fn from(org: &Organisation) -> Self {
        Self {
            aadhar_file_path: org.aadhar_path.clone(),
            driving_license_file_path: org.driving_license_path.clone(),
            address_proof_file_path: org.address_proof_path.clone(),
            profile_picture_file_path: org.profile_picture_path.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: OrganisationProfile,
}

#[derive(Debug, Serialize)]
pub struct RegistrationDetailsResponse {
    pub message: String,
    pub documents: RegistrationDocuments,
}

/// Organisation as listed to admins, with its subscriptions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationWithHistory {
    #[serde(flatten)]
    pub profile: OrganisationProfile,
    pub subscription_history: Vec<crate::models::subscription::Subscription>,
}
