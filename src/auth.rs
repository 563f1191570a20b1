//! Bearer tokens, one-time passwords and password hashing.
//!
//! Every role signs in the same way in the end: once an OTP (or a password,
//! for customers) checks out, the account gets an HS256 JWT whose claims carry
//! the account id, email and role.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::AppError;

/// The three tenants of the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Customer,
    Organisation,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Customer => "Customer",
            Role::Organisation => "Organisation",
        }
    }
}

/// JWT claims embedded in bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Sign a token for an account.
pub fn issue_token(
    account_id: Uuid,
    email: &str,
    role: Role,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: account_id,
        email: email.to_string(),
        role,
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs as i64)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Crypto(format!("token signing failed: {}", e)))
}

/// Validate signature and expiry, returning the claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

/// Random six digit OTP in `100000..=999999`.
pub fn generate_otp() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

pub fn otp_expiry(ttl_secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(ttl_secs)
}

type HmacSha256 = Hmac<Sha256>;

const OTP_MAC_KEY: &[u8] = b"greenglide-otp";

/// Constant-time OTP comparison over the MAC tags of both codes.
fn otp_matches(stored: &str, submitted: &str) -> Result<bool, AppError> {
    let tag = |code: &str| -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(OTP_MAC_KEY)
            .map_err(|e| AppError::Crypto(format!("otp mac: {}", e)))?;
        mac.update(code.as_bytes());
        Ok(mac)
    };
    let expected = tag(stored)?.finalize().into_bytes();
    Ok(tag(submitted)?.verify_slice(&expected).is_ok())
}

/// Compare a submitted OTP with the stored one.
///
/// A cleared OTP (`None`) never matches, so a code can only be used once.
pub fn check_otp(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    submitted: &str,
) -> Result<(), AppError> {
    let stored = stored.ok_or(AppError::InvalidOtp)?;
    if !otp_matches(stored, submitted.trim())? {
        return Err(AppError::InvalidOtp);
    }
    match expires_at {
        Some(expires_at) if expires_at < Utc::now() => Err(AppError::OtpExpired),
        _ => Ok(()),
    }
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Crypto(format!("password hashing failed: {}", e)))
}

/// Verify a password against an Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Crypto(format!("stored password hash is invalid: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Lower-case and trim an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_claims() {
        let id = Uuid::new_v4();
        let token = issue_token(id, "ops@fleet.in", Role::Organisation, "secret", 60).unwrap();
        let claims = decode_token(&token, "secret").unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "ops@fleet.in");
        assert_eq!(claims.role, Role::Organisation);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = issue_token(Uuid::new_v4(), "a@b.c", Role::Admin, "one", 60).unwrap();
        assert!(matches!(
            decode_token(&token, "two"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..200 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            let value: u32 = otp.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn otp_check_rejects_mismatch_expiry_and_cleared_codes() {
        let future = Some(Utc::now() + Duration::minutes(5));
        let past = Some(Utc::now() - Duration::minutes(5));

        assert!(check_otp(Some("123456"), future, "123456").is_ok());
        assert!(check_otp(Some("123456"), None, " 123456 ").is_ok());
        assert!(matches!(
            check_otp(Some("123456"), future, "654321"),
            Err(AppError::InvalidOtp)
        ));
        assert!(matches!(
            check_otp(Some("123456"), past, "123456"),
            Err(AppError::OtpExpired)
        ));
        assert!(matches!(
            check_otp(Some("123456"), future, "12345"),
            Err(AppError::InvalidOtp)
        ));
        assert!(matches!(
            check_otp(None, future, "123456"),
            Err(AppError::InvalidOtp)
        ));
    }

    #[test]
    fn otp_comparison_matches_only_identical_codes() {
        assert!(otp_matches("482913", "482913").unwrap());
        assert!(!otp_matches("482913", "482914").unwrap());
        assert!(!otp_matches("482913", "4829130").unwrap());
        assert!(!otp_matches("482913", "").unwrap());
    }

    #[test]
    fn password_hash_verifies_only_the_original() {
        let hash = hash_password("charge-me-up").unwrap();
        assert!(verify_password("charge-me-up", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Fleet@Example.COM "), "fleet@example.com");
    }
}
