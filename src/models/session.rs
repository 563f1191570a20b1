//! Request and response bodies shared by the sign-in flows of every role.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Body carrying only an email (OTP sign-in).
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    /// Accepted as a JSON string or number
    #[serde(default, deserialize_with = "string_or_number")]
    pub otp: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub token: Option<String>,
}

/// Plain `{ "message": ... }` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Returned by successful OTP verification and password sign-in.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub message: String,
    pub token: String,
}

/// Extract a required, non-blank string field.
pub fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::invalid(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_accepts_string_or_number() {
        let from_number: VerifyOtpRequest =
            serde_json::from_str(r#"{"email":"a@b.c","otp":123456}"#).unwrap();
        let from_string: VerifyOtpRequest =
            serde_json::from_str(r#"{"email":"a@b.c","otp":"123456"}"#).unwrap();
        let missing: VerifyOtpRequest = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();

        assert_eq!(from_number.otp.as_deref(), Some("123456"));
        assert_eq!(from_string.otp.as_deref(), Some("123456"));
        assert!(missing.otp.is_none());
    }

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(required(&None, "Email is required").is_err());
        assert!(required(&Some("   ".into()), "Email is required").is_err());
        assert_eq!(required(&Some(" a@b.c ".into()), "x").unwrap(), "a@b.c");
    }
}
