//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `JWT_SECRET` (required): HMAC secret used to sign bearer tokens
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 8080
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `JWT_TTL_SECS` (optional): token lifetime, defaults to 7 days
/// - `OTP_TTL_SECS` (optional): OTP lifetime, defaults to 10 minutes
/// - `UPLOAD_DIR` (optional): root directory for uploaded documents, defaults to `Uploads`
/// - `CASHFREE_CLIENT_ID` / `CASHFREE_CLIENT_SECRET`: payment gateway credentials
/// - `CASHFREE_ENVIRONMENT` (optional): `sandbox` or `production`, defaults to sandbox
/// - `CASHFREE_API_VERSION` (optional): defaults to `2023-08-01`
/// - `CASHFREE_VERIFY_WEBHOOKS` (optional): verify webhook signatures, defaults to true
/// - `MAIL_API_URL` / `MAIL_API_KEY` / `MAIL_FROM` (optional): transactional mail API
/// - `ADMIN_EMAIL` / `ADMIN_NAME` (optional): bootstrap admin created at startup
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    pub jwt_secret: String,

    #[serde(default = "default_jwt_ttl")]
    pub jwt_ttl_secs: u64,

    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_secs: i64,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default)]
    pub cashfree_client_id: String,

    #[serde(default)]
    pub cashfree_client_secret: String,

    #[serde(default = "default_cashfree_environment")]
    pub cashfree_environment: String,

    #[serde(default = "default_cashfree_api_version")]
    pub cashfree_api_version: String,

    #[serde(default = "default_true")]
    pub cashfree_verify_webhooks: bool,

    pub mail_api_url: Option<String>,

    pub mail_api_key: Option<String>,

    #[serde(default = "default_mail_from")]
    pub mail_from: String,

    pub admin_email: Option<String>,

    pub admin_name: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    5
}

fn default_jwt_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_otp_ttl() -> i64 {
    10 * 60
}

fn default_upload_dir() -> String {
    "Uploads".to_string()
}

fn default_cashfree_environment() -> String {
    "sandbox".to_string()
}

fn default_cashfree_api_version() -> String {
    "2023-08-01".to_string()
}

fn default_true() -> bool {
    true
}

fn default_mail_from() -> String {
    "no-reply@greenglide.app".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, JWT_SECRET)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()
    }

    /// Base URL of the Cashfree PG API for the configured environment.
    pub fn cashfree_base_url(&self) -> &'static str {
        if self.cashfree_environment.eq_ignore_ascii_case("production") {
            "https://api.cashfree.com/pg"
        } else {
            "https://sandbox.cashfree.com/pg"
        }
    }
}
