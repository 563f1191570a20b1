//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, outbound calls and file storage.

/// Outbound mail (OTP delivery)
pub mod mailer;
pub mod otp_service;
pub mod package_service;
/// Cashfree order creation and webhook signatures
pub mod payment_gateway;
pub mod subscription_service;
pub mod upload_service;
pub mod wallet_service;
