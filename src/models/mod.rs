//! Data models representing database entities and API bodies.

pub mod admin;
pub mod customer;
pub mod organisation;
pub mod package;
/// Sign-in, OTP and logout bodies shared by all roles
pub mod session;
pub mod subscription;
pub mod wallet;
/// Inbound payment gateway webhook payload
pub mod webhook;
