//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, multipart form, URL params)
//! 2. Validates required fields and calls into the services
//! 3. Returns HTTP response (JSON, status code)

pub mod admin;
pub mod customer;
/// Service and database health endpoint
pub mod health;
pub mod organisation;
/// Gateway callbacks for purchases, renewals and wallet top-ups
pub mod payment_webhooks;
/// Auth check, logout and welcome text shared by every role
pub mod session;
pub mod subscriptions;
pub mod wallet;
