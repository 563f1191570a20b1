//! GreenGlide Backend - Main Application Entry Point
//!
//! REST API for an EV subscription platform with three roles: admins manage
//! users and package catalogues, customers sign up with a password, and
//! organisations (fleet operators) upload KYC documents, buy and renew
//! vehicle subscriptions and keep a prepaid wallet.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: OTP or password sign-in, then HS256 bearer tokens
//! - **Payments**: Cashfree PG orders and signed webhooks
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Seed the bootstrap admin, if configured
//! 4. Build the mailer and payment gateway clients
//! 5. Build HTTP router and start serving

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::{
    services::{
        mailer::{HttpMailer, LogMailer, Mailer},
        payment_gateway::{CashfreeConfig, CashfreeGateway},
    },
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let pruned = db::prune_revoked_tokens(&pool).await?;
    tracing::info!(pruned, "Expired token revocations pruned");

    if let Some(email) = &config.admin_email {
        let name = config.admin_name.as_deref().unwrap_or("Admin");
        if db::seed_admin(&pool, email, name).await? {
            tracing::info!(%email, "Bootstrap admin created");
        }
    }

    let mailer: Arc<dyn Mailer> = match &config.mail_api_url {
        Some(url) => Arc::new(HttpMailer::new(
            url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        )?),
        None => {
            tracing::warn!("MAIL_API_URL not set, OTP mails will only be logged");
            Arc::new(LogMailer)
        }
    };

    if config.cashfree_client_id.is_empty() || config.cashfree_client_secret.is_empty() {
        tracing::warn!("Cashfree credentials missing, gateway orders will fail");
    }
    let gateway = CashfreeGateway::new(CashfreeConfig {
        client_id: config.cashfree_client_id.clone(),
        client_secret: config.cashfree_client_secret.clone(),
        base_url: config.cashfree_base_url().to_string(),
        api_version: config.cashfree_api_version.clone(),
    })?;

    let addr = format!("0.0.0.0:{}", config.server_port);

    let state = AppState {
        pool,
        config: Arc::new(config),
        gateway: Arc::new(gateway),
        mailer,
    };
    let app = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
