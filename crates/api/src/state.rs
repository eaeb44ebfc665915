//! Shared application state for the Axum API server.

use courier_common::config::AppConfig;
use courier_dispatch::delivery::ResendClient;
use sqlx::PgPool;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    /// Long-lived email transport, `None` when RESEND_API_KEY is unset.
    pub delivery: Option<ResendClient>,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig) -> Self {
        let delivery = config
            .resend_api_key
            .clone()
            .map(|key| ResendClient::new(key, config.email_from.clone()));

        Self {
            pool,
            config,
            delivery,
        }
    }
}
