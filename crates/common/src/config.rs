use std::time::Duration;

use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Upper bound on waiting for a free pool connection. A dispatch cycle that
/// cannot get a connection within this window fails the cycle instead of
/// piling up behind the scheduler's next trigger.
const POOL_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Shared secret the external scheduler presents to trigger a dispatch cycle
    pub cron_secret: String,

    /// Resend API key for email delivery
    pub resend_api_key: Option<String>,

    /// Email sender address (default: "HearthCourier <courier@hearthcourier.app>")
    pub email_from: String,

    /// Maximum number of pending notifications pulled per dispatch cycle (default: 100)
    pub dispatch_batch_limit: i64,

    /// Retry ceiling for transiently failed notifications (default: 5)
    pub dispatch_max_retries: i32,

    /// Days a sent or dead notification is retained before cleanup deletes it (default: 7)
    pub retention_days: i64,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            cron_secret: std::env::var("CRON_SECRET")
                .map_err(|_| anyhow::anyhow!("CRON_SECRET environment variable is required"))?,
            resend_api_key: std::env::var("RESEND_API_KEY").ok(),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "HearthCourier <courier@hearthcourier.app>".to_string()),
            dispatch_batch_limit: std::env::var("DISPATCH_BATCH_LIMIT")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_BATCH_LIMIT must be a valid i64"))?,
            dispatch_max_retries: std::env::var("DISPATCH_MAX_RETRIES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DISPATCH_MAX_RETRIES must be a valid i32"))?,
            retention_days: std::env::var("RETENTION_DAYS")
                .unwrap_or_else(|_| "7".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("RETENTION_DAYS must be a valid i64"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
        })
    }

    /// Open the PostgreSQL pool this configuration describes.
    pub async fn connect_pool(&self) -> anyhow::Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.db_max_connections)
            .acquire_timeout(POOL_ACQUIRE_TIMEOUT)
            .connect(&self.database_url)
            .await?;

        tracing::info!(
            max_connections = self.db_max_connections,
            "PostgreSQL pool ready"
        );
        Ok(pool)
    }
}
