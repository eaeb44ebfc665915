//! Scheduler-facing dispatch trigger.
//!
//! The external scheduler calls this endpoint hourly (and operators may call
//! it on demand). It is authenticated by a shared secret rather than a user
//! session: the only caller is a machine, and the secret comparison runs in
//! constant time so the response latency leaks nothing about the match.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};

use courier_common::error::AppError;
use courier_dispatch::dispatcher::{CycleSummary, Dispatcher};
use courier_dispatch::resolver::PgRecipientResolver;
use courier_dispatch::retry::RetryPolicy;
use courier_dispatch::store::PgQueueStore;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/internal/notifications/dispatch", post(run_dispatch))
}

/// POST /internal/notifications/dispatch — run one drain cycle.
async fn run_dispatch(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CycleSummary>, AppError> {
    authorize(&headers, &state.config.cron_secret)?;

    let delivery = state.delivery.clone().ok_or_else(|| {
        AppError::Config("RESEND_API_KEY is not configured, cannot deliver email".to_string())
    })?;

    let dispatcher = Dispatcher::new(
        PgQueueStore::new(state.pool.clone(), state.config.retention_days),
        PgRecipientResolver::new(state.pool.clone()),
        delivery,
        RetryPolicy::new(state.config.dispatch_max_retries),
    );

    let summary = dispatcher
        .run_cycle(state.config.dispatch_batch_limit)
        .await?;

    Ok(Json(summary))
}

/// Validate the scheduler's `Authorization: Bearer <secret>` header.
fn authorize(headers: &HeaderMap, secret: &str) -> Result<(), AppError> {
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Auth("Missing Authorization header".to_string()))?;

    if constant_time_eq(presented.as_bytes(), secret.as_bytes()) {
        Ok(())
    } else {
        Err(AppError::Auth("Invalid dispatch secret".to_string()))
    }
}

/// Byte-wise comparison that does not short-circuit on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secre"));
        assert!(!constant_time_eq(b"", b"secret"));
        assert!(constant_time_eq(b"", b""));
    }

    #[test]
    fn test_authorize_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Token hunter2".parse().unwrap());
        assert!(authorize(&headers, "hunter2").is_err());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer hunter2".parse().unwrap());
        assert!(authorize(&headers, "hunter2").is_ok());
    }

    #[test]
    fn test_authorize_missing_header() {
        let headers = HeaderMap::new();
        assert!(authorize(&headers, "hunter2").is_err());
    }
}
