use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery grouping mode for a queued notification.
///
/// `Instant` notifications are sent individually as soon as a dispatch
/// cycle picks them up; digest cadences are folded into one email per
/// recipient per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Instant,
    HourlyDigest,
    DailyDigest,
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cadence::Instant => write!(f, "instant"),
            Cadence::HourlyDigest => write!(f, "hourly_digest"),
            Cadence::DailyDigest => write!(f, "daily_digest"),
        }
    }
}

/// Notification delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A notification queued for delivery — the unit of work for the dispatcher.
///
/// `kind` is kept as the raw tag from the database rather than a typed enum:
/// the renderer parses it, so a row with an unrecognized tag becomes a
/// permanent per-record failure instead of poisoning the whole batch fetch.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueuedNotification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub cadence: Cadence,
    pub status: DeliveryStatus,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// A resolved recipient: where to deliver and how to address them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub display_name: String,
}

/// A rendered email ready for handoff to the delivery transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
}
