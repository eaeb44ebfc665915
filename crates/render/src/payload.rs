//! Typed payload shapes for the closed set of notification kinds.
//!
//! Every kind requires a `title`; all other fields are optional and the
//! renderer substitutes explicit fallbacks when they are absent.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The closed set of notification kinds the pipeline knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Task,
    Event,
    Message,
    Shopping,
    Meal,
    Reminder,
}

impl NotificationKind {
    /// Parse a raw kind tag. Returns `None` for unrecognized tags — the
    /// caller treats that as a permanent render failure.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "task" => Some(NotificationKind::Task),
            "event" => Some(NotificationKind::Event),
            "message" => Some(NotificationKind::Message),
            "shopping" => Some(NotificationKind::Shopping),
            "meal" => Some(NotificationKind::Meal),
            "reminder" => Some(NotificationKind::Reminder),
            _ => None,
        }
    }

    /// Plural heading used for digest sections.
    pub fn plural_label(&self) -> &'static str {
        match self {
            NotificationKind::Task => "Tasks",
            NotificationKind::Event => "Events",
            NotificationKind::Message => "Messages",
            NotificationKind::Shopping => "Shopping lists",
            NotificationKind::Meal => "Meals",
            NotificationKind::Reminder => "Reminders",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Task => write!(f, "task"),
            NotificationKind::Event => write!(f, "event"),
            NotificationKind::Message => write!(f, "message"),
            NotificationKind::Shopping => write!(f, "shopping"),
            NotificationKind::Meal => write!(f, "meal"),
            NotificationKind::Reminder => write!(f, "reminder"),
        }
    }
}

/// A chore or to-do assigned to the recipient.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub priority: Option<String>,
    pub assigned_by: Option<String>,
    pub space_name: Option<String>,
}

/// A calendar event that is approaching or was just created.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub space_name: Option<String>,
}

/// A new chat message in a household conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagePayload {
    /// Conversation or thread name
    pub title: String,
    pub sender_name: Option<String>,
    pub preview: Option<String>,
    pub space_name: Option<String>,
}

/// A change to a shared shopping list.
#[derive(Debug, Clone, Deserialize)]
pub struct ShoppingPayload {
    /// List name
    pub title: String,
    pub added_by: Option<String>,
    pub item_count: Option<u32>,
    pub space_name: Option<String>,
}

/// A planned meal.
#[derive(Debug, Clone, Deserialize)]
pub struct MealPayload {
    pub title: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub meal_type: Option<String>,
    pub space_name: Option<String>,
}

/// A generic reminder.
#[derive(Debug, Clone, Deserialize)]
pub struct ReminderPayload {
    pub title: String,
    pub description: Option<String>,
    pub remind_at: Option<DateTime<Utc>>,
    pub space_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_kinds() {
        for tag in ["task", "event", "message", "shopping", "meal", "reminder"] {
            let kind = NotificationKind::parse(tag).unwrap();
            assert_eq!(kind.to_string(), tag);
        }
    }

    #[test]
    fn test_parse_unknown_kind() {
        assert!(NotificationKind::parse("push_badge").is_none());
        assert!(NotificationKind::parse("").is_none());
        assert!(NotificationKind::parse("Task").is_none(), "tags are case-sensitive");
    }
}
