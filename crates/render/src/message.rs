//! Per-kind email rendering.
//!
//! Pure mapping from `(kind, payload)` to a subject/body pair. Missing
//! optional fields degrade to explicit fallbacks; rendering fails only for
//! an unrecognized kind tag or a payload missing its required `title`, both
//! of which are permanent failures for the record.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use courier_common::types::RenderedMessage;

use crate::payload::{
    EventPayload, MealPayload, MessagePayload, NotificationKind, ReminderPayload, ShoppingPayload,
    TaskPayload,
};

/// Fallback when the acting user's name is absent from the payload.
const FALLBACK_ACTOR: &str = "A household member";

/// Fallback when the payload doesn't name its household space.
const FALLBACK_SPACE: &str = "your household";

/// Rendering errors. Both variants are permanent: re-attempting an
/// unrenderable payload cannot succeed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown notification kind '{0}'")]
    UnknownKind(String),

    #[error("invalid payload for kind '{kind}': {reason}")]
    InvalidPayload { kind: String, reason: String },
}

/// Render a notification's payload into a concrete email.
pub fn render(kind_tag: &str, payload: &Value) -> Result<RenderedMessage, RenderError> {
    let kind = NotificationKind::parse(kind_tag)
        .ok_or_else(|| RenderError::UnknownKind(kind_tag.to_string()))?;

    match kind {
        NotificationKind::Task => render_task(parse_payload(kind, payload)?),
        NotificationKind::Event => render_event(parse_payload(kind, payload)?),
        NotificationKind::Message => render_message(parse_payload(kind, payload)?),
        NotificationKind::Shopping => render_shopping(parse_payload(kind, payload)?),
        NotificationKind::Meal => render_meal(parse_payload(kind, payload)?),
        NotificationKind::Reminder => render_reminder(parse_payload(kind, payload)?),
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    kind: NotificationKind,
    payload: &Value,
) -> Result<T, RenderError> {
    serde_json::from_value(payload.clone()).map_err(|e| RenderError::InvalidPayload {
        kind: kind.to_string(),
        reason: e.to_string(),
    })
}

fn format_when(ts: DateTime<Utc>) -> String {
    ts.format("%a, %b %-d at %H:%M UTC").to_string()
}

fn render_task(p: TaskPayload) -> Result<RenderedMessage, RenderError> {
    let assigned_by = p.assigned_by.as_deref().unwrap_or(FALLBACK_ACTOR);
    let space = p.space_name.as_deref().unwrap_or(FALLBACK_SPACE);
    let priority = p.priority.as_deref().unwrap_or("normal");

    let mut body = format!(
        "{} assigned you a task in {}: {} (priority: {})",
        assigned_by, space, p.title, priority
    );
    if let Some(due) = p.due_at {
        body.push_str(&format!("\nDue {}", format_when(due)));
    }
    if let Some(desc) = &p.description {
        body.push_str(&format!("\n\n{}", desc));
    }

    Ok(RenderedMessage {
        subject: format!("New task: {}", p.title),
        body,
    })
}

fn render_event(p: EventPayload) -> Result<RenderedMessage, RenderError> {
    let space = p.space_name.as_deref().unwrap_or(FALLBACK_SPACE);

    let mut body = format!("Upcoming event in {}: {}", space, p.title);
    if let Some(starts) = p.starts_at {
        body.push_str(&format!("\nStarts {}", format_when(starts)));
    }
    if let Some(location) = &p.location {
        body.push_str(&format!("\nLocation: {}", location));
    }
    if let Some(desc) = &p.description {
        body.push_str(&format!("\n\n{}", desc));
    }

    Ok(RenderedMessage {
        subject: format!("Event reminder: {}", p.title),
        body,
    })
}

fn render_message(p: MessagePayload) -> Result<RenderedMessage, RenderError> {
    let sender = p.sender_name.as_deref().unwrap_or(FALLBACK_ACTOR);
    let space = p.space_name.as_deref().unwrap_or(FALLBACK_SPACE);

    let mut body = format!("{} posted in {} ({})", sender, p.title, space);
    if let Some(preview) = &p.preview {
        body.push_str(&format!("\n\n\"{}\"", preview));
    }

    Ok(RenderedMessage {
        subject: format!("New message from {} in {}", sender, p.title),
        body,
    })
}

fn render_shopping(p: ShoppingPayload) -> Result<RenderedMessage, RenderError> {
    let added_by = p.added_by.as_deref().unwrap_or(FALLBACK_ACTOR);
    let space = p.space_name.as_deref().unwrap_or(FALLBACK_SPACE);

    let body = match p.item_count {
        Some(n) => format!(
            "{} added {} item{} to \"{}\" in {}",
            added_by,
            n,
            if n == 1 { "" } else { "s" },
            p.title,
            space
        ),
        None => format!("{} updated \"{}\" in {}", added_by, p.title, space),
    };

    Ok(RenderedMessage {
        subject: format!("Shopping list updated: {}", p.title),
        body,
    })
}

fn render_meal(p: MealPayload) -> Result<RenderedMessage, RenderError> {
    let space = p.space_name.as_deref().unwrap_or(FALLBACK_SPACE);
    let meal_type = p.meal_type.as_deref().unwrap_or("meal");

    let mut body = format!("{} planned in {}: {}", capitalize(meal_type), space, p.title);
    if let Some(when) = p.scheduled_for {
        body.push_str(&format!("\nScheduled for {}", format_when(when)));
    }

    Ok(RenderedMessage {
        subject: format!("Meal plan: {}", p.title),
        body,
    })
}

fn render_reminder(p: ReminderPayload) -> Result<RenderedMessage, RenderError> {
    let space = p.space_name.as_deref().unwrap_or(FALLBACK_SPACE);

    let mut body = format!("Reminder from {}: {}", space, p.title);
    if let Some(at) = p.remind_at {
        body.push_str(&format!("\nWhen: {}", format_when(at)));
    }
    if let Some(desc) = &p.description {
        body.push_str(&format!("\n\n{}", desc));
    }

    Ok(RenderedMessage {
        subject: format!("Reminder: {}", p.title),
        body,
    })
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
