//! Digest aggregation — folds a recipient's queued notifications for one
//! cadence window into a single email.
//!
//! The item list is grouped a second time by kind; each kind section shows a
//! count and a bounded preview of individual titles so the email stays a
//! fixed size regardless of backlog depth.

use courier_common::types::{Cadence, QueuedNotification, RenderedMessage};

use crate::payload::NotificationKind;

/// Maximum individual items previewed per kind section.
pub const DIGEST_PREVIEW_LIMIT: usize = 5;

/// Build one aggregated message for an ordered, same-recipient, same-cadence
/// list. Returns `None` for an empty list — there is nothing to send.
///
/// A digest line never fails the bucket: items with an unreadable payload
/// degrade to an untitled line.
pub fn build_digest(cadence: Cadence, items: &[QueuedNotification]) -> Option<RenderedMessage> {
    if items.is_empty() {
        return None;
    }

    // Group by kind, preserving first-seen kind order and item order within.
    let mut sections: Vec<(String, Vec<&QueuedNotification>)> = Vec::new();
    for item in items {
        match sections.iter_mut().find(|(kind, _)| *kind == item.kind) {
            Some((_, bucket)) => bucket.push(item),
            None => sections.push((item.kind.clone(), vec![item])),
        }
    }

    let window = match cadence {
        Cadence::HourlyDigest => "hourly update",
        Cadence::DailyDigest => "daily digest",
        Cadence::Instant => "updates",
    };

    let total = items.len();
    let subject = format!(
        "Your {}: {} new notification{}",
        window,
        total,
        if total == 1 { "" } else { "s" }
    );

    let mut body = String::from("Here's what happened in your household:\n");
    for (kind_tag, bucket) in &sections {
        let heading = NotificationKind::parse(kind_tag)
            .map(|k| k.plural_label().to_string())
            .unwrap_or_else(|| kind_tag.clone());

        body.push_str(&format!("\n{} ({})\n", heading, bucket.len()));
        for item in bucket.iter().take(DIGEST_PREVIEW_LIMIT) {
            body.push_str(&format!("  • {}\n", item_title(item)));
        }
        if bucket.len() > DIGEST_PREVIEW_LIMIT {
            body.push_str(&format!(
                "  …and {} more\n",
                bucket.len() - DIGEST_PREVIEW_LIMIT
            ));
        }
    }

    Some(RenderedMessage { subject, body })
}

fn item_title(item: &QueuedNotification) -> &str {
    item.payload
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("(untitled)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use courier_common::types::DeliveryStatus;
    use serde_json::json;
    use uuid::Uuid;

    fn make_item(kind: &str, title: &str) -> QueuedNotification {
        QueuedNotification {
            id: Uuid::new_v4(),
            recipient_id: Uuid::new_v4(),
            kind: kind.to_string(),
            payload: json!({ "title": title }),
            cadence: Cadence::DailyDigest,
            status: DeliveryStatus::Pending,
            retry_count: 0,
            created_at: Utc::now(),
            last_attempt_at: None,
            last_error: None,
        }
    }

    #[test]
    fn test_empty_list_produces_nothing() {
        assert!(build_digest(Cadence::DailyDigest, &[]).is_none());
    }

    #[test]
    fn test_digest_groups_by_kind_with_counts() {
        let items = vec![
            make_item("task", "Dishes"),
            make_item("meal", "Tacos"),
            make_item("task", "Laundry"),
        ];
        let msg = build_digest(Cadence::DailyDigest, &items).unwrap();

        assert_eq!(msg.subject, "Your daily digest: 3 new notifications");
        assert!(msg.body.contains("Tasks (2)"));
        assert!(msg.body.contains("Meals (1)"));
        // Order within a kind section follows fetch order
        let dishes = msg.body.find("Dishes").unwrap();
        let laundry = msg.body.find("Laundry").unwrap();
        assert!(dishes < laundry);
    }

    #[test]
    fn test_preview_is_capped_with_overflow_line() {
        let items: Vec<_> = (0..8)
            .map(|i| make_item("task", &format!("Chore {}", i)))
            .collect();
        let msg = build_digest(Cadence::HourlyDigest, &items).unwrap();

        assert!(msg.subject.starts_with("Your hourly update"));
        assert!(msg.body.contains("Chore 4"));
        assert!(!msg.body.contains("Chore 5"), "sixth item must not be previewed");
        assert!(msg.body.contains("…and 3 more"));
    }

    #[test]
    fn test_singular_subject() {
        let items = vec![make_item("reminder", "Pay rent")];
        let msg = build_digest(Cadence::HourlyDigest, &items).unwrap();
        assert_eq!(msg.subject, "Your hourly update: 1 new notification");
    }

    #[test]
    fn test_unreadable_payload_degrades_to_untitled() {
        let mut item = make_item("task", "x");
        item.payload = json!({ "nope": true });
        let msg = build_digest(Cadence::DailyDigest, &[item]).unwrap();
        assert!(msg.body.contains("(untitled)"));
    }
}
