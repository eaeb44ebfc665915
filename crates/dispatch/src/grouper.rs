//! Stable partition of a fetched batch by `(recipient, cadence)`.
//!
//! Digest cadences must produce exactly one email per recipient per cycle,
//! and instant notifications must never be batched, so the bucket key is the
//! pair. Fetch order (oldest first) is preserved within each bucket and
//! across bucket creation, keeping digest content deterministic.

use std::collections::HashMap;

use uuid::Uuid;

use courier_common::types::{Cadence, QueuedNotification};

/// One unit of bucket processing: all pending notifications for a single
/// recipient at a single cadence.
#[derive(Debug)]
pub struct Bucket {
    pub recipient_id: Uuid,
    pub cadence: Cadence,
    pub items: Vec<QueuedNotification>,
}

/// Partition a batch into buckets keyed by `(recipient_id, cadence)`,
/// preserving the input order within each bucket.
pub fn group_by_recipient(batch: Vec<QueuedNotification>) -> Vec<Bucket> {
    let mut index: HashMap<(Uuid, Cadence), usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for record in batch {
        let key = (record.recipient_id, record.cadence);
        match index.get(&key) {
            Some(&i) => buckets[i].items.push(record),
            None => {
                index.insert(key, buckets.len());
                buckets.push(Bucket {
                    recipient_id: record.recipient_id,
                    cadence: record.cadence,
                    items: vec![record],
                });
            }
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use courier_common::types::DeliveryStatus;
    use serde_json::json;

    fn make_record(recipient: Uuid, cadence: Cadence, title: &str) -> QueuedNotification {
        QueuedNotification {
            id: Uuid::new_v4(),
            recipient_id: recipient,
            kind: "task".to_string(),
            payload: json!({ "title": title }),
            cadence,
            status: DeliveryStatus::Pending,
            retry_count: 0,
            created_at: Utc::now(),
            last_attempt_at: None,
            last_error: None,
        }
    }

    #[test]
    fn test_one_bucket_per_distinct_pair() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let batch = vec![
            make_record(a, Cadence::Instant, "1"),
            make_record(a, Cadence::DailyDigest, "2"),
            make_record(b, Cadence::DailyDigest, "3"),
            make_record(a, Cadence::DailyDigest, "4"),
            make_record(b, Cadence::Instant, "5"),
        ];

        let buckets = group_by_recipient(batch);
        assert_eq!(buckets.len(), 4, "4 distinct (recipient, cadence) pairs");

        for bucket in &buckets {
            for item in &bucket.items {
                assert_eq!(item.recipient_id, bucket.recipient_id);
                assert_eq!(item.cadence, bucket.cadence);
            }
        }
    }

    #[test]
    fn test_fetch_order_preserved_within_bucket() {
        let a = Uuid::new_v4();
        let batch = vec![
            make_record(a, Cadence::DailyDigest, "oldest"),
            make_record(a, Cadence::DailyDigest, "middle"),
            make_record(a, Cadence::DailyDigest, "newest"),
        ];

        let buckets = group_by_recipient(batch);
        assert_eq!(buckets.len(), 1);
        let titles: Vec<_> = buckets[0]
            .items
            .iter()
            .map(|r| r.payload["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["oldest", "middle", "newest"]);
    }

    #[test]
    fn test_empty_batch_yields_no_buckets() {
        assert!(group_by_recipient(vec![]).is_empty());
    }
}
