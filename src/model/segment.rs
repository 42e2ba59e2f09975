//! Segment — one calendar month of the horizon, the unit of processing and
//! caching (spec.md §3, §4.7).

use jiff::civil::Date;
use rustc_hash::FxHashSet;
use sha2::{Digest, Sha256};

use super::event::TimelineEvent;
use super::ids::{AccountId, SegmentId};

#[derive(Debug, Clone)]
pub struct Segment {
    pub id: SegmentId,
    pub start_date: Date,
    pub end_date: Date,
    pub events: Vec<TimelineEvent>,
    pub affected_account_ids: FxHashSet<AccountId>,
    pub cache_key: String,
    pub cached: bool,
}

/// Milliseconds since the Unix epoch for a civil date at midnight UTC — the
/// same epoch-millis convention the cache key and auto-transfer activity
/// ids (`AUTO-PULL_{accountId}_{segmentStartMillis}`) both use (spec.md
/// §3, §6).
#[must_use]
pub fn epoch_millis(date: Date) -> i64 {
    crate::date_math::fast_days_between(jiff::civil::date(1970, 1, 1), date) as i64 * 86_400_000
}

/// `SHA256(eventCount ‖ sortedEventMinDate ‖ sortedEventMaxDate ‖
/// joined(type ‖ "_" ‖ epochMillis ‖ "_" ‖ accountId))` truncated to 16 hex
/// chars, prefixed with the event count and date range (spec.md §4.7).
#[must_use]
pub fn compute_cache_key(events: &[TimelineEvent]) -> String {
    let count = events.len();
    let min_date = events.iter().map(|e| e.date).min();
    let max_date = events.iter().map(|e| e.date).max();

    let mut hasher = Sha256::new();
    hasher.update(count.to_le_bytes());
    if let Some(d) = min_date {
        hasher.update(epoch_millis(d).to_le_bytes());
    }
    if let Some(d) = max_date {
        hasher.update(epoch_millis(d).to_le_bytes());
    }
    for event in events {
        let tag = format!(
            "{:?}_{}_{}",
            event.event_type,
            epoch_millis(event.date),
            event.account_id.0
        );
        hasher.update(tag.as_bytes());
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    let truncated = &hex[..16.min(hex.len())];

    let range = match (min_date, max_date) {
        (Some(a), Some(b)) => format!("{a}_{b}"),
        _ => "empty".to_string(),
    };
    format!("{count}_{range}_{truncated}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventPayload, EventType, EventId};

    fn event(id: u64, date: Date, account: AccountId, ty: EventType) -> TimelineEvent {
        TimelineEvent {
            id: EventId(id),
            event_type: ty,
            date,
            account_id: account,
            payload: EventPayload::Tax,
        }
    }

    #[test]
    fn cache_key_is_deterministic() {
        let events = vec![
            event(1, jiff::civil::date(2025, 1, 1), AccountId(1), EventType::Tax),
            event(2, jiff::civil::date(2025, 1, 15), AccountId(2), EventType::Activity),
        ];
        let a = compute_cache_key(&events);
        let b = compute_cache_key(&events);
        assert_eq!(a, b);
    }

    #[test]
    fn cache_key_changes_with_events() {
        let a = compute_cache_key(&[event(1, jiff::civil::date(2025, 1, 1), AccountId(1), EventType::Tax)]);
        let b = compute_cache_key(&[event(1, jiff::civil::date(2025, 1, 2), AccountId(1), EventType::Tax)]);
        assert_ne!(a, b);
    }
}
