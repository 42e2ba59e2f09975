//! Balance Tracker (spec.md §4.2): per-account balances, interest state,
//! segment min/max day-end tracking, and a checkpoint/restore snapshot used
//! by the Push/Pull Handler's bounded reprocess (spec.md §4.4, §4.7).

use jiff::civil::Date;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::model::{AccountId, EventId, InterestId, SegmentId};

/// Active-interest bookkeeping for one account (spec.md §4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InterestState {
    pub active_interest_id: Option<InterestId>,
    pub next_apply_date: Option<Date>,
}

/// Day-end balance range observed for one account within the current
/// segment.
#[derive(Debug, Clone, Copy)]
pub struct BalanceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone)]
struct Snapshot {
    balances: FxHashMap<AccountId, f64>,
    interest_states: FxHashMap<AccountId, InterestState>,
    processed_events: FxHashSet<EventId>,
    activity_lengths: FxHashMap<AccountId, usize>,
}

/// Maintains `accountId -> balance`, `accountId -> InterestState`,
/// per-segment min/max of day-end balances, and a processed-event set for
/// idempotency (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct BalanceTracker {
    balances: FxHashMap<AccountId, f64>,
    interest_states: FxHashMap<AccountId, InterestState>,
    segment_ranges: FxHashMap<AccountId, BalanceRange>,
    /// The open day's `(date, balance)` for each account not yet folded
    /// into `segment_ranges` — folded in once a later mutation lands on a
    /// different date, or at `get_range` time (spec.md §4.2 "day-end").
    day_end_cursor: FxHashMap<AccountId, (Date, f64)>,
    processed_events: FxHashSet<EventId>,
    /// Per-account length of the consolidated-activity list, used to
    /// restore accounts' activity logs on checkpoint rollback.
    activity_lengths: FxHashMap<AccountId, usize>,
    snapshots: FxHashMap<SegmentId, Snapshot>,
}

impl BalanceTracker {
    #[must_use]
    pub fn new(starting_balances: impl IntoIterator<Item = (AccountId, f64)>) -> Self {
        Self {
            balances: starting_balances.into_iter().collect(),
            interest_states: FxHashMap::default(),
            segment_ranges: FxHashMap::default(),
            day_end_cursor: FxHashMap::default(),
            processed_events: FxHashSet::default(),
            activity_lengths: FxHashMap::default(),
            snapshots: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn get_balance(&self, account: AccountId) -> f64 {
        self.balances.get(&account).copied().unwrap_or(0.0)
    }

    pub fn set_balance(&mut self, account: AccountId, date: Date, balance: f64) {
        self.balances.insert(account, balance);
        self.track_range(account, date, balance);
    }

    pub fn adjust_balance(&mut self, account: AccountId, date: Date, delta: f64) -> f64 {
        let new_balance = self.get_balance(account) + delta;
        self.set_balance(account, date, new_balance);
        new_balance
    }

    /// Records `balance` as `account`'s running value on `date`. Only the
    /// last value written for a given date is ever folded into the
    /// segment's min/max — intra-day mutations that dip and recover are
    /// invisible to the range, matching spec.md §4.2/§4.4's "day-end
    /// balance" (not "balance after every event").
    fn track_range(&mut self, account: AccountId, date: Date, balance: f64) {
        match self.day_end_cursor.get(&account).copied() {
            Some((cursor_date, _)) if cursor_date == date => {
                self.day_end_cursor.insert(account, (date, balance));
            }
            Some((_, last_day_end)) => {
                self.fold_into_range(account, last_day_end);
                self.day_end_cursor.insert(account, (date, balance));
            }
            None => {
                self.day_end_cursor.insert(account, (date, balance));
            }
        }
    }

    fn fold_into_range(&mut self, account: AccountId, balance: f64) {
        self.segment_ranges
            .entry(account)
            .and_modify(|r| {
                r.min = r.min.min(balance);
                r.max = r.max.max(balance);
            })
            .or_insert(BalanceRange { min: balance, max: balance });
    }

    /// The segment's observed min/max day-end balance range for `account`,
    /// used by the Push/Pull Handler (spec.md §4.4). Folds in the
    /// not-yet-closed day's value, since by the time a segment finishes
    /// processing there are no further events to revise it.
    #[must_use]
    pub fn get_range(&self, account: AccountId) -> Option<BalanceRange> {
        let base = self.segment_ranges.get(&account).copied();
        let Some(&(_, pending)) = self.day_end_cursor.get(&account) else { return base };
        Some(match base {
            Some(r) => BalanceRange { min: r.min.min(pending), max: r.max.max(pending) },
            None => BalanceRange { min: pending, max: pending },
        })
    }

    /// Seeds each account's range with its balance as carried into this
    /// segment — the day-end value that every day up to the first event
    /// in the segment shares (spec.md §4.2).
    pub fn reset_segment_ranges(&mut self) {
        self.segment_ranges.clear();
        self.day_end_cursor.clear();
        for (&account, &balance) in &self.balances {
            self.segment_ranges.insert(account, BalanceRange { min: balance, max: balance });
        }
    }

    #[must_use]
    pub fn interest_state(&self, account: AccountId) -> InterestState {
        self.interest_states.get(&account).cloned().unwrap_or_default()
    }

    pub fn set_interest_state(&mut self, account: AccountId, state: InterestState) {
        self.interest_states.insert(account, state);
    }

    /// Every account's current balance, for finalization and the result
    /// cache's ending-balance snapshot (spec.md §4.7, §4.8).
    #[must_use]
    pub fn balances(&self) -> &FxHashMap<AccountId, f64> {
        &self.balances
    }

    #[must_use]
    pub fn has_processed(&self, event: EventId) -> bool {
        self.processed_events.contains(&event)
    }

    pub fn mark_processed(&mut self, event: EventId) {
        self.processed_events.insert(event);
    }

    pub fn record_activity_length(&mut self, account: AccountId, length: usize) {
        self.activity_lengths.insert(account, length);
    }

    #[must_use]
    pub fn activity_length(&self, account: AccountId) -> usize {
        self.activity_lengths.get(&account).copied().unwrap_or(0)
    }

    /// Snapshot `(balances, interest states, processed-event set,
    /// per-account activity lengths)` keyed by segment id, for the
    /// Push/Pull Handler's checkpoint/restore (spec.md §4.2, §4.7).
    pub fn checkpoint(&mut self, segment: SegmentId) {
        self.snapshots.insert(
            segment,
            Snapshot {
                balances: self.balances.clone(),
                interest_states: self.interest_states.clone(),
                processed_events: self.processed_events.clone(),
                activity_lengths: self.activity_lengths.clone(),
            },
        );
    }

    /// Revert to the checkpoint taken for `segment`, reverting balances,
    /// interest state, and the processed-event set (spec.md §4.2).
    pub fn restore(&mut self, segment: SegmentId) {
        if let Some(snapshot) = self.snapshots.get(&segment) {
            self.balances = snapshot.balances.clone();
            self.interest_states = snapshot.interest_states.clone();
            self.processed_events = snapshot.processed_events.clone();
            self.activity_lengths = snapshot.activity_lengths.clone();
            self.reset_segment_ranges();
        }
    }

    pub fn discard_checkpoint(&mut self, segment: SegmentId) {
        self.snapshots.remove(&segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_balance_tracks_day_end_min_max_across_distinct_days() {
        let mut tracker = BalanceTracker::new([(AccountId(1), 100.0)]);
        tracker.reset_segment_ranges();
        tracker.adjust_balance(AccountId(1), jiff::civil::date(2025, 1, 10), -50.0);
        tracker.adjust_balance(AccountId(1), jiff::civil::date(2025, 1, 20), 200.0);
        let range = tracker.get_range(AccountId(1)).unwrap();
        assert_eq!(range.min, 50.0);
        assert_eq!(range.max, 250.0);
    }

    #[test]
    fn intra_day_dip_does_not_affect_range() {
        // Dips to 50 then recovers to 250, all on the same day: the range
        // should only ever see the day-end value (250), not the transient
        // 50 (spec.md §4.2 "day-end balances", §4.4 "min_daily_balance").
        let mut tracker = BalanceTracker::new([(AccountId(1), 100.0)]);
        tracker.reset_segment_ranges();
        let day = jiff::civil::date(2025, 1, 15);
        tracker.adjust_balance(AccountId(1), day, -50.0);
        tracker.adjust_balance(AccountId(1), day, 200.0);
        let range = tracker.get_range(AccountId(1)).unwrap();
        assert_eq!(range.min, 100.0);
        assert_eq!(range.max, 250.0);
    }

    #[test]
    fn checkpoint_restore_round_trips_balance() {
        let mut tracker = BalanceTracker::new([(AccountId(1), 100.0)]);
        tracker.checkpoint(SegmentId(0));
        tracker.adjust_balance(AccountId(1), jiff::civil::date(2025, 1, 1), -1000.0);
        assert_eq!(tracker.get_balance(AccountId(1)), -900.0);
        tracker.restore(SegmentId(0));
        assert_eq!(tracker.get_balance(AccountId(1)), 100.0);
    }

    #[test]
    fn processed_event_idempotency() {
        let mut tracker = BalanceTracker::new([]);
        assert!(!tracker.has_processed(EventId(1)));
        tracker.mark_processed(EventId(1));
        assert!(tracker.has_processed(EventId(1)));
    }
}
