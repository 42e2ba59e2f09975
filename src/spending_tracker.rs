//! Spending Tracker Manager (spec.md §4.5): per-category threshold/carry
//! arithmetic layered over `model::spending`'s plain config/state types.

use jiff::civil::Date;
use rustc_hash::FxHashMap;

use crate::date_math;
use crate::model::{CategoryId, SpendingCategory, SpendingTrackerCategoryState};

/// The values the Segment Processor needs at a spending-tracker event
/// (spec.md §4.3, §4.5).
#[derive(Debug, Clone, Copy)]
pub struct SpendingSnapshot {
    pub effective_threshold: f64,
    pub total_spent: f64,
    pub remainder: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SpendingTrackerManager {
    state: FxHashMap<CategoryId, SpendingTrackerCategoryState>,
}

impl SpendingTrackerManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self, category: CategoryId) -> &mut SpendingTrackerCategoryState {
        self.state.entry(category).or_default()
    }

    #[must_use]
    pub fn state(&self, category: CategoryId) -> SpendingTrackerCategoryState {
        self.state.get(&category).cloned().unwrap_or_default()
    }

    /// Base threshold at `d`: the last `thresholdChanges` entry with
    /// `date <= d` (else the configured base), compounded by
    /// `(1 + increaseBy)` once per anniversary of `increaseByDate` strictly
    /// after the reference date and on-or-before `d` (spec.md §4.5
    /// "Threshold at date").
    #[must_use]
    pub fn base_threshold_at(category: &SpendingCategory, engine_start: Date, d: Date) -> f64 {
        let applicable_change = category
            .threshold_changes
            .iter()
            .filter(|c| c.date <= d)
            .max_by_key(|c| c.date);

        let (base, reference_date) = match applicable_change {
            Some(change) => (change.new_threshold, change.date),
            None => (category.base_threshold, engine_start),
        };

        if category.increase_by == 0.0 {
            return base;
        }
        let milestones = date_math::count_anniversaries(category.increase_by_date, reference_date, d);
        base * (1.0 + category.increase_by).powi(milestones as i32)
    }

    /// Effective threshold = `max(0, baseThreshold(d) + carryBalance)`
    /// (spec.md §4.5).
    #[must_use]
    pub fn effective_threshold(&self, category: &SpendingCategory, engine_start: Date, d: Date) -> f64 {
        let base = Self::base_threshold_at(category, engine_start, d);
        let carry = self.state(category.id).carry_balance;
        (base + carry).max(0.0)
    }

    /// `(effectiveThreshold, totalSpent, remainder)` at `d` (spec.md §4.3,
    /// §4.5).
    #[must_use]
    pub fn snapshot(&self, category: &SpendingCategory, engine_start: Date, d: Date) -> SpendingSnapshot {
        let effective_threshold = self.effective_threshold(category, engine_start, d);
        let total_spent = self.state(category.id).period_spending;
        let remainder = (effective_threshold - total_spent).max(0.0);
        SpendingSnapshot { effective_threshold, total_spent, remainder }
    }

    /// Accumulate a signed activity amount into `periodSpending`: expenses
    /// (negative amounts) increase spending, refunds (positive) decrease it
    /// (spec.md §4.5). Only activities strictly after
    /// `lastProcessedPeriodEnd` are accumulated, to prevent double counting
    /// across segment boundaries (spec.md §4.3).
    pub fn record_activity(&mut self, category: CategoryId, activity_date: Date, signed_amount: f64) {
        let state = self.state_mut(category);
        if let Some(last_end) = state.last_processed_period_end {
            if activity_date <= last_end {
                return;
            }
        }
        state.period_spending -= signed_amount;
    }

    /// Update carry at period end: `new = carry + (baseThreshold -
    /// totalSpent)`, clamped to zero unless `carryOver`/`carryUnder` permit
    /// it to persist; a matching `resetCarry` threshold change forces carry
    /// to zero regardless (spec.md §4.5).
    ///
    /// Callers (the Segment Processor) must emit the period's remainder
    /// activity — and feed it back through `record_activity` — *before*
    /// calling this, so `totalSpent` already reflects it: that ordering is
    /// what makes a positive carry-over surplus collapse to zero on paper,
    /// per the §4.5 "positive carry never persists" invariant, without this
    /// method needing a special case for it.
    pub fn update_carry(&mut self, category: &SpendingCategory, engine_start: Date, period_end: Date) {
        let base = Self::base_threshold_at(category, engine_start, period_end);
        let state = self.state_mut(category.id);
        let mut new_carry = state.carry_balance + (base - state.period_spending);
        if new_carry > 0.0 && !category.carry_over {
            new_carry = 0.0;
        }
        if new_carry < 0.0 && !category.carry_under {
            new_carry = 0.0;
        }
        if category.threshold_changes.iter().any(|c| c.date == period_end && c.reset_carry) {
            new_carry = 0.0;
        }
        state.carry_balance = new_carry;
    }

    pub fn reset_period_spending(&mut self, category: CategoryId) {
        self.state_mut(category).period_spending = 0.0;
    }

    pub fn mark_period_processed(&mut self, category: CategoryId, period_end: Date) {
        self.state_mut(category).last_processed_period_end = Some(period_end);
    }

    pub fn checkpoint(&mut self, category: CategoryId) {
        self.state_mut(category).checkpoint();
    }

    pub fn restore(&mut self, category: CategoryId) {
        self.state_mut(category).restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_math::Period;

    fn category() -> SpendingCategory {
        SpendingCategory {
            id: CategoryId(1),
            name: "Groceries".into(),
            target_account: crate::model::AccountId(1),
            interval: Period::Month,
            interval_start: jiff::civil::date(2025, 1, 1),
            start_date: jiff::civil::date(2025, 1, 1),
            base_threshold: 500.0,
            increase_by: 0.0,
            increase_by_date: jiff::civil::date(2025, 1, 1),
            threshold_changes: Vec::new(),
            carry_over: true,
            carry_under: true,
        }
    }

    #[test]
    fn remainder_emitted_when_underspent() {
        let mut mgr = SpendingTrackerManager::new();
        let cat = category();
        mgr.record_activity(cat.id, jiff::civil::date(2025, 1, 10), -300.0);
        let snap = mgr.snapshot(&cat, jiff::civil::date(2025, 1, 1), jiff::civil::date(2025, 1, 31));
        assert_eq!(snap.total_spent, 300.0);
        assert_eq!(snap.remainder, 200.0);
    }

    #[test]
    fn positive_carry_never_persists_once_remainder_is_recorded() {
        let mut mgr = SpendingTrackerManager::new();
        let cat = category();
        mgr.record_activity(cat.id, jiff::civil::date(2025, 1, 10), -300.0);
        // Segment Processor emits a 200.0 remainder activity before
        // updating carry, consuming the surplus on paper.
        mgr.record_activity(cat.id, jiff::civil::date(2025, 1, 31), -200.0);
        mgr.update_carry(&cat, jiff::civil::date(2025, 1, 1), jiff::civil::date(2025, 1, 31));
        assert_eq!(mgr.state(cat.id).carry_balance, 0.0);
    }

    #[test]
    fn positive_carry_persists_without_remainder_when_carry_over() {
        let mut mgr = SpendingTrackerManager::new();
        let cat = category();
        mgr.record_activity(cat.id, jiff::civil::date(2025, 1, 10), -300.0);
        mgr.update_carry(&cat, jiff::civil::date(2025, 1, 1), jiff::civil::date(2025, 1, 31));
        assert_eq!(mgr.state(cat.id).carry_balance, 200.0);
    }

    #[test]
    fn negative_carry_persists_with_carry_under() {
        let mut mgr = SpendingTrackerManager::new();
        let cat = category();
        mgr.record_activity(cat.id, jiff::civil::date(2025, 1, 10), -700.0);
        mgr.update_carry(&cat, jiff::civil::date(2025, 1, 1), jiff::civil::date(2025, 1, 31));
        assert_eq!(mgr.state(cat.id).carry_balance, -200.0);
    }
}
