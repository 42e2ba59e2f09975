//! Spending-tracker category configuration and per-category state
//! (spec.md §3, §4.5).

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, CategoryId};
use crate::date_math::Period;

/// A one-time change to a category's base threshold, optionally resetting
/// carry balance on that period end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdChange {
    pub date: Date,
    pub new_threshold: f64,
    pub reset_carry: bool,
}

/// Resolved budget configuration for one spending category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingCategory {
    pub id: CategoryId,
    pub name: String,
    /// The account a "remainder" activity debits when budget is unspent.
    pub target_account: AccountId,
    pub interval: Period,
    pub interval_start: Date,
    /// Period before which emitted events are "virtual" (spec.md §4.1/§4.5).
    pub start_date: Date,
    pub base_threshold: f64,
    pub increase_by: f64,
    pub increase_by_date: Date,
    pub threshold_changes: Vec<ThresholdChange>,
    pub carry_over: bool,
    pub carry_under: bool,
}

/// Mutable per-category budget state, with a checkpoint shadow for
/// push/pull retry semantics (spec.md §4.5, §4.7).
#[derive(Debug, Clone, Default)]
pub struct SpendingTrackerCategoryState {
    pub carry_balance: f64,
    pub period_spending: f64,
    pub last_processed_period_end: Option<Date>,
    checkpoint: Option<(f64, f64, Option<Date>)>,
}

impl SpendingTrackerCategoryState {
    pub fn checkpoint(&mut self) {
        self.checkpoint = Some((self.carry_balance, self.period_spending, self.last_processed_period_end));
    }

    pub fn restore(&mut self) {
        if let Some((carry, spending, last_end)) = self.checkpoint {
            self.carry_balance = carry;
            self.period_spending = spending;
            self.last_processed_period_end = last_end;
        }
    }
}
