//! TimelineEvent — the materialized, typed event a schedule expands into
//! (spec.md §3). Events are immutable once generated; a Monte Carlo
//! re-sample produces a new timeline via clone (spec.md §4.1, §5), never an
//! in-place mutation of a shipped event.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::activity::{AmountSpec, SymbolicAmount};
use super::ids::{AccountId, BillId, CategoryId, EventId, InterestId, PensionId, SocialSecurityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EventType {
    Activity,
    Bill,
    Interest,
    ActivityTransfer,
    BillTransfer,
    Pension,
    SocialSecurity,
    Tax,
    Rmd,
    SpendingTracker,
}

impl EventType {
    /// Same-date priority, ascending (spec.md §3 "Priority ordering"):
    /// `0 interest -> 1 activity & activityTransfer -> 2 bill & billTransfer
    /// & pension & socialSecurity -> 2.5 spendingTracker -> 3 rmd & tax`.
    #[must_use]
    pub fn priority(self) -> f64 {
        match self {
            EventType::Interest => 0.0,
            EventType::Activity | EventType::ActivityTransfer => 1.0,
            EventType::Bill | EventType::BillTransfer | EventType::Pension | EventType::SocialSecurity => 2.0,
            EventType::SpendingTracker => 2.5,
            EventType::Rmd | EventType::Tax => 3.0,
        }
    }
}

/// Type-specific event payload. Events dispatch on this tag in the Segment
/// Processor (spec.md §9 "Polymorphism": a tagged variant, not a class
/// hierarchy; each variant has exactly one canonical handler).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Activity {
        name: String,
        category: String,
        amount: AmountSpec,
        spending_category: Option<CategoryId>,
        flag: bool,
        flag_color: Option<String>,
    },
    ActivityTransfer {
        name: String,
        category: String,
        amount: AmountSpec,
        from_account_id: Option<AccountId>,
        to_account_id: Option<AccountId>,
        flag: bool,
        flag_color: Option<String>,
    },
    Bill {
        bill_id: BillId,
        name: String,
        category: String,
        /// Ceiling/inflation- or Monte-Carlo-resolved amount. Ignored in
        /// favor of `symbolic` when that field is set (spec.md §4.1
        /// "Symbolic amounts pass through unchanged").
        resolved_amount: f64,
        symbolic: Option<SymbolicAmount>,
        first_bill: bool,
        spending_category: Option<CategoryId>,
        flag: bool,
        flag_color: Option<String>,
    },
    BillTransfer {
        bill_id: BillId,
        name: String,
        category: String,
        resolved_amount: f64,
        symbolic: Option<SymbolicAmount>,
        first_bill: bool,
        from_account_id: Option<AccountId>,
        to_account_id: Option<AccountId>,
        flag: bool,
        flag_color: Option<String>,
    },
    Interest {
        interest_id: InterestId,
        rate: f64,
        first_interest: bool,
    },
    Pension {
        pension_id: PensionId,
        owner_age: i32,
        first_payment: bool,
    },
    SocialSecurity {
        social_security_id: SocialSecurityId,
        owner_age: i32,
        first_payment: bool,
    },
    Rmd {
        rmd_account_id: AccountId,
    },
    Tax,
    SpendingTracker {
        category_id: CategoryId,
        period_start: Date,
        period_end: Date,
        first_spending_tracker: bool,
        /// Periods ending before the category's configured `start_date`:
        /// state updates without emitting activities (spec.md §4.1, §4.5,
        /// §9 open question).
        virtual_event: bool,
    },
}

/// A fully materialized, typed point on the timeline. `account_id` is the
/// primary owning participant; transfer variants additionally carry
/// `from_account_id`/`to_account_id` in their payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: EventId,
    pub event_type: EventType,
    pub date: Date,
    pub account_id: AccountId,
    pub payload: EventPayload,
}

impl TimelineEvent {
    #[must_use]
    pub fn priority(&self) -> f64 {
        self.event_type.priority()
    }
}
