//! ConsolidatedActivity — the stable, dated, balance-annotated output
//! entity (spec.md §3, §6).

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, ActivityId, BillId, CategoryId, InterestId};

/// A concrete, dated financial event belonging to exactly one account with
/// a resolved signed amount and the running balance after it applies.
///
/// Within one account the sequence is append-only within a segment and
/// chronologically non-decreasing; `balance[k] = balance[k-1] + amount[k]`
/// (spec.md §3 invariant, §8 property 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedActivity {
    pub id: String,
    pub name: String,
    pub category: String,
    pub flag: bool,
    pub flag_color: Option<String>,
    pub is_transfer: bool,
    /// Historical spelling preserved verbatim on the wire (spec.md §6).
    pub fro: Option<String>,
    pub to: Option<String>,
    pub amount: f64,
    pub amount_is_variable: bool,
    pub amount_variable: Option<String>,
    pub date: Date,
    pub date_is_variable: bool,
    pub date_variable: Option<String>,
    pub balance: f64,
    pub bill_id: Option<BillId>,
    pub first_bill: bool,
    pub interest_id: Option<InterestId>,
    pub first_interest: bool,
    pub spending_category: Option<CategoryId>,
    pub account_id: AccountId,
    pub source_activity_id: Option<ActivityId>,
}

impl ConsolidatedActivity {
    #[must_use]
    pub fn date_string(&self) -> String {
        format!("{}", self.date)
    }
}
