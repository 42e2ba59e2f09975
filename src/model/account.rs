//! Account — identity, type tag, starting balance, and behavioral flags
//! (spec.md §3).

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::AccountId;
use super::activity::Activity;
use super::bill::Bill;
use super::interest::Interest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Checking,
    Savings,
    Investment,
    Credit,
    Loan,
    Retirement,
}

impl AccountType {
    /// Whether incoming transfers into an account of this type should be
    /// capped at the account's outstanding (negative) balance — spec.md
    /// §4.3's `activityTransfer`/`billTransfer` rule for `Loan`/`Credit`
    /// destinations.
    #[must_use]
    pub fn caps_incoming_transfer_at_balance(self) -> bool {
        matches!(self, AccountType::Loan | AccountType::Credit)
    }

    #[must_use]
    pub fn is_reserve_destination(self) -> bool {
        matches!(self, AccountType::Savings | AccountType::Investment)
    }
}

/// A personal financial account: identity, declarative schedules
/// (activities/bills/interest), and the behavioral flags that drive
/// push/pull, taxation, and RMD handling.
///
/// Accounts are immutable in shape during a projection (spec.md §3
/// lifecycle invariant) — only `balance` is ever updated, and only by the
/// Balance Tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub account_type: AccountType,
    pub starting_balance: f64,
    pub balance: f64,

    pub activities: Vec<Activity>,
    pub bills: Vec<Bill>,
    pub interest: Vec<Interest>,

    pub hidden: bool,
    /// -1 disables pulling from this account as a reserve source.
    pub pull_priority: i32,
    pub interest_tax_rate: f64,
    pub withdrawal_tax_rate: f64,
    pub early_withdrawl_penalty: f64,
    /// Spelling preserved verbatim — historical wire contract (spec.md §9).
    pub early_withdrawl_date: Option<Date>,
    /// Routes taxable-interest tax outflows originated by this account to
    /// another account's tax event.
    pub interest_pay_account: Option<AccountId>,

    pub uses_rmd: bool,
    pub account_owner_dob: Option<Date>,
    pub rmd_account: Option<AccountId>,

    pub minimum_balance: Option<f64>,
    pub minimum_pull_amount: Option<f64>,
    pub performs_pulls: bool,
    pub performs_pushes: bool,
    pub push_start: Option<Date>,
    pub push_end: Option<Date>,
    pub push_account: Option<AccountId>,
}

impl Account {
    /// Construct a bare account with a name/type/starting balance and every
    /// optional flag at its default (no push/pull, no RMD, no tax routing).
    /// Schedules and flags are set with the builder in `config::`.
    #[must_use]
    pub fn new(id: AccountId, name: impl Into<String>, account_type: AccountType, starting_balance: f64) -> Self {
        Self {
            id,
            name: name.into(),
            account_type,
            starting_balance,
            balance: starting_balance,
            activities: Vec::new(),
            bills: Vec::new(),
            interest: Vec::new(),
            hidden: false,
            pull_priority: -1,
            interest_tax_rate: 0.0,
            withdrawal_tax_rate: 0.0,
            early_withdrawl_penalty: 0.0,
            early_withdrawl_date: None,
            interest_pay_account: None,
            uses_rmd: false,
            account_owner_dob: None,
            rmd_account: None,
            minimum_balance: None,
            minimum_pull_amount: None,
            performs_pulls: false,
            performs_pushes: false,
            push_start: None,
            push_end: None,
            push_account: None,
        }
    }

    /// spec.md §3 invariant: if an account performs pulls or pushes it must
    /// have a minimum balance configured, and (for pushes) a push
    /// destination.
    #[must_use]
    pub fn has_valid_push_pull_config(&self) -> bool {
        if !self.performs_pulls && !self.performs_pushes {
            return true;
        }
        if self.minimum_balance.is_none() {
            return false;
        }
        if self.performs_pushes && self.push_account.is_none() {
            return false;
        }
        true
    }

    /// Active interest record at `today`: the latest entry whose
    /// `applicable_date <= today`, per spec.md §3. Entries are kept sorted
    /// ascending by `applicable_date` at construction time.
    #[must_use]
    pub fn active_interest_at(&self, today: Date) -> Option<&Interest> {
        self.interest
            .iter()
            .rev()
            .find(|entry| entry.applicable_date <= today)
    }

    /// Interest entries sorted ascending with no duplicate `applicable_date`
    /// — spec.md §3 invariant for `Interest`.
    pub fn sort_interest(&mut self) {
        self.interest.sort_by_key(|i| i.applicable_date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pull_requires_minimum_balance() {
        let mut account = Account::new(AccountId(1), "Checking", AccountType::Checking, 100.0);
        account.performs_pulls = true;
        assert!(!account.has_valid_push_pull_config());
        account.minimum_balance = Some(500.0);
        assert!(account.has_valid_push_pull_config());
    }

    #[test]
    fn push_requires_push_account() {
        let mut account = Account::new(AccountId(1), "Checking", AccountType::Checking, 100.0);
        account.performs_pushes = true;
        account.minimum_balance = Some(500.0);
        assert!(!account.has_valid_push_pull_config());
        account.push_account = Some(AccountId(2));
        assert!(account.has_valid_push_pull_config());
    }

    #[test]
    fn active_interest_picks_latest_applicable() {
        use super::super::interest::Interest;
        use crate::date_math::Period;
        let mut account = Account::new(AccountId(1), "Save", AccountType::Savings, 0.0);
        account.interest = vec![
            Interest {
                id: super::super::ids::InterestId(1),
                applicable_date: jiff::civil::date(2024, 1, 1),
                apr: 0.03,
                compounded: Period::Month,
                apr_variable: None,
                monte_carlo_sample_type: None,
            },
            Interest {
                id: super::super::ids::InterestId(2),
                applicable_date: jiff::civil::date(2025, 1, 1),
                apr: 0.05,
                compounded: Period::Month,
                apr_variable: None,
                monte_carlo_sample_type: None,
            },
        ];
        let active = account.active_interest_at(jiff::civil::date(2024, 6, 1)).unwrap();
        assert_eq!(active.apr, 0.03);
        let active = account.active_interest_at(jiff::civil::date(2025, 6, 1)).unwrap();
        assert_eq!(active.apr, 0.05);
        assert!(account.active_interest_at(jiff::civil::date(2023, 1, 1)).is_none());
    }
}
