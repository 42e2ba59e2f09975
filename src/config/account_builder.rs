//! Account Builder DSL
//!
//! A fluent API for assembling an account, mirroring the teacher's preset
//! constructor + chained-setter shape (`AccountBuilder::taxable_brokerage(..)
//! .cash(..)`), generalized to this crate's account types and push/pull
//! configuration (spec.md §3).
//!
//! Cross-account references (push destination, interest-pay routing, RMD
//! routing) are recorded by name here and resolved to `AccountId`s by
//! [`super::builder::EngineConfigBuilder`], which assigns every account's id
//! and can see the whole account set.
//!
//! # Examples
//!
//! ```ignore
//! use projection_engine::config::AccountBuilder;
//!
//! let checking = AccountBuilder::checking("Checking")
//!     .balance(5_000.0)
//!     .performs_pulls(true)
//!     .minimum_balance(1_000.0);
//! ```

use jiff::civil::Date;

use crate::model::{Account, AccountType, Activity, Bill, Interest};

/// Builder for one account, deferring cross-account name resolution to
/// [`super::builder::EngineConfigBuilder::build`].
#[derive(Debug, Clone)]
pub struct AccountBuilder {
    pub(crate) name: String,
    account_type: AccountType,
    balance: f64,
    activities: Vec<Activity>,
    bills: Vec<Bill>,
    interest: Vec<Interest>,
    hidden: bool,
    pull_priority: i32,
    interest_tax_rate: f64,
    withdrawal_tax_rate: f64,
    early_withdrawl_penalty: f64,
    early_withdrawl_date: Option<Date>,
    pub(crate) interest_pay_account: Option<String>,
    uses_rmd: bool,
    account_owner_dob: Option<Date>,
    pub(crate) rmd_account: Option<String>,
    minimum_balance: Option<f64>,
    minimum_pull_amount: Option<f64>,
    performs_pulls: bool,
    performs_pushes: bool,
    push_start: Option<Date>,
    push_end: Option<Date>,
    pub(crate) push_account: Option<String>,
}

impl AccountBuilder {
    fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            name: name.into(),
            account_type,
            balance: 0.0,
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

    // === Preset type constructors ===

    #[must_use]
    pub fn checking(name: impl Into<String>) -> Self {
        Self::new(name, AccountType::Checking)
    }

    #[must_use]
    pub fn savings(name: impl Into<String>) -> Self {
        Self::new(name, AccountType::Savings)
    }

    #[must_use]
    pub fn investment(name: impl Into<String>) -> Self {
        Self::new(name, AccountType::Investment)
    }

    #[must_use]
    pub fn credit(name: impl Into<String>) -> Self {
        Self::new(name, AccountType::Credit)
    }

    #[must_use]
    pub fn loan(name: impl Into<String>) -> Self {
        Self::new(name, AccountType::Loan)
    }

    #[must_use]
    pub fn retirement(name: impl Into<String>) -> Self {
        Self::new(name, AccountType::Retirement)
    }

    // === Chained setters ===

    #[must_use]
    pub fn balance(mut self, balance: f64) -> Self {
        self.balance = balance;
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    #[must_use]
    pub fn pull_priority(mut self, priority: i32) -> Self {
        self.pull_priority = priority;
        self
    }

    #[must_use]
    pub fn interest_tax_rate(mut self, rate: f64) -> Self {
        self.interest_tax_rate = rate;
        self
    }

    #[must_use]
    pub fn withdrawal_tax_rate(mut self, rate: f64) -> Self {
        self.withdrawal_tax_rate = rate;
        self
    }

    #[must_use]
    pub fn early_withdrawl(mut self, penalty: f64, before: Date) -> Self {
        self.early_withdrawl_penalty = penalty;
        self.early_withdrawl_date = Some(before);
        self
    }

    /// Route taxable-interest tax outflows this account originates to
    /// `account`'s tax event (spec.md §4.3 "tax").
    #[must_use]
    pub fn interest_pay_account(mut self, account: impl Into<String>) -> Self {
        self.interest_pay_account = Some(account.into());
        self
    }

    #[must_use]
    pub fn rmd(mut self, owner_dob: Date, rmd_account: impl Into<String>) -> Self {
        self.uses_rmd = true;
        self.account_owner_dob = Some(owner_dob);
        self.rmd_account = Some(rmd_account.into());
        self
    }

    #[must_use]
    pub fn minimum_balance(mut self, amount: f64) -> Self {
        self.minimum_balance = Some(amount);
        self
    }

    #[must_use]
    pub fn minimum_pull_amount(mut self, amount: f64) -> Self {
        self.minimum_pull_amount = Some(amount);
        self
    }

    #[must_use]
    pub fn performs_pulls(mut self, performs_pulls: bool) -> Self {
        self.performs_pulls = performs_pulls;
        self
    }

    /// Enables pushing surplus to `push_account` once this account's
    /// segment-minimum balance exceeds `minimumBalance + 4 * minimumPullAmount`
    /// (spec.md §4.4).
    #[must_use]
    pub fn performs_pushes(mut self, push_account: impl Into<String>) -> Self {
        self.performs_pushes = true;
        self.push_account = Some(push_account.into());
        self
    }

    #[must_use]
    pub fn push_window(mut self, start: Option<Date>, end: Option<Date>) -> Self {
        self.push_start = start;
        self.push_end = end;
        self
    }

    #[must_use]
    pub fn activity(mut self, activity: Activity) -> Self {
        self.activities.push(activity);
        self
    }

    #[must_use]
    pub fn bill(mut self, bill: Bill) -> Self {
        self.bills.push(bill);
        self
    }

    #[must_use]
    pub fn interest(mut self, interest: Interest) -> Self {
        self.interest.push(interest);
        self
    }

    /// Assemble the `Account`. Cross-account name references are left
    /// unresolved here (spec.md §3); `EngineConfigBuilder::build` resolves
    /// them against the full account set once every id is known.
    pub(crate) fn into_account(self, id: crate::model::AccountId) -> Account {
        let mut account = Account::new(id, self.name, self.account_type, self.balance);
        account.activities = self.activities;
        account.bills = self.bills;
        account.interest = self.interest;
        account.sort_interest();
        account.hidden = self.hidden;
        account.pull_priority = self.pull_priority;
        account.interest_tax_rate = self.interest_tax_rate;
        account.withdrawal_tax_rate = self.withdrawal_tax_rate;
        account.early_withdrawl_penalty = self.early_withdrawl_penalty;
        account.early_withdrawl_date = self.early_withdrawl_date;
        account.uses_rmd = self.uses_rmd;
        account.account_owner_dob = self.account_owner_dob;
        account.minimum_balance = self.minimum_balance;
        account.minimum_pull_amount = self.minimum_pull_amount;
        account.performs_pulls = self.performs_pulls;
        account.performs_pushes = self.performs_pushes;
        account.push_start = self.push_start;
        account.push_end = self.push_end;
        account
    }
}
