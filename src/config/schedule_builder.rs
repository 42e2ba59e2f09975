//! Schedule Builder DSL: fluent construction of the declarative
//! `Activity`/`Bill`/`Interest` schedule entries an account owns
//! (spec.md §3), in the teacher's chained-setter style.
//!
//! Unlike [`super::account_builder::AccountBuilder`], transfer endpoints
//! here are plain account-name strings carried straight onto `Activity`/
//! `Bill`'s `fro`/`to` fields — the Event Generator already resolves those
//! by name at generation time (spec.md §4.1), so no id-assignment pass is
//! needed for schedules.

use jiff::civil::Date;

use crate::date_math::Period;
use crate::model::{
    Activity, ActivityId, AmountSpec, Bill, BillId, CategoryId, DateSpec, Interest, InterestId,
    SymbolicAmount,
};

/// Builder for a one-off (or variable-dated) `Activity`.
#[derive(Debug, Clone)]
pub struct ActivityBuilder {
    name: String,
    category: String,
    date: DateSpec,
    amount: AmountSpec,
    is_transfer: bool,
    fro: Option<String>,
    to: Option<String>,
    spending_category: Option<CategoryId>,
    flag: bool,
    flag_color: Option<String>,
}

impl ActivityBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>, amount: f64, date: Date) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            date: DateSpec::Fixed(date),
            amount: AmountSpec::Fixed(amount),
            is_transfer: false,
            fro: None,
            to: None,
            spending_category: None,
            flag: false,
            flag_color: None,
        }
    }

    #[must_use]
    pub fn variable_amount(mut self, variable_name: impl Into<String>) -> Self {
        self.amount = AmountSpec::Variable(variable_name.into());
        self
    }

    #[must_use]
    pub fn symbolic_amount(mut self, amount: SymbolicAmount) -> Self {
        self.amount = AmountSpec::Symbolic(amount);
        self
    }

    #[must_use]
    pub fn variable_date(mut self, variable_name: impl Into<String>) -> Self {
        self.date = DateSpec::Variable(variable_name.into());
        self
    }

    /// Marks this as a transfer between `from` and `to` account names
    /// (spec.md §3 invariant: a transfer activity must carry both).
    #[must_use]
    pub fn transfer(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.is_transfer = true;
        self.fro = Some(from.into());
        self.to = Some(to.into());
        self
    }

    #[must_use]
    pub fn spending_category(mut self, category: CategoryId) -> Self {
        self.spending_category = Some(category);
        self
    }

    #[must_use]
    pub fn flagged(mut self, color: impl Into<String>) -> Self {
        self.flag = true;
        self.flag_color = Some(color.into());
        self
    }

    #[must_use]
    pub fn build(self, id: ActivityId) -> Activity {
        Activity {
            id,
            name: self.name,
            date: self.date,
            category: self.category,
            amount: self.amount,
            is_transfer: self.is_transfer,
            fro: self.fro,
            to: self.to,
            spending_category: self.spending_category,
            flag: self.flag,
            flag_color: self.flag_color,
        }
    }
}

/// Builder for a recurring `Bill`.
#[derive(Debug, Clone)]
pub struct BillBuilder {
    name: String,
    category: String,
    start_date: Date,
    end_date: Option<Date>,
    periods: Period,
    every_n: u32,
    amount: AmountSpec,
    increase_by: f64,
    increase_by_date: Date,
    ceiling_multiple: Option<f64>,
    monte_carlo_sample_type: Option<String>,
    is_transfer: bool,
    fro: Option<String>,
    to: Option<String>,
    spending_category: Option<CategoryId>,
    flag: bool,
    flag_color: Option<String>,
}

impl BillBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>, category: impl Into<String>, amount: f64, start_date: Date, periods: Period) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            start_date,
            end_date: None,
            periods,
            every_n: 1,
            amount: AmountSpec::Fixed(amount),
            increase_by: 0.0,
            increase_by_date: start_date,
            ceiling_multiple: None,
            monte_carlo_sample_type: None,
            is_transfer: false,
            fro: None,
            to: None,
            spending_category: None,
            flag: false,
            flag_color: None,
        }
    }

    #[must_use]
    pub fn every(mut self, n: u32) -> Self {
        self.every_n = n.max(1);
        self
    }

    #[must_use]
    pub fn ending(mut self, end_date: Date) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Annual inflation `rate` applied at each anniversary of
    /// `anchor_date`, optionally rounded up to `ceiling_multiple`
    /// (spec.md §4.1 "Bill amount resolution").
    #[must_use]
    pub fn inflation(mut self, rate: f64, anchor_date: Date, ceiling_multiple: Option<f64>) -> Self {
        self.increase_by = rate;
        self.increase_by_date = anchor_date;
        self.ceiling_multiple = ceiling_multiple;
        self
    }

    /// Redirects amount resolution to a Monte Carlo sample type; mutually
    /// exclusive with ceiling-rounded deterministic inflation (spec.md
    /// §4.1).
    #[must_use]
    pub fn monte_carlo(mut self, sample_type: impl Into<String>) -> Self {
        self.monte_carlo_sample_type = Some(sample_type.into());
        self
    }

    #[must_use]
    pub fn transfer(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.is_transfer = true;
        self.fro = Some(from.into());
        self.to = Some(to.into());
        self
    }

    #[must_use]
    pub fn spending_category(mut self, category: CategoryId) -> Self {
        self.spending_category = Some(category);
        self
    }

    #[must_use]
    pub fn flagged(mut self, color: impl Into<String>) -> Self {
        self.flag = true;
        self.flag_color = Some(color.into());
        self
    }

    #[must_use]
    pub fn build(self, id: BillId) -> Bill {
        Bill {
            id,
            name: self.name,
            category: self.category,
            start_date: self.start_date,
            end_date: self.end_date,
            periods: self.periods,
            every_n: self.every_n,
            amount: self.amount,
            increase_by: self.increase_by,
            increase_by_date: self.increase_by_date,
            ceiling_multiple: self.ceiling_multiple,
            monte_carlo_sample_type: self.monte_carlo_sample_type,
            is_transfer: self.is_transfer,
            fro: self.fro,
            to: self.to,
            spending_category: self.spending_category,
            flag: self.flag,
            flag_color: self.flag_color,
        }
    }
}

/// Builder for an `Interest` schedule entry.
#[derive(Debug, Clone)]
pub struct InterestBuilder {
    applicable_date: Date,
    apr: f64,
    compounded: Period,
    apr_variable: Option<String>,
    monte_carlo_sample_type: Option<String>,
}

impl InterestBuilder {
    #[must_use]
    pub fn new(applicable_date: Date, apr: f64, compounded: Period) -> Self {
        Self { applicable_date, apr, compounded, apr_variable: None, monte_carlo_sample_type: None }
    }

    #[must_use]
    pub fn variable_apr(mut self, variable_name: impl Into<String>) -> Self {
        self.apr_variable = Some(variable_name.into());
        self
    }

    #[must_use]
    pub fn monte_carlo(mut self, sample_type: impl Into<String>) -> Self {
        self.monte_carlo_sample_type = Some(sample_type.into());
        self
    }

    #[must_use]
    pub fn build(self, id: InterestId) -> Interest {
        Interest {
            id,
            applicable_date: self.applicable_date,
            apr: self.apr,
            compounded: self.compounded,
            apr_variable: self.apr_variable,
            monte_carlo_sample_type: self.monte_carlo_sample_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_builder_produces_transfer() {
        let activity = ActivityBuilder::new("Move", "Ignore.Transfer", 500.0, jiff::civil::date(2025, 3, 1))
            .transfer("Checking", "Savings")
            .build(ActivityId(1));
        assert!(activity.is_valid_transfer());
        assert_eq!(activity.fro.as_deref(), Some("Checking"));
    }

    #[test]
    fn bill_builder_applies_inflation_settings() {
        let bill = BillBuilder::new("Rent", "Housing", 1500.0, jiff::civil::date(2025, 1, 1), Period::Month)
            .inflation(0.03, jiff::civil::date(2025, 1, 1), Some(50.0))
            .build(BillId(1));
        assert_eq!(bill.increase_by, 0.03);
        assert_eq!(bill.ceiling_multiple, Some(50.0));
    }
}
