//! Engine Config Builder
//!
//! Assembles a set of [`AccountBuilder`]s and spending-category definitions
//! into the `AccountManager` + `SpendingCategory` list the engine needs,
//! assigning every id and resolving cross-account name references (push
//! destination, interest-pay routing, RMD routing) the way the teacher's
//! `SimulationBuilder` assigns ids and resolves asset/account names
//! (spec.md §3, §6).
//!
//! # Example
//!
//! ```ignore
//! use projection_engine::config::{AccountBuilder, EngineConfigBuilder};
//!
//! let (accounts, categories, metadata) = EngineConfigBuilder::new()
//!     .account(AccountBuilder::checking("Checking").balance(5_000.0))
//!     .account(AccountBuilder::savings("Savings").balance(20_000.0))
//!     .build();
//! ```

use crate::account_manager::AccountManager;
use crate::model::{AccountId, CategoryId, Pension, SocialSecurity, SpendingCategory};

use super::account_builder::AccountBuilder;
use super::metadata::SimulationMetadata;

/// A spending category pending id assignment, keyed by the builder-chosen
/// name used to resolve its target account.
#[derive(Debug, Clone)]
pub struct SpendingCategoryBuilder {
    name: String,
    target_account: String,
    interval: crate::date_math::Period,
    interval_start: jiff::civil::Date,
    start_date: jiff::civil::Date,
    base_threshold: f64,
    increase_by: f64,
    increase_by_date: jiff::civil::Date,
    threshold_changes: Vec<crate::model::ThresholdChange>,
    carry_over: bool,
    carry_under: bool,
}

impl SpendingCategoryBuilder {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_account: impl Into<String>,
        interval: crate::date_math::Period,
        interval_start: jiff::civil::Date,
        base_threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            target_account: target_account.into(),
            interval,
            interval_start,
            start_date: interval_start,
            base_threshold,
            increase_by: 0.0,
            increase_by_date: interval_start,
            threshold_changes: Vec::new(),
            carry_over: false,
            carry_under: false,
        }
    }

    #[must_use]
    pub fn starting(mut self, start_date: jiff::civil::Date) -> Self {
        self.start_date = start_date;
        self
    }

    #[must_use]
    pub fn annual_increase(mut self, rate: f64, anchor_date: jiff::civil::Date) -> Self {
        self.increase_by = rate;
        self.increase_by_date = anchor_date;
        self
    }

    #[must_use]
    pub fn carry(mut self, carry_over: bool, carry_under: bool) -> Self {
        self.carry_over = carry_over;
        self.carry_under = carry_under;
        self
    }

    #[must_use]
    pub fn threshold_change(mut self, change: crate::model::ThresholdChange) -> Self {
        self.threshold_changes.push(change);
        self
    }
}

/// Builder for the engine's account set and spending-category list, with
/// automatic id assignment and name resolution (spec.md §3, §6).
#[derive(Default)]
pub struct EngineConfigBuilder {
    accounts: Vec<AccountBuilder>,
    spending_categories: Vec<SpendingCategoryBuilder>,
    pensions: Vec<Pension>,
    social_security: Vec<SocialSecurity>,
}

impl EngineConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn account(mut self, account: AccountBuilder) -> Self {
        self.accounts.push(account);
        self
    }

    #[must_use]
    pub fn spending_category(mut self, category: SpendingCategoryBuilder) -> Self {
        self.spending_categories.push(category);
        self
    }

    #[must_use]
    pub fn pension(mut self, pension: Pension) -> Self {
        self.pensions.push(pension);
        self
    }

    #[must_use]
    pub fn social_security(mut self, record: SocialSecurity) -> Self {
        self.social_security.push(record);
        self
    }

    /// Assign every account/category id in declaration order, resolve
    /// cross-account name references, and produce the `AccountManager`,
    /// `SpendingCategory` list, and name/description lookup metadata
    /// (spec.md §3 "Account" invariants: push/pull configuration requires
    /// a resolvable destination).
    #[must_use]
    pub fn build(self) -> (AccountManager, Vec<SpendingCategory>, SimulationMetadata) {
        let mut metadata = SimulationMetadata::new();
        let name_to_id: std::collections::HashMap<String, AccountId> = self
            .accounts
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), AccountId(i as u32)))
            .collect();

        let mut accounts: Vec<_> = self
            .accounts
            .into_iter()
            .enumerate()
            .map(|(i, builder)| {
                let id = AccountId(i as u32);
                metadata.register_account(id, Some(builder.name.clone()), None);
                let push_account = builder.push_account.as_ref().and_then(|n| name_to_id.get(n)).copied();
                let interest_pay_account =
                    builder.interest_pay_account.as_ref().and_then(|n| name_to_id.get(n)).copied();
                let rmd_account = builder.rmd_account.as_ref().and_then(|n| name_to_id.get(n)).copied();
                let mut account = builder.into_account(id);
                account.push_account = push_account;
                account.interest_pay_account = interest_pay_account;
                account.rmd_account = rmd_account;
                account
            })
            .collect();
        accounts.sort_by_key(|a| a.id);

        let categories: Vec<SpendingCategory> = self
            .spending_categories
            .into_iter()
            .enumerate()
            .map(|(i, builder)| {
                let id = CategoryId(i as u32);
                metadata.register_spending_category(id, Some(builder.name.clone()), None);
                let target_account = name_to_id.get(&builder.target_account).copied().unwrap_or(AccountId(0));
                SpendingCategory {
                    id,
                    name: builder.name,
                    target_account,
                    interval: builder.interval,
                    interval_start: builder.interval_start,
                    start_date: builder.start_date,
                    base_threshold: builder.base_threshold,
                    increase_by: builder.increase_by,
                    increase_by_date: builder.increase_by_date,
                    threshold_changes: builder.threshold_changes,
                    carry_over: builder.carry_over,
                    carry_under: builder.carry_under,
                }
            })
            .collect();

        let manager = AccountManager::new(accounts, self.pensions, self.social_security);
        (manager, categories, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountBuilder;

    #[test]
    fn resolves_push_account_name_to_id() {
        let (accounts, _, _) = EngineConfigBuilder::new()
            .account(AccountBuilder::checking("Checking").balance(5_000.0).performs_pushes("Savings"))
            .account(AccountBuilder::savings("Savings").balance(0.0))
            .build();
        let checking = accounts.by_name("Checking").unwrap();
        assert_eq!(checking.push_account, accounts.id_by_name("Savings"));
    }

    #[test]
    fn spending_category_resolves_target_account() {
        let (_, categories, metadata) = EngineConfigBuilder::new()
            .account(AccountBuilder::checking("Checking").balance(1_000.0))
            .spending_category(SpendingCategoryBuilder::new(
                "Groceries",
                "Checking",
                crate::date_math::Period::Month,
                jiff::civil::date(2025, 1, 1),
                500.0,
            ))
            .build();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].target_account, AccountId(0));
        assert_eq!(metadata.spending_category_id("Groceries"), Some(categories[0].id));
    }
}
