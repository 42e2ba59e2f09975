//! Account Manager (spec.md §2, §4): indexes accounts by id and name,
//! catalogs pull-eligible accounts sorted by priority, and exposes
//! retirement configs and the interest-pay account set.
//!
//! Indexed by `AccountId.0` into dense `Vec<Option<T>>`s rather than hashed,
//! the same trick the teacher applies to `SimEventState` (spec.md §1.8).
//! Immutable for the lifetime of a projection (spec.md §3 lifecycle
//! invariant) — the sorted pull-priority catalog is built once here rather
//! than re-sorted per segment.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::model::{Account, AccountId, Pension, SocialSecurity};

#[derive(Debug, Clone)]
pub struct AccountManager {
    accounts: Vec<Option<Account>>,
    name_index: FxHashMap<String, AccountId>,
    /// Accounts with `pull_priority >= 0`, sorted ascending (lowest
    /// priority selected first, per spec.md §4.4).
    pull_priority_catalog: Vec<AccountId>,
    /// Accounts that are the `interest_pay_account` target of at least one
    /// other account, or their own interest-pay target.
    interest_pay_accounts: FxHashSet<AccountId>,
    pensions: Vec<Pension>,
    social_security: Vec<SocialSecurity>,
}

impl AccountManager {
    #[must_use]
    pub fn new(accounts: Vec<Account>, pensions: Vec<Pension>, social_security: Vec<SocialSecurity>) -> Self {
        let max_id = accounts.iter().map(|a| a.id.0).max().unwrap_or(0) as usize;
        let mut dense: Vec<Option<Account>> = (0..=max_id).map(|_| None).collect();
        let mut name_index = FxHashMap::default();
        let mut interest_pay_accounts = FxHashSet::default();

        for account in accounts {
            name_index.insert(account.name.clone(), account.id);
            if let Some(target) = account.interest_pay_account {
                interest_pay_accounts.insert(target);
            }
            dense[account.id.0 as usize] = Some(account);
        }

        let mut pull_priority_catalog: Vec<AccountId> = dense
            .iter()
            .flatten()
            .filter(|a| a.pull_priority >= 0)
            .map(|a| a.id)
            .collect();
        pull_priority_catalog.sort_by_key(|id| {
            dense[id.0 as usize].as_ref().map(|a| a.pull_priority).unwrap_or(i32::MAX)
        });

        Self {
            accounts: dense,
            name_index,
            pull_priority_catalog,
            interest_pay_accounts,
            pensions,
            social_security,
        }
    }

    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(id.0 as usize).and_then(|o| o.as_ref())
    }

    #[must_use]
    pub fn get_mut(&mut self, id: AccountId) -> Option<&mut Account> {
        self.accounts.get_mut(id.0 as usize).and_then(|o| o.as_mut())
    }

    #[must_use]
    pub fn id_by_name(&self, name: &str) -> Option<AccountId> {
        self.name_index.get(name).copied()
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Account> {
        self.id_by_name(name).and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().flatten()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Account> {
        self.accounts.iter_mut().flatten()
    }

    /// Pull-eligible accounts sorted ascending by `pull_priority`, lowest
    /// first (spec.md §4.4's "lowest-priority pullable account").
    #[must_use]
    pub fn pull_priority_catalog(&self) -> &[AccountId] {
        &self.pull_priority_catalog
    }

    #[must_use]
    pub fn is_interest_pay_account(&self, id: AccountId) -> bool {
        self.interest_pay_accounts.contains(&id)
    }

    #[must_use]
    pub fn pensions(&self) -> &[Pension] {
        &self.pensions
    }

    #[must_use]
    pub fn social_security(&self) -> &[SocialSecurity] {
        &self.social_security
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountType;

    fn account(id: u32, priority: i32) -> Account {
        let mut a = Account::new(AccountId(id), format!("acct{id}"), AccountType::Checking, 0.0);
        a.pull_priority = priority;
        a
    }

    #[test]
    fn pull_catalog_sorted_ascending_excluding_disabled() {
        let manager = AccountManager::new(
            vec![account(1, 5), account(2, -1), account(3, 0)],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(manager.pull_priority_catalog(), &[AccountId(3), AccountId(1)]);
    }

    #[test]
    fn lookup_by_name_and_id() {
        let manager = AccountManager::new(vec![account(7, -1)], Vec::new(), Vec::new());
        assert_eq!(manager.id_by_name("acct7"), Some(AccountId(7)));
        assert!(manager.get(AccountId(7)).is_some());
        assert!(manager.get(AccountId(99)).is_none());
    }
}
