//! Required Minimum Distribution, exercised end to end through `project()`
//! (spec.md §4.6, IRS Uniform Lifetime Table).
//!
//! Owner turns 73 on the first Dec 31 in the horizon. The RMD transfers
//! `year_end_balance / divisor` from the owner account into the
//! designated RMD account, and nothing moves before age 73.

use super::run;
use crate::account_manager::AccountManager;
use crate::model::{Account, AccountId, AccountType};

fn accounts() -> AccountManager {
    let mut owner = Account::new(AccountId(0), "IRA", AccountType::Retirement, 100_000.0);
    owner.uses_rmd = true;
    owner.account_owner_dob = Some(jiff::civil::date(1952, 6, 15));
    owner.rmd_account = Some(AccountId(1));

    let checking = Account::new(AccountId(1), "Checking", AccountType::Checking, 0.0);
    AccountManager::new(vec![owner, checking], Vec::new(), Vec::new())
}

#[test]
fn rmd_fires_only_once_age_73_is_reached() {
    let outcome = run(accounts(), Vec::new(), jiff::civil::date(2025, 1, 1), jiff::civil::date(2025, 12, 31));

    let ira = outcome.accounts.iter().find(|a| a.account_id == AccountId(0)).unwrap();
    let checking = outcome.accounts.iter().find(|a| a.account_id == AccountId(1)).unwrap();

    let rmd_legs: Vec<_> = ira.activities.iter().filter(|a| a.name == "RMD").collect();
    assert_eq!(rmd_legs.len(), 1);
    assert_eq!(rmd_legs[0].date, jiff::civil::date(2025, 12, 31));

    let expected = 100_000.0 / 26.5;
    assert!((rmd_legs[0].amount - (-expected)).abs() < 1e-6, "{} vs {expected}", rmd_legs[0].amount);
    assert!((ira.activities.last().unwrap().balance - (100_000.0 - expected)).abs() < 1e-6);
    assert!((checking.activities.last().unwrap().balance - expected).abs() < 1e-6);

    // The RMD lands on 2025-12-31, strictly after `today` (2025-01-01), so
    // as of today both accounts still sit at their starting balances
    // (spec.md §4.8 "todayBalance").
    assert!((ira.today_balance - 100_000.0).abs() < 1e-6);
    assert!((checking.today_balance - 0.0).abs() < 1e-6);
}

#[test]
fn rmd_divisor_shrinks_as_the_owner_ages() {
    let outcome = run(accounts(), Vec::new(), jiff::civil::date(2025, 1, 1), jiff::civil::date(2026, 12, 31));
    let ira = outcome.accounts.iter().find(|a| a.account_id == AccountId(0)).unwrap();

    let rmd_legs: Vec<_> = ira.activities.iter().filter(|a| a.name == "RMD").collect();
    assert_eq!(rmd_legs.len(), 2);

    let first_withdrawal = -rmd_legs[0].amount;
    let expected_first = 100_000.0 / 26.5;
    assert!((first_withdrawal - expected_first).abs() < 1e-6);

    let balance_after_first = 100_000.0 - expected_first;
    let expected_second = balance_after_first / 25.5;
    assert!((-rmd_legs[1].amount - expected_second).abs() < 1e-6, "{} vs {expected_second}", -rmd_legs[1].amount);
}

#[test]
fn no_rmd_before_age_73() {
    let mut owner = Account::new(AccountId(0), "IRA", AccountType::Retirement, 50_000.0);
    owner.uses_rmd = true;
    owner.account_owner_dob = Some(jiff::civil::date(1960, 6, 15));
    owner.rmd_account = Some(AccountId(1));
    let checking = Account::new(AccountId(1), "Checking", AccountType::Checking, 0.0);
    let managed = AccountManager::new(vec![owner, checking], Vec::new(), Vec::new());

    let outcome = run(managed, Vec::new(), jiff::civil::date(2025, 1, 1), jiff::civil::date(2025, 12, 31));
    let ira = outcome.accounts.iter().find(|a| a.account_id == AccountId(0)).unwrap();
    assert!(ira.activities.iter().all(|a| a.name != "RMD"));
    assert!((ira.today_balance - 50_000.0).abs() < 1e-6);
}
