//! S4: pension reduction-factor scenarios (spec.md §8), exercised end to
//! end through `project()` rather than just the pure
//! `retirement::pension_monthly` function.
//!
//! Unreduced requirement `{age: 65, yearsWorked: 30}`, reduced requirement
//! `{age: 55, yearsWorked: 25}`, with a reduction table giving `0.9` at
//! `age=55..59, years=30`. A beneficiary who is 57 with 30 years of service
//! lands in the reduced band at `0.9`.

use super::run;
use crate::account_manager::AccountManager;
use crate::model::{
    Account, AccountId, AccountType, Pension, PensionId, ReductionRateTable, ServiceRequirement,
};
use crate::retirement::pension_monthly;

fn pension_record() -> Pension {
    let mut table = ReductionRateTable::default();
    table.by_age.insert(55, std::collections::BTreeMap::from([(25, 0.8), (30, 0.9)]));
    table.by_age.insert(60, std::collections::BTreeMap::from([(25, 0.85), (30, 0.95)]));

    Pension {
        id: PensionId(1),
        pay_to_account: AccountId(0),
        paycheck_name: "Pension".into(),
        category: "Income.Pension".into(),
        start_date: jiff::civil::date(2025, 1, 1),
        // Age 57 on 2025-01-01.
        birth_date: jiff::civil::date(1968, 1, 1),
        // ~30 years of service by 2025-01-01.
        work_start_date: jiff::civil::date(1995, 1, 1),
        unreduced_requirements: vec![ServiceRequirement { age: Some(65), years_worked: 30.0 }],
        reduced_requirements: vec![ServiceRequirement { age: Some(55), years_worked: 25.0 }],
        highest_compensation_consecutive_years_to_average: 4,
        accrual_factor: 0.02,
        reduced_rate_by_age_then_years_of_service: table,
        prior_annual_compensation: std::collections::BTreeMap::from([
            (2021, 80_000.0),
            (2022, 82_000.0),
            (2023, 84_000.0),
            (2024, 86_000.0),
        ]),
    }
}

#[test]
fn pension_income_lands_on_pay_to_account_every_month() {
    let checking = Account::new(AccountId(0), "Checking", AccountType::Checking, 0.0);
    let accounts = AccountManager::new(vec![checking], vec![pension_record()], Vec::new());

    let outcome = run(accounts, Vec::new(), jiff::civil::date(2025, 1, 1), jiff::civil::date(2025, 3, 31));
    let checking = outcome.accounts.iter().find(|a| a.account_id == AccountId(0)).unwrap();

    let payments: Vec<_> = checking.activities.iter().filter(|a| a.category == "Income.Pension").collect();
    assert_eq!(payments.len(), 3);

    let mut expected_total = 0.0;
    for payment in &payments {
        let expected = pension_monthly(&pension_record(), payment.date);
        assert!(expected > 0.0);
        assert!((payment.amount - expected).abs() < 1e-6, "{} vs {expected}", payment.amount);
        expected_total += expected;
    }
    assert!((checking.activities.last().unwrap().balance - expected_total).abs() < 1e-6);

    // `today` is 2025-01-01, the date of the first payment: only that
    // payment has landed as of today (spec.md §4.8 "todayBalance").
    let expected_today = pension_monthly(&pension_record(), payments[0].date);
    assert!((checking.today_balance - expected_today).abs() < 1e-6);
}

#[test]
fn reduction_factor_matches_s4_bands() {
    use crate::retirement::pension_reduction_factor;
    let pension = pension_record();
    assert_eq!(pension_reduction_factor(&pension, 57, 30.0), 0.9);
    assert_eq!(pension_reduction_factor(&pension, 65, 35.0), 1.0);
    assert_eq!(pension_reduction_factor(&pension, 50, 20.0), 0.0);
}
