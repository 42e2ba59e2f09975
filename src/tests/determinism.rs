//! S6: determinism (spec.md §8 property 4, §8 "S6").
//!
//! With Monte Carlo disabled, running `project()` twice against identical
//! input and simulation produces byte-identical serialized activity
//! streams.

use crate::account_manager::AccountManager;
use crate::config::{AccountBuilder, BillBuilder, EngineConfigBuilder};
use crate::date_math::Period;
use crate::model::BillId;

fn build_accounts() -> AccountManager {
    let (accounts, _, _) = EngineConfigBuilder::new()
        .account(
            AccountBuilder::checking("Checking").balance(3_000.0).bill(
                BillBuilder::new("Rent", "Housing.Rent", -1_200.0, jiff::civil::date(2025, 1, 1), Period::Month)
                    .inflation(0.03, jiff::civil::date(2025, 1, 1), Some(10.0))
                    .build(BillId(1)),
            ),
        )
        .account(AccountBuilder::savings("Savings").balance(20_000.0))
        .build();
    accounts
}

#[test]
fn two_runs_produce_byte_identical_output() {
    let first = super::run(build_accounts(), Vec::new(), jiff::civil::date(2025, 1, 1), jiff::civil::date(2026, 12, 31));
    let second = super::run(build_accounts(), Vec::new(), jiff::civil::date(2025, 1, 1), jiff::civil::date(2026, 12, 31));

    assert_eq!(first.accounts.len(), second.accounts.len());
    for (a, b) in first.accounts.iter().zip(second.accounts.iter()) {
        let json_a = serde_json::to_string(&a.activities).unwrap();
        let json_b = serde_json::to_string(&b.activities).unwrap();
        assert_eq!(json_a, json_b);
        assert_eq!(a.today_balance.to_bits(), b.today_balance.to_bits());
    }
}
