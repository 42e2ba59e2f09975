//! Whole-projection integration tests, run through the public `project()`
//! entry point rather than against individual components.
//!
//! Tests are organized by topic:
//! - `interest` — compounding interest over a short horizon
//! - `pull` — automatic liquidity pull between accounts
//! - `transfer_conservation` — net-zero invariant for transfer activities
//! - `pension` — pension/Social Security income through a full projection
//! - `spending_tracker` — per-category budget remainder/carry behavior
//! - `determinism` — byte-for-byte repeatability with Monte Carlo disabled
//! - `rmd` — Required Minimum Distribution end-to-end
//! - `taxes` — taxable-interest and withdrawal tax routing end-to-end

mod determinism;
mod pension;
mod rmd;

use crate::account_manager::AccountManager;
use crate::engine::{ProjectionOutcome, ProjectionRequest};
use crate::model::{RmdTable, SpendingCategory};
use crate::resolver::{InMemoryHistoricalTables, InMemorySampleProvider, InMemoryVariableResolver, MonteCarloSampleProvider};

/// Shared no-op collaborators plus a default horizon, for scenarios that
/// don't need variables, historical tables, or Monte Carlo sampling.
pub(crate) fn run(
    accounts: AccountManager,
    spending_categories: Vec<SpendingCategory>,
    today: jiff::civil::Date,
    horizon_end: jiff::civil::Date,
) -> ProjectionOutcome {
    let resolver = InMemoryVariableResolver::new();
    let historical = InMemoryHistoricalTables::default();
    let factory = |seed: u64| -> Box<dyn MonteCarloSampleProvider> { Box::new(InMemorySampleProvider::new(seed)) };

    let request = ProjectionRequest {
        accounts,
        spending_categories,
        rmd_table: RmdTable::irs_uniform_lifetime_2024(),
        resolver: &resolver,
        historical: &historical,
        sample_provider_factory: &factory,
        today,
        start_date: Some(today),
        horizon_end,
        monte_carlo: false,
        simulation_count: 1,
        simulation_number: None,
        force_recalculation: false,
        cancellation: None,
    };

    crate::engine::project(&request).expect("projection succeeds")
}
