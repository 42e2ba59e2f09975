//! Personal financial account projection engine
//!
//! This crate projects personal financial accounts forward from declarative
//! schedules — one-off and recurring activities, bills with optional
//! ceiling/inflation or Monte Carlo resampling, compounding interest,
//! pension/Social Security retirement income, RMDs, push/pull liquidity
//! management between accounts, and per-category spending-tracker budgets —
//! into a consolidated, balance-annotated activity stream per account.
//!
//! It supports:
//! - Deterministic and Monte Carlo (stochastically resampled) projections
//! - Push/pull liquidity management keyed off each segment's observed
//!   min/max balance range
//! - A budget-tracking spending category state machine with carry balances
//! - Social Security AIME/PIA and pension accrual/reduction-factor math
//! - Required Minimum Distribution (RMD) schedules
//! - Segment-level result caching keyed by content hash, with a bounded
//!   one-retry checkpoint/restore around push/pull reprocessing
//!
//! # Builder DSL
//!
//! Use the fluent builder API for ergonomic projection setup:
//!
//! ```ignore
//! use projection_engine::config::{AccountBuilder, EngineConfigBuilder};
//! use projection_engine::engine::{project, ProjectionRequest};
//! use projection_engine::resolver::{InMemoryHistoricalTables, InMemoryVariableResolver, InMemorySampleProvider};
//! use projection_engine::model::RmdTable;
//!
//! let (accounts, spending_categories, _metadata) = EngineConfigBuilder::new()
//!     .account(AccountBuilder::checking("Checking").balance(5_000.0))
//!     .build();
//!
//! let resolver = InMemoryVariableResolver::new();
//! let historical = InMemoryHistoricalTables::default();
//! let factory = |seed: u64| -> Box<dyn projection_engine::resolver::MonteCarloSampleProvider> {
//!     Box::new(InMemorySampleProvider::new(seed))
//! };
//!
//! let outcome = project(&ProjectionRequest {
//!     accounts,
//!     spending_categories,
//!     rmd_table: RmdTable::irs_uniform_lifetime_2024(),
//!     resolver: &resolver,
//!     historical: &historical,
//!     sample_provider_factory: &factory,
//!     today: jiff::civil::date(2025, 1, 1),
//!     start_date: None,
//!     horizon_end: jiff::civil::date(2055, 1, 1),
//!     monte_carlo: false,
//!     simulation_count: 1,
//!     simulation_number: None,
//!     force_recalculation: false,
//!     cancellation: None,
//! });
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod account_manager;
pub mod balance_tracker;
pub mod cache;
pub mod date_math;
pub mod engine;
pub mod error;
pub mod push_pull;
pub mod resolver;
pub mod retirement;
pub mod segment_processor;
pub mod spending_tracker;
pub mod timeline;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use config::{AccountBuilder, ActivityBuilder, BillBuilder, EngineConfigBuilder, SimulationMetadata};
pub use engine::{project, ProjectionOutcome, ProjectionRequest};
pub use error::{ProjectionError, Result};
