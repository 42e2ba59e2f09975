//! Fluent configuration DSL (spec.md §3, §6): build accounts and their
//! declarative schedules, spending categories, and run-metadata without
//! hand-assigning ids, the same ergonomic layer the teacher's
//! `SimulationBuilder`/`AccountBuilder`/`EventBuilder` trio provides over
//! its own model.
//!
//! # Example
//!
//! ```ignore
//! use projection_engine::config::{AccountBuilder, ActivityBuilder, EngineConfigBuilder};
//!
//! let (accounts, categories, metadata) = EngineConfigBuilder::new()
//!     .account(
//!         AccountBuilder::checking("Checking")
//!             .balance(5_000.0)
//!             .activity(ActivityBuilder::new("Paycheck", "Income.Salary", 4_000.0, jiff::civil::date(2025, 1, 1)).build(1.into())),
//!     )
//!     .build();
//! ```

pub mod account_builder;
pub mod builder;
pub mod metadata;
pub mod schedule_builder;

pub use account_builder::AccountBuilder;
pub use builder::{EngineConfigBuilder, SpendingCategoryBuilder};
pub use metadata::{EntityMetadata, SimulationMetadata};
pub use schedule_builder::{ActivityBuilder, BillBuilder, InterestBuilder};
