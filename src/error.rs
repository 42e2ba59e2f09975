//! Error taxonomy (spec.md §7).
//!
//! Plain `#[derive(Debug)]` enums with manual `From` chains, matching the
//! teacher's shape (`EngineError` -> `TransferEvaluationError` ->
//! `TriggerEventError`): no `thiserror`/`anyhow`, narrower errors convert
//! into broader ones so call sites can propagate with `?`.

use crate::model::{AccountId, CategoryId, EventId};

pub type Result<T> = std::result::Result<T, ProjectionError>;

/// Missing required input, unknown variable, or corrupt rate table.
/// Surfaced to the caller; no partial result is produced.
#[derive(Debug)]
pub enum ConfigurationError {
    MissingVariable(String),
    MissingHistoricalYear(i16),
    CorruptRateTable(String),
    AccountMissingPushPullTarget(AccountId),
}

/// Failures the engine can hit once a projection is underway. Some are
/// fatal to the whole projection (`GeneratorOverflow`); others abort only
/// the current Monte Carlo iteration (`Numeric`); dangling references never
/// reach this type at all — they are logged as `EngineWarning`s and the
/// offending event is skipped in place.
#[derive(Debug)]
pub enum EngineError {
    /// A single bill/interest/pension/spending-tracker generator would emit
    /// more than 10,000 occurrences (spec.md §3, §4.1). Fatal.
    GeneratorOverflow { source: &'static str, id: u64 },
    /// NaN or infinity observed in a balance update. Aborts the current
    /// Monte Carlo iteration with this diagnostic.
    Numeric { account: AccountId, context: &'static str },
    /// A Monte Carlo sample provider did not return a value for a
    /// requested `(sample_type, date)` pair. Silent zero substitution is
    /// forbidden (spec.md §7).
    MissingSample { sample_type: String },
    AccountNotFound(AccountId),
    CategoryNotFound(CategoryId),
}

impl From<EngineError> for ProjectionError {
    fn from(err: EngineError) -> Self {
        ProjectionError::Engine(err)
    }
}

impl From<ConfigurationError> for ProjectionError {
    fn from(err: ConfigurationError) -> Self {
        ProjectionError::Configuration(err)
    }
}

impl From<jiff::Error> for ProjectionError {
    fn from(err: jiff::Error) -> Self {
        ProjectionError::Date(err)
    }
}

/// Every public entry point returns this. Narrower internal errors `From`
/// into it so call sites can use `?` without manual wrapping.
#[derive(Debug)]
pub enum ProjectionError {
    Configuration(ConfigurationError),
    Engine(EngineError),
    Date(jiff::Error),
    /// The cancellation token fired at a segment boundary (spec.md §5).
    /// Callers that reach this should prefer the partial `ProjectionOutcome`
    /// with `incomplete = true` rather than treating it as a hard failure.
    Cancelled,
}

/// The structured log the orchestrator writes to: this crate has no
/// ambient `log`/`tracing` dependency because the teacher's core engine
/// doesn't reach for one either (it collects typed `SimulationWarning`
/// values instead of printing). A caller that wants process-wide logging
/// iterates `ProjectionOutcome.warnings`.
#[derive(Debug, Clone)]
pub struct EngineWarning {
    pub date: jiff::civil::Date,
    pub account: Option<AccountId>,
    pub event: Option<EventId>,
    pub kind: WarningKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    DanglingReference,
    GeneratorOverflow,
    ConvergenceWarning,
    IterationLimitHit,
    MissingInterestEntry,
    SymbolicResolutionNoOp,
    CancellationSignaled,
}
