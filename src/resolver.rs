//! Injected collaborators (spec.md §6): the Variable Resolver, the
//! historical-rate tables, and the Monte Carlo sample provider. The engine
//! only ever queries these through the trait boundary — it never owns or
//! mutates them, the same separation the teacher draws around `Market` in
//! `model/market.rs`.

use jiff::civil::Date;
use rustc_hash::FxHashMap;

use crate::error::{EngineError, Result};
use crate::model::{AmountOrDate, AverageWageIndex, BendPointTable, SimulationId};

/// Resolves a named variable (amount or date) for a given simulation.
/// Unknown variables are a `ConfigurationError` at the call site, not a
/// silent zero/today substitution (spec.md §7).
pub trait VariableResolver {
    fn resolve(&self, name: &str, simulation: SimulationId) -> Option<AmountOrDate>;
}

/// The historical tables the Retirement Calculator indexes into, keyed by
/// year (spec.md §6).
pub trait HistoricalTables {
    fn average_wage_index(&self) -> &AverageWageIndex;
    fn bend_points(&self) -> &BendPointTable;
}

/// `(sampleType, date) -> f64`, the stochastic collaborator behind
/// Monte-Carlo-tagged bills/interest. Missing samples must raise
/// `EngineError::MissingSample` — silent zero substitution is forbidden
/// (spec.md §7).
pub trait MonteCarloSampleProvider {
    fn sample(&self, sample_type: &str, date: Date) -> Option<f64>;
}

/// An in-memory reference implementation of `VariableResolver`, used by
/// `config::builder` for tests and docs the same way the teacher's
/// `Market::from_profiles` ships a reference sampling path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVariableResolver {
    amounts: FxHashMap<(String, SimulationId), f64>,
    dates: FxHashMap<(String, SimulationId), Date>,
}

impl InMemoryVariableResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, name: impl Into<String>, simulation: SimulationId, value: f64) -> Self {
        self.amounts.insert((name.into(), simulation), value);
        self
    }

    pub fn with_date(mut self, name: impl Into<String>, simulation: SimulationId, value: Date) -> Self {
        self.dates.insert((name.into(), simulation), value);
        self
    }
}

impl VariableResolver for InMemoryVariableResolver {
    fn resolve(&self, name: &str, simulation: SimulationId) -> Option<AmountOrDate> {
        let key = (name.to_string(), simulation);
        if let Some(&amount) = self.amounts.get(&key) {
            return Some(AmountOrDate::Amount(amount));
        }
        if let Some(&date) = self.dates.get(&key) {
            return Some(AmountOrDate::Date(date));
        }
        None
    }
}

/// Reference historical tables, constructed from plain maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoricalTables {
    pub awi: AverageWageIndex,
    pub bend_points: BendPointTable,
}

impl HistoricalTables for InMemoryHistoricalTables {
    fn average_wage_index(&self) -> &AverageWageIndex {
        &self.awi
    }

    fn bend_points(&self) -> &BendPointTable {
        &self.bend_points
    }
}

/// Reference Monte Carlo provider drawing from `rand_distr` normal
/// distributions registered per sample type, built the way the teacher's
/// `Market::from_profiles` draws samples.
pub struct InMemorySampleProvider {
    distributions: FxHashMap<String, rand_distr::Normal<f64>>,
    rng: std::cell::RefCell<rand::rngs::SmallRng>,
}

impl InMemorySampleProvider {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            distributions: FxHashMap::default(),
            rng: std::cell::RefCell::new(rand::rngs::SmallRng::seed_from_u64(seed)),
        }
    }

    pub fn register(&mut self, sample_type: impl Into<String>, mean: f64, std_dev: f64) {
        if let Ok(dist) = rand_distr::Normal::new(mean, std_dev) {
            self.distributions.insert(sample_type.into(), dist);
        }
    }
}

impl MonteCarloSampleProvider for InMemorySampleProvider {
    fn sample(&self, sample_type: &str, _date: Date) -> Option<f64> {
        use rand::Rng;
        let dist = self.distributions.get(sample_type)?;
        Some(self.rng.borrow_mut().sample(dist))
    }
}

/// Resolve an `AmountSpec`/symbolic-free variable amount against a
/// resolver, surfacing `ConfigurationError` semantics as an `EngineError`
/// compatible with segment-processing call sites. Symbolic amounts are
/// handled by the caller against a counterparty balance, not here.
pub fn resolve_variable_amount(
    resolver: &dyn VariableResolver,
    name: &str,
    simulation: SimulationId,
) -> Option<f64> {
    resolver.resolve(name, simulation).and_then(AmountOrDate::as_amount)
}

pub fn resolve_variable_date(
    resolver: &dyn VariableResolver,
    name: &str,
    simulation: SimulationId,
) -> Option<Date> {
    resolver.resolve(name, simulation).and_then(AmountOrDate::as_date)
}

/// Query a Monte Carlo sample, converting a missing sample into the
/// mandatory `EngineError::MissingSample` (spec.md §7: silent zero
/// substitution is forbidden).
pub fn require_sample(
    provider: &dyn MonteCarloSampleProvider,
    sample_type: &str,
    date: Date,
) -> Result<f64> {
    provider
        .sample(sample_type, date)
        .ok_or_else(|| EngineError::MissingSample { sample_type: sample_type.to_string() }.into())
}
