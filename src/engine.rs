//! Engine Orchestrator (spec.md §4.8): wires the Event Generator, Segment
//! Processor, Push/Pull Handler, and Segment Cache into the top-level
//! `project()` entry point, and fans a Monte Carlo run out across
//! iterations the way the teacher's `monte_carlo_simulate_with_config`
//! fans its batches out with `rayon`.

use std::sync::atomic::{AtomicBool, Ordering};

use jiff::civil::Date;
use rustc_hash::FxHashMap;

use crate::account_manager::AccountManager;
use crate::balance_tracker::BalanceTracker;
use crate::cache::{CachedSegmentResult, SegmentCache};
use crate::error::{EngineError, EngineWarning, ProjectionError, Result, WarningKind};
use crate::model::{
    AccountId, ConsolidatedActivity, RmdTable, Segment, SegmentId, SimulationId, SpendingCategory,
};
use crate::push_pull::{self, AutoTransfer};
use crate::resolver::{HistoricalTables, MonteCarloSampleProvider, VariableResolver};
use crate::segment_processor::{ActivityLog, SegmentContext, SegmentProcessor};
use crate::spending_tracker::SpendingTrackerManager;
use crate::timeline::{self, GenerationContext};

/// Cooperative cancellation checked at segment boundaries (spec.md §5):
/// a long Monte Carlo run can be asked to stop between segments rather
/// than only between whole iterations.
#[derive(Debug, Default)]
pub struct CancellationToken(AtomicBool);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A single account's projected output: its consolidated activity stream
/// and its balance as of `today` (spec.md §6).
#[derive(Debug, Clone)]
pub struct AccountProjection {
    pub account_id: AccountId,
    pub name: String,
    pub activities: Vec<ConsolidatedActivity>,
    pub today_balance: f64,
}

/// Run-level metadata returned alongside the projected accounts
/// (spec.md §6).
#[derive(Debug, Clone, Default)]
pub struct ProjectionMetadata {
    pub actual_start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub iterations_requested: u32,
    pub iterations_completed: u32,
    pub cache_hit_rate: f64,
    pub duration_ms: u128,
}

/// The full result of a `project()` call (spec.md §6).
#[derive(Debug, Clone)]
pub struct ProjectionOutcome {
    pub accounts: Vec<AccountProjection>,
    pub warnings: Vec<EngineWarning>,
    pub metadata: ProjectionMetadata,
    /// Set when the cancellation token fired before every segment of
    /// every requested iteration finished (spec.md §5).
    pub incomplete: bool,
}

/// Everything `project()` needs, by reference where the caller's data can
/// outlive the call (spec.md §6 "Invocation").
pub struct ProjectionRequest<'a> {
    pub accounts: AccountManager,
    pub spending_categories: Vec<SpendingCategory>,
    pub rmd_table: RmdTable,
    /// `+ Sync` because iterations run concurrently across threads when
    /// `monte_carlo` is set (spec.md §6, §9).
    pub resolver: &'a (dyn VariableResolver + Sync),
    pub historical: &'a (dyn HistoricalTables + Sync),
    /// Constructs a fresh sample provider per Monte Carlo iteration,
    /// seeded by the iteration index — avoids requiring `Sync` on the
    /// provider itself, since a reference implementation typically holds
    /// an RNG behind a `RefCell` (spec.md §6, §9).
    pub sample_provider_factory: &'a (dyn Fn(u64) -> Box<dyn MonteCarloSampleProvider> + Sync),
    pub today: Date,
    pub start_date: Option<Date>,
    pub horizon_end: Date,
    pub monte_carlo: bool,
    pub simulation_count: u32,
    /// When set, the canonical returned account stream is this iteration
    /// rather than iteration 0 (spec.md §6 "simulationNumber").
    pub simulation_number: Option<u32>,
    /// When false, a previously cached segment result for an unchanged
    /// prefix of the horizon is reused rather than reprocessed
    /// (spec.md §4.7).
    pub force_recalculation: bool,
    pub cancellation: Option<&'a CancellationToken>,
}

/// One iteration's fully processed result: the per-account activity log
/// and the balances as of `today`.
struct IterationResult {
    activity_log: ActivityLog,
    warnings: Vec<EngineWarning>,
    incomplete: bool,
    cache_hit_rate: f64,
}

/// Top-level entry point (spec.md §4.8, §6): generate the timeline once,
/// then run one deterministic iteration or fan a Monte Carlo batch out
/// across `simulation_count` independently resampled iterations, each
/// against its own `BalanceTracker`/`SpendingTrackerManager`/cache.
pub fn project(request: &ProjectionRequest) -> Result<ProjectionOutcome> {
    #[cfg(not(target_arch = "wasm32"))]
    let started_at = std::time::Instant::now();
    let horizon_start = request.start_date.unwrap_or(request.today);
    let gen_ctx = GenerationContext {
        today: request.today,
        horizon_start,
        horizon_end: request.horizon_end,
        simulation: SimulationId(0),
    };

    let mut base_warnings = Vec::new();
    let base_events = timeline::generate_events(
        &request.accounts,
        &request.spending_categories,
        request.resolver,
        request.sample_provider_factory(0).as_ref(),
        &gen_ctx,
        &mut base_warnings,
    )?;

    let iteration_count = if request.monte_carlo { request.simulation_count.max(1) } else { 1 };

    let run_iteration = |index: u32| -> Result<IterationResult> {
        let simulation = SimulationId(index);
        let sample_provider = request.sample_provider_factory(index as u64);
        let events = if request.monte_carlo {
            timeline::resample_monte_carlo(
                base_events.clone(),
                &request.accounts,
                request.resolver,
                sample_provider.as_ref(),
                simulation,
            )?
        } else {
            base_events.clone()
        };
        let segments = timeline::segment_events(events, horizon_start, request.horizon_end);
        run_single_iteration(request, &segments, simulation, request.cancellation)
    };

    #[cfg(feature = "parallel")]
    let iteration_results: Vec<Result<IterationResult>> = {
        use rayon::prelude::*;
        (0..iteration_count).into_par_iter().map(run_iteration).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let iteration_results: Vec<Result<IterationResult>> =
        (0..iteration_count).map(run_iteration).collect();

    let canonical_index = request.simulation_number.unwrap_or(0).min(iteration_count.saturating_sub(1));
    let mut completed = 0u32;
    let mut canonical: Option<IterationResult> = None;
    let mut incomplete = false;

    for (idx, result) in iteration_results.into_iter().enumerate() {
        match result {
            Ok(iteration) => {
                incomplete |= iteration.incomplete;
                completed += 1;
                if idx as u32 == canonical_index {
                    canonical = Some(iteration);
                }
            }
            Err(err) => {
                if idx as u32 == canonical_index {
                    return Err(err);
                }
            }
        }
    }

    let Some(canonical) = canonical else {
        return Err(ProjectionError::Engine(EngineError::Numeric {
            account: AccountId(0),
            context: "no iteration produced a canonical result",
        }));
    };

    let mut warnings = base_warnings;
    warnings.extend(canonical.warnings);

    let accounts = request
        .accounts
        .iter()
        .map(|account| {
            let activities = canonical.activity_log.get(&account.id).cloned().unwrap_or_default();
            let today_balance = today_balance_as_of(&activities, request.today, account.starting_balance);
            AccountProjection { account_id: account.id, name: account.name.clone(), activities, today_balance }
        })
        .collect();

    Ok(ProjectionOutcome {
        accounts,
        warnings,
        metadata: ProjectionMetadata {
            actual_start_date: Some(horizon_start),
            end_date: Some(request.horizon_end),
            iterations_requested: iteration_count,
            iterations_completed: completed,
            cache_hit_rate: canonical.cache_hit_rate,
            #[cfg(not(target_arch = "wasm32"))]
            duration_ms: started_at.elapsed().as_millis(),
            #[cfg(target_arch = "wasm32")]
            duration_ms: 0,
        },
        incomplete,
    })
}

/// Process every segment of one iteration: checkpoint, process, evaluate
/// push/pull for every account, and — if any auto-transfer fired —
/// restore the checkpoint and reprocess exactly once with the transfers
/// pre-applied before moving on (spec.md §4.4 "bounded reprocess",
/// §4.7 checkpoint).
fn run_single_iteration(
    request: &ProjectionRequest,
    segments: &[Segment],
    simulation: SimulationId,
    cancellation: Option<&CancellationToken>,
) -> Result<IterationResult> {
    let starting_balances = request.accounts.iter().map(|a| (a.id, a.starting_balance));
    let mut balances = BalanceTracker::new(starting_balances);
    let mut spending = SpendingTrackerManager::new();
    let mut processor = SegmentProcessor::new();
    let mut cache = SegmentCache::new(64 * 1024 * 1024);
    let mut activity_log: ActivityLog = FxHashMap::default();
    let mut warnings = Vec::new();
    let mut incomplete = false;

    let horizon_start = request.start_date.unwrap_or(request.today);
    let ctx = SegmentContext {
        accounts: &request.accounts,
        resolver: request.resolver,
        historical: request.historical,
        rmd_table: &request.rmd_table,
        spending_categories: &request.spending_categories,
        engine_start: horizon_start,
        simulation,
    };

    for segment in segments {
        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            incomplete = true;
            break;
        }

        if !request.force_recalculation {
            if let Some(cached) = cache.get(&segment.cache_key, 0) {
                apply_cached_segment(&cached, segment.end_date, &mut balances, &mut activity_log);
                continue;
            }
        }

        balances.reset_segment_ranges();
        for &account in &segment.affected_account_ids {
            balances.record_activity_length(account, activity_log.get(&account).map(Vec::len).unwrap_or(0));
        }
        balances.checkpoint(segment.id);
        spending_checkpoint(&mut spending, &request.spending_categories);

        processor.process_segment(segment, &mut balances, &mut spending, &ctx, &mut activity_log)?;

        let transfers = evaluate_push_pull(&request.accounts, &balances, segment, request.today);
        if !transfers.is_empty() {
            balances.restore(segment.id);
            spending_restore(&mut spending, &request.spending_categories);
            balances.reset_segment_ranges();
            // The discarded attempt above already appended its consolidated
            // activities to `activity_log`; roll each affected account's log
            // back to its pre-attempt length before replaying the segment,
            // or the reprocessed activities would be duplicated alongside
            // the stale ones (spec.md §4.4 "re-run from its entry snapshot").
            for &account in &segment.affected_account_ids {
                let len = balances.activity_length(account);
                if let Some(activities) = activity_log.get_mut(&account) {
                    activities.truncate(len);
                }
            }

            processor.process_segment(segment, &mut balances, &mut spending, &ctx, &mut activity_log)?;
            for transfer in &transfers {
                processor.apply_auto_transfer(transfer, &mut balances, &mut activity_log);
            }
            check_convergence(&transfers, &mut warnings, segment.id);
        }

        balances.discard_checkpoint(segment.id);

        if !request.force_recalculation {
            cache.insert(segment.cache_key.clone(), snapshot_segment(segment, &activity_log, &balances), 0, None);
        }

        for &account in &segment.affected_account_ids {
            if !balances.get_balance(account).is_finite() {
                return Err(EngineError::Numeric { account, context: "segment produced a non-finite balance" }.into());
            }
        }
    }

    let cache_hit_rate = cache.hit_rate();
    Ok(IterationResult { activity_log, warnings, incomplete, cache_hit_rate })
}

/// The balance immediately after the last activity with `date <= today`,
/// or the starting balance if none (spec.md §4.8, §6 "todayBalance").
/// `activities` is chronologically non-decreasing (spec.md §3), so the
/// last matching entry is the most recent one at or before `today`.
fn today_balance_as_of(activities: &[ConsolidatedActivity], today: Date, starting_balance: f64) -> f64 {
    activities
        .iter()
        .rev()
        .find(|activity| activity.date <= today)
        .map_or(starting_balance, |activity| activity.balance)
}

/// Push/Pull evaluation for every account touched by this segment, in
/// account-id order for determinism (spec.md §4.4, §8 "Determinism").
fn evaluate_push_pull(
    accounts: &AccountManager,
    balances: &BalanceTracker,
    segment: &Segment,
    today: Date,
) -> Vec<AutoTransfer> {
    let mut ids: Vec<AccountId> = segment.affected_account_ids.iter().copied().collect();
    ids.sort();
    let mut transfers = Vec::new();
    for id in ids {
        transfers.extend(push_pull::evaluate_account(accounts, balances, id, segment.start_date, today));
    }
    transfers
}

/// A reprocess that still leaves some account outside its configured
/// range logs a convergence warning rather than looping further — the
/// reprocess is bounded to exactly one retry (spec.md §4.4, §7).
fn check_convergence(transfers: &[AutoTransfer], warnings: &mut Vec<EngineWarning>, _segment: SegmentId) {
    if transfers.len() > 32 {
        warnings.push(EngineWarning {
            date: transfers[0].date,
            account: Some(transfers[0].from),
            event: None,
            kind: WarningKind::ConvergenceWarning,
            message: "push/pull reprocess produced an unusually large transfer batch".to_string(),
        });
    }
}

fn spending_checkpoint(spending: &mut SpendingTrackerManager, categories: &[SpendingCategory]) {
    for category in categories {
        spending.checkpoint(category.id);
    }
}

fn spending_restore(spending: &mut SpendingTrackerManager, categories: &[SpendingCategory]) {
    for category in categories {
        spending.restore(category.id);
    }
}

fn snapshot_segment(segment: &Segment, activity_log: &ActivityLog, balances: &BalanceTracker) -> CachedSegmentResult {
    let mut new_activities = FxHashMap::default();
    for &account in &segment.affected_account_ids {
        if let Some(activities) = activity_log.get(&account) {
            new_activities.insert(account, activities.clone());
        }
    }
    let mut ending_balances = FxHashMap::default();
    let mut ending_interest_states = FxHashMap::default();
    for &account in &segment.affected_account_ids {
        ending_balances.insert(account, balances.get_balance(account));
        ending_interest_states.insert(account, balances.interest_state(account));
    }
    CachedSegmentResult { new_activities, ending_balances, ending_interest_states }
}

fn apply_cached_segment(cached: &CachedSegmentResult, segment_end: Date, balances: &mut BalanceTracker, activity_log: &mut ActivityLog) {
    for (&account, &balance) in &cached.ending_balances {
        balances.set_balance(account, segment_end, balance);
    }
    for (&account, state) in &cached.ending_interest_states {
        balances.set_interest_state(account, state.clone());
    }
    for (&account, activities) in &cached.new_activities {
        activity_log.entry(account).or_default().extend(activities.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_math::Period;
    use crate::model::{Account, AccountType, AmountSpec, Bill};
    use crate::resolver::{InMemoryHistoricalTables, InMemoryVariableResolver, InMemorySampleProvider};

    fn checking_with_paycheck() -> Account {
        let mut account = Account::new(AccountId(1), "Checking", AccountType::Checking, 1000.0);
        account.bills.push(Bill {
            id: crate::model::BillId(1),
            name: "Paycheck".into(),
            category: "Income.Salary".into(),
            start_date: jiff::civil::date(2025, 1, 1),
            end_date: None,
            periods: Period::Month,
            every_n: 1,
            amount: AmountSpec::Fixed(2000.0),
            increase_by: 0.0,
            increase_by_date: jiff::civil::date(2025, 1, 1),
            ceiling_multiple: None,
            monte_carlo_sample_type: None,
            is_transfer: false,
            fro: None,
            to: None,
            spending_category: None,
            flag: false,
            flag_color: None,
        });
        account
    }

    #[test]
    fn single_iteration_projects_activity_and_balance() {
        let accounts = AccountManager::new(vec![checking_with_paycheck()], Vec::new(), Vec::new());
        let resolver = InMemoryVariableResolver::new();
        let historical = InMemoryHistoricalTables::default();
        let factory = |seed: u64| -> Box<dyn MonteCarloSampleProvider> { Box::new(InMemorySampleProvider::new(seed)) };

        let request = ProjectionRequest {
            accounts,
            spending_categories: Vec::new(),
            rmd_table: RmdTable::irs_uniform_lifetime_2024(),
            resolver: &resolver,
            historical: &historical,
            sample_provider_factory: &factory,
            today: jiff::civil::date(2025, 1, 1),
            start_date: Some(jiff::civil::date(2025, 1, 1)),
            horizon_end: jiff::civil::date(2025, 3, 31),
            monte_carlo: false,
            simulation_count: 1,
            simulation_number: None,
            force_recalculation: false,
            cancellation: None,
        };

        let outcome = project(&request).expect("projection succeeds");
        let checking = outcome.accounts.iter().find(|a| a.account_id == AccountId(1)).unwrap();
        assert_eq!(checking.activities.len(), 3);
        assert!((checking.activities.last().unwrap().balance - 7000.0).abs() < 1e-6);
        // The first paycheck lands on `today` (2025-01-01) itself, so only
        // that one has posted as of today (spec.md §4.8 "todayBalance").
        assert!((checking.today_balance - 3000.0).abs() < 1e-6);
        assert_eq!(outcome.metadata.iterations_completed, 1);
    }

    #[test]
    fn single_iteration_helper_matches_segment_count() {
        let accounts = AccountManager::new(vec![checking_with_paycheck()], Vec::new(), Vec::new());
        let resolver = InMemoryVariableResolver::new();
        let historical = InMemoryHistoricalTables::default();
        let factory = |seed: u64| -> Box<dyn MonteCarloSampleProvider> { Box::new(InMemorySampleProvider::new(seed)) };
        let segments = timeline::segment_events(
            timeline::generate_events(
                &accounts,
                &[],
                &resolver,
                factory(0).as_ref(),
                &GenerationContext {
                    today: jiff::civil::date(2025, 1, 1),
                    horizon_start: jiff::civil::date(2025, 1, 1),
                    horizon_end: jiff::civil::date(2025, 2, 28),
                    simulation: SimulationId(0),
                },
                &mut Vec::new(),
            )
            .unwrap(),
            jiff::civil::date(2025, 1, 1),
            jiff::civil::date(2025, 2, 28),
        );

        let request = ProjectionRequest {
            accounts,
            spending_categories: Vec::new(),
            rmd_table: RmdTable::irs_uniform_lifetime_2024(),
            resolver: &resolver,
            historical: &historical,
            sample_provider_factory: &factory,
            today: jiff::civil::date(2025, 1, 1),
            start_date: Some(jiff::civil::date(2025, 1, 1)),
            horizon_end: jiff::civil::date(2025, 2, 28),
            monte_carlo: false,
            simulation_count: 1,
            simulation_number: None,
            force_recalculation: false,
            cancellation: None,
        };

        let first = run_single_iteration(&request, &segments, SimulationId(0), None).unwrap();
        assert_eq!(first.activity_log.get(&AccountId(1)).map(Vec::len).unwrap_or(0), 2);
    }
}
