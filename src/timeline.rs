//! Event Generator (spec.md §4.1): turns declarative per-account schedules
//! into a fully materialized, chronologically sorted, per-month-segmented
//! event list.

use jiff::civil::Date;

use crate::account_manager::AccountManager;
use crate::date_math;
use crate::error::{EngineError, EngineWarning, Result, WarningKind};
use crate::model::{
    AccountId, Activity, AmountSpec, Bill, DateSpec, EventId, EventPayload, EventType, Interest,
    MAX_GENERATOR_OCCURRENCES, Segment, SimulationId, SpendingCategory, SymbolicAmount,
    TimelineEvent, compute_cache_key,
};
use crate::resolver::{MonteCarloSampleProvider, VariableResolver, require_sample, resolve_variable_amount, resolve_variable_date};

/// Horizon, simulation identity, and "today" the generator materializes
/// schedules against.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext {
    pub today: Date,
    pub horizon_start: Date,
    pub horizon_end: Date,
    pub simulation: SimulationId,
}

struct IdCounter(u64);

impl IdCounter {
    fn next(&mut self) -> EventId {
        let id = EventId(self.0);
        self.0 += 1;
        id
    }
}

/// Materialize every account's activities/bills/interest, every
/// pension/Social Security record, RMD and Tax events, and spending-tracker
/// period events, then sort and segment the result (spec.md §4.1).
pub fn generate_timeline(
    accounts: &AccountManager,
    spending_categories: &[SpendingCategory],
    resolver: &dyn VariableResolver,
    sample_provider: &dyn MonteCarloSampleProvider,
    ctx: &GenerationContext,
    warnings: &mut Vec<EngineWarning>,
) -> Result<Vec<Segment>> {
    let events = generate_events(accounts, spending_categories, resolver, sample_provider, ctx, warnings)?;
    Ok(segment_events(events, ctx.horizon_start, ctx.horizon_end))
}

/// The flat, sorted event list before segmentation — exposed separately so
/// Monte Carlo iterations can clone and `resample_monte_carlo` it without
/// regenerating the whole timeline from scratch.
pub fn generate_events(
    accounts: &AccountManager,
    spending_categories: &[SpendingCategory],
    resolver: &dyn VariableResolver,
    sample_provider: &dyn MonteCarloSampleProvider,
    ctx: &GenerationContext,
    warnings: &mut Vec<EngineWarning>,
) -> Result<Vec<TimelineEvent>> {
    let mut ids = IdCounter(1);
    let mut events = Vec::new();

    for account in accounts.iter() {
        generate_activities(account.id, &account.activities, accounts, resolver, ctx, &mut ids, &mut events, warnings);
        generate_bills(account.id, &account.bills, accounts, resolver, sample_provider, ctx, &mut ids, &mut events, warnings)?;
        generate_interest(account.id, &account.interest, ctx, &mut ids, &mut events)?;

        if account.uses_rmd {
            if let (Some(rmd_account), Some(_dob)) = (account.rmd_account, account.account_owner_dob) {
                generate_rmd(account.id, rmd_account, ctx, &mut ids, &mut events);
            }
        }
        if account.performs_pulls || accounts.is_interest_pay_account(account.id) {
            generate_tax(account.id, ctx, &mut ids, &mut events);
        }
    }

    for pension in accounts.pensions() {
        generate_retirement_income(
            pension.pay_to_account,
            pension.start_date,
            pension.birth_date,
            RetirementRecordId::Pension(pension.id),
            ctx,
            &mut ids,
            &mut events,
        )?;
    }
    for ss in accounts.social_security() {
        generate_retirement_income(
            ss.pay_to_account,
            ss.start_date,
            ss.birth_date,
            RetirementRecordId::SocialSecurity(ss.id),
            ctx,
            &mut ids,
            &mut events,
        )?;
    }

    for category in spending_categories {
        generate_spending_tracker(category, ctx, &mut ids, &mut events)?;
    }

    events.sort_by(|a, b| a.date.cmp(&b.date).then(a.priority().partial_cmp(&b.priority()).unwrap()));
    Ok(events)
}

fn resolve_transfer_endpoints(
    accounts: &AccountManager,
    fro: Option<&str>,
    to: Option<&str>,
) -> (Option<AccountId>, Option<AccountId>) {
    (
        fro.and_then(|n| accounts.id_by_name(n)),
        to.and_then(|n| accounts.id_by_name(n)),
    )
}

#[allow(clippy::too_many_arguments)]
fn generate_activities(
    owner: AccountId,
    activities: &[Activity],
    accounts: &AccountManager,
    resolver: &dyn VariableResolver,
    ctx: &GenerationContext,
    ids: &mut IdCounter,
    events: &mut Vec<TimelineEvent>,
    warnings: &mut Vec<EngineWarning>,
) {
    for activity in activities {
        let date = match &activity.date {
            DateSpec::Fixed(d) => Some(*d),
            DateSpec::Variable(name) => resolve_variable_date(resolver, name, ctx.simulation),
        };
        let Some(date) = date else {
            warnings.push(EngineWarning {
                date: ctx.horizon_start,
                account: Some(owner),
                event: None,
                kind: WarningKind::DanglingReference,
                message: format!("activity '{}' has an unresolvable date variable", activity.name),
            });
            continue;
        };
        if date > ctx.horizon_end {
            continue;
        }

        if !activity.is_transfer {
            events.push(TimelineEvent {
                id: ids.next(),
                event_type: EventType::Activity,
                date,
                account_id: owner,
                payload: EventPayload::Activity {
                    name: activity.name.clone(),
                    category: activity.category.clone(),
                    amount: activity.amount.clone(),
                    spending_category: activity.spending_category,
                    flag: activity.flag,
                    flag_color: activity.flag_color.clone(),
                },
            });
            continue;
        }

        let (from_account_id, to_account_id) =
            resolve_transfer_endpoints(accounts, activity.fro.as_deref(), activity.to.as_deref());
        if from_account_id.is_none() && to_account_id.is_none() {
            warnings.push(EngineWarning {
                date,
                account: Some(owner),
                event: None,
                kind: WarningKind::DanglingReference,
                message: format!("transfer activity '{}' has neither endpoint resolvable", activity.name),
            });
            continue;
        }
        events.push(TimelineEvent {
            id: ids.next(),
            event_type: EventType::ActivityTransfer,
            date,
            account_id: owner,
            payload: EventPayload::ActivityTransfer {
                name: activity.name.clone(),
                category: activity.category.clone(),
                amount: activity.amount.clone(),
                from_account_id,
                to_account_id,
                flag: activity.flag,
                flag_color: activity.flag_color.clone(),
            },
        });
    }
}

/// Resolve a bill occurrence's amount: symbolic amounts pass through
/// unchanged (resolved later against the counterparty by the Segment
/// Processor); otherwise ceiling+inflation (deterministic) or Monte Carlo
/// resample, per spec.md §4.1 "Bill amount resolution".
fn resolve_bill_amount(
    bill: &Bill,
    occurrence: Date,
    resolver: &dyn VariableResolver,
    sample_provider: &dyn MonteCarloSampleProvider,
    simulation: SimulationId,
) -> Result<(f64, Option<SymbolicAmount>)> {
    if let AmountSpec::Symbolic(symbol) = &bill.amount {
        return Ok((0.0, Some(*symbol)));
    }
    let base = match &bill.amount {
        AmountSpec::Fixed(v) => *v,
        AmountSpec::Variable(name) => resolve_variable_amount(resolver, name, simulation).unwrap_or(0.0),
        AmountSpec::Symbolic(_) => unreachable!(),
    };
    if let Some(sample_type) = &bill.monte_carlo_sample_type {
        let mut amount = base;
        for anniversary in bill.anniversary_dates(occurrence) {
            let sample = require_sample(sample_provider, sample_type, anniversary)?;
            amount *= 1.0 + sample;
        }
        Ok((amount, None))
    } else {
        Ok((bill.deterministic_resolved_amount(base, occurrence), None))
    }
}

#[allow(clippy::too_many_arguments)]
fn generate_bills(
    owner: AccountId,
    bills: &[Bill],
    accounts: &AccountManager,
    resolver: &dyn VariableResolver,
    sample_provider: &dyn MonteCarloSampleProvider,
    ctx: &GenerationContext,
    ids: &mut IdCounter,
    events: &mut Vec<TimelineEvent>,
    warnings: &mut Vec<EngineWarning>,
) -> Result<()> {
    for bill in bills {
        let occurrences = bill.occurrences_through(ctx.horizon_end);
        if occurrences.len() as u32 > MAX_GENERATOR_OCCURRENCES {
            return Err(EngineError::GeneratorOverflow { source: "bill", id: bill.id.0 as u64 }.into());
        }

        let (from_account_id, to_account_id) = if bill.is_transfer {
            resolve_transfer_endpoints(accounts, bill.fro.as_deref(), bill.to.as_deref())
        } else {
            (None, None)
        };
        if bill.is_transfer && from_account_id.is_none() && to_account_id.is_none() {
            warnings.push(EngineWarning {
                date: bill.start_date,
                account: Some(owner),
                event: None,
                kind: WarningKind::DanglingReference,
                message: format!("transfer bill '{}' has neither endpoint resolvable", bill.name),
            });
            continue;
        }

        for (idx, occurrence) in occurrences.iter().enumerate() {
            if *occurrence < ctx.horizon_start || *occurrence > ctx.horizon_end {
                continue;
            }
            let first_bill = idx == 0;
            let (resolved_amount, symbolic) =
                resolve_bill_amount(bill, *occurrence, resolver, sample_provider, ctx.simulation)?;

            if bill.is_transfer {
                events.push(TimelineEvent {
                    id: ids.next(),
                    event_type: EventType::BillTransfer,
                    date: *occurrence,
                    account_id: owner,
                    payload: EventPayload::BillTransfer {
                        bill_id: bill.id,
                        name: bill.name.clone(),
                        category: bill.category.clone(),
                        resolved_amount,
                        symbolic,
                        first_bill,
                        from_account_id,
                        to_account_id,
                        flag: bill.flag,
                        flag_color: bill.flag_color.clone(),
                    },
                });
            } else {
                events.push(TimelineEvent {
                    id: ids.next(),
                    event_type: EventType::Bill,
                    date: *occurrence,
                    account_id: owner,
                    payload: EventPayload::Bill {
                        bill_id: bill.id,
                        name: bill.name.clone(),
                        category: bill.category.clone(),
                        resolved_amount,
                        symbolic,
                        first_bill,
                        spending_category: bill.spending_category,
                        flag: bill.flag,
                        flag_color: bill.flag_color.clone(),
                    },
                });
            }
        }
    }
    Ok(())
}

fn generate_interest(
    owner: AccountId,
    interest: &[Interest],
    ctx: &GenerationContext,
    ids: &mut IdCounter,
    events: &mut Vec<TimelineEvent>,
) -> Result<()> {
    let mut sorted: Vec<&Interest> = interest.iter().collect();
    sorted.sort_by_key(|i| i.applicable_date);

    for (idx, entry) in sorted.iter().enumerate() {
        let window_end = sorted
            .get(idx + 1)
            .map(|next| next.applicable_date)
            .unwrap_or(ctx.horizon_end)
            .min(ctx.horizon_end);
        if entry.applicable_date > window_end {
            continue;
        }

        let mut date = entry.applicable_date;
        let mut first_interest = true;
        let mut count = 0u32;
        while date <= window_end {
            if date >= ctx.horizon_start {
                events.push(TimelineEvent {
                    id: ids.next(),
                    event_type: EventType::Interest,
                    date,
                    account_id: owner,
                    payload: EventPayload::Interest { interest_id: entry.id, rate: entry.per_period_rate(), first_interest },
                });
                first_interest = false;
            }
            count += 1;
            if count > MAX_GENERATOR_OCCURRENCES {
                return Err(EngineError::GeneratorOverflow { source: "interest", id: entry.id.0 as u64 }.into());
            }
            date = date_math::next_date(date, entry.compounded, 1);
        }
    }
    Ok(())
}

fn generate_rmd(owner: AccountId, rmd_account: AccountId, ctx: &GenerationContext, ids: &mut IdCounter, events: &mut Vec<TimelineEvent>) {
    for year in ctx.horizon_start.year()..=ctx.horizon_end.year() {
        let date = jiff::civil::date(year, 12, 31);
        if date < ctx.horizon_start || date > ctx.horizon_end {
            continue;
        }
        events.push(TimelineEvent {
            id: ids.next(),
            event_type: EventType::Rmd,
            date,
            account_id: owner,
            payload: EventPayload::Rmd { rmd_account_id: rmd_account },
        });
    }
}

fn generate_tax(owner: AccountId, ctx: &GenerationContext, ids: &mut IdCounter, events: &mut Vec<TimelineEvent>) {
    let range_start = ctx.today.max(ctx.horizon_start);
    for year in range_start.year()..=ctx.horizon_end.year() {
        let date = jiff::civil::date(year, 3, 1);
        if date < range_start || date > ctx.horizon_end {
            continue;
        }
        events.push(TimelineEvent {
            id: ids.next(),
            event_type: EventType::Tax,
            date,
            account_id: owner,
            payload: EventPayload::Tax,
        });
    }
}

/// Which retirement input record a generated income event traces back to.
enum RetirementRecordId {
    Pension(crate::model::PensionId),
    SocialSecurity(crate::model::SocialSecurityId),
}

fn generate_retirement_income(
    pay_to: AccountId,
    start_date: Date,
    birth_date: Date,
    record: RetirementRecordId,
    ctx: &GenerationContext,
    ids: &mut IdCounter,
    events: &mut Vec<TimelineEvent>,
) -> Result<()> {
    let mut date = start_date;
    let mut idx = 0u32;
    while date <= ctx.horizon_end {
        if date >= ctx.horizon_start {
            let owner_age = date_math::years_between(birth_date, date);
            let first_payment = idx == 0;
            let (event_type, payload) = match record {
                RetirementRecordId::Pension(pension_id) => {
                    (EventType::Pension, EventPayload::Pension { pension_id, owner_age, first_payment })
                }
                RetirementRecordId::SocialSecurity(social_security_id) => (
                    EventType::SocialSecurity,
                    EventPayload::SocialSecurity { social_security_id, owner_age, first_payment },
                ),
            };
            events.push(TimelineEvent { id: ids.next(), event_type, date, account_id: pay_to, payload });
        }
        idx += 1;
        if idx > MAX_GENERATOR_OCCURRENCES {
            return Err(EngineError::GeneratorOverflow { source: "retirementIncome", id: pay_to.0 as u64 }.into());
        }
        date = date_math::add_months_clamped(date, 1);
    }
    Ok(())
}

fn generate_spending_tracker(
    category: &SpendingCategory,
    ctx: &GenerationContext,
    ids: &mut IdCounter,
    events: &mut Vec<TimelineEvent>,
) -> Result<()> {
    let mut period_start = category.interval_start;
    let mut first_emitted = false;
    let mut idx = 0u32;
    loop {
        let period_end = date_math::next_date(period_start, category.interval, 1);
        if period_end >= ctx.horizon_start && period_end <= ctx.horizon_end {
            let virtual_event = period_end < category.start_date;
            let first_spending_tracker = !virtual_event && !first_emitted;
            if first_spending_tracker {
                first_emitted = true;
            }
            events.push(TimelineEvent {
                id: ids.next(),
                event_type: EventType::SpendingTracker,
                date: period_end,
                account_id: category.target_account,
                payload: EventPayload::SpendingTracker {
                    category_id: category.id,
                    period_start,
                    period_end,
                    first_spending_tracker,
                    virtual_event,
                },
            });
        }
        period_start = period_end;
        idx += 1;
        if idx > MAX_GENERATOR_OCCURRENCES {
            return Err(EngineError::GeneratorOverflow { source: "spendingTracker", id: category.id.0 as u64 }.into());
        }
        if period_end > ctx.horizon_end {
            break;
        }
    }
    Ok(())
}

/// Every account id an event touches: its primary `account_id` plus, for
/// transfer variants, the `from`/`to` legs (spec.md §4.1 "affectedAccountIds").
fn affected_account_ids(event: &TimelineEvent) -> Vec<AccountId> {
    let mut ids = vec![event.account_id];
    match &event.payload {
        EventPayload::ActivityTransfer { from_account_id, to_account_id, .. }
        | EventPayload::BillTransfer { from_account_id, to_account_id, .. } => {
            if let Some(id) = from_account_id {
                ids.push(*id);
            }
            if let Some(id) = to_account_id {
                ids.push(*id);
            }
        }
        EventPayload::Rmd { rmd_account_id } => ids.push(*rmd_account_id),
        _ => {}
    }
    ids
}

/// Partition a sorted event list into `startOf(month)..endOf(month)`
/// windows intersected with `[horizon_start, horizon_end]` (spec.md §4.1
/// "Sort & segment").
pub fn segment_events(events: Vec<TimelineEvent>, horizon_start: Date, horizon_end: Date) -> Vec<Segment> {
    use rustc_hash::FxHashSet;

    let mut segments = Vec::new();
    if horizon_start > horizon_end {
        return segments;
    }

    let mut month_start = date_math::start_of_month(horizon_start);
    let mut cursor = 0usize;
    let mut segment_id = 0u32;

    while month_start <= horizon_end {
        let window_start = month_start.max(horizon_start);
        let window_end = date_math::end_of_month(month_start).min(horizon_end);

        let start_idx = cursor;
        let mut end_idx = cursor;
        while end_idx < events.len() && events[end_idx].date <= window_end {
            end_idx += 1;
        }
        let segment_events_slice = &events[start_idx..end_idx];
        cursor = end_idx;

        let mut affected = FxHashSet::default();
        for event in segment_events_slice {
            for id in affected_account_ids(event) {
                affected.insert(id);
            }
        }

        let cache_key = compute_cache_key(segment_events_slice);
        segments.push(Segment {
            id: crate::model::SegmentId(segment_id),
            start_date: window_start,
            end_date: window_end,
            events: segment_events_slice.to_vec(),
            affected_account_ids: affected,
            cache_key,
            cached: false,
        });
        segment_id += 1;
        month_start = date_math::add_months_clamped(month_start, 1);
    }

    segments
}

/// Re-sample every Monte-Carlo-tagged Bill/Interest event in place,
/// preserving event identity — the "shallow clone that re-samples
/// stochastic amounts/rates" the spec calls for (spec.md §4.1, §5). The
/// caller is responsible for the clone itself (`events.clone()`); this
/// function only mutates the resolved values.
pub fn resample_monte_carlo(
    mut events: Vec<TimelineEvent>,
    accounts: &AccountManager,
    resolver: &dyn VariableResolver,
    sample_provider: &dyn MonteCarloSampleProvider,
    simulation: SimulationId,
) -> Result<Vec<TimelineEvent>> {
    for event in &mut events {
        match &mut event.payload {
            EventPayload::Bill { bill_id, resolved_amount, symbolic, .. } if symbolic.is_none() => {
                if let Some(bill) = find_bill(accounts, *bill_id) {
                    if bill.is_monte_carlo() {
                        let (amount, _) = resolve_bill_amount(bill, event.date, resolver, sample_provider, simulation)?;
                        *resolved_amount = amount;
                    }
                }
            }
            EventPayload::BillTransfer { bill_id, resolved_amount, symbolic, .. } if symbolic.is_none() => {
                if let Some(bill) = find_bill(accounts, *bill_id) {
                    if bill.is_monte_carlo() {
                        let (amount, _) = resolve_bill_amount(bill, event.date, resolver, sample_provider, simulation)?;
                        *resolved_amount = amount;
                    }
                }
            }
            EventPayload::Interest { interest_id, rate, .. } => {
                if let Some(interest) = find_interest(accounts, *interest_id) {
                    if let Some(sample_type) = &interest.monte_carlo_sample_type {
                        *rate = require_sample(sample_provider, sample_type, event.date)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(events)
}

fn find_bill(accounts: &AccountManager, id: crate::model::BillId) -> Option<&Bill> {
    accounts.iter().flat_map(|a| a.bills.iter()).find(|b| b.id == id)
}

fn find_interest(accounts: &AccountManager, id: crate::model::InterestId) -> Option<&Interest> {
    accounts.iter().flat_map(|a| a.interest.iter()).find(|i| i.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, AccountType, Activity, AmountSpec, DateSpec};
    use crate::resolver::InMemoryVariableResolver;

    fn ctx() -> GenerationContext {
        GenerationContext {
            today: jiff::civil::date(2025, 1, 1),
            horizon_start: jiff::civil::date(2025, 1, 1),
            horizon_end: jiff::civil::date(2025, 12, 31),
            simulation: SimulationId(0),
        }
    }

    #[test]
    fn non_transfer_activity_generates_one_event() {
        let mut account = Account::new(AccountId(1), "Checking", AccountType::Checking, 100.0);
        account.activities.push(Activity {
            id: crate::model::ActivityId(1),
            name: "Gift".into(),
            date: DateSpec::Fixed(jiff::civil::date(2025, 6, 1)),
            category: "Income.Gift".into(),
            amount: AmountSpec::Fixed(50.0),
            is_transfer: false,
            fro: None,
            to: None,
            spending_category: None,
            flag: false,
            flag_color: None,
        });
        let manager = AccountManager::new(vec![account], Vec::new(), Vec::new());
        let resolver = InMemoryVariableResolver::new();
        let sample_provider = crate::resolver::InMemorySampleProvider::new(1);
        let mut warnings = Vec::new();
        let events =
            generate_events(&manager, &[], &resolver, &sample_provider, &ctx(), &mut warnings).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Activity);
    }

    #[test]
    fn unresolvable_transfer_is_dropped_with_warning() {
        let mut account = Account::new(AccountId(1), "Checking", AccountType::Checking, 100.0);
        account.activities.push(Activity {
            id: crate::model::ActivityId(1),
            name: "Mystery transfer".into(),
            date: DateSpec::Fixed(jiff::civil::date(2025, 6, 1)),
            category: "Transfer".into(),
            amount: AmountSpec::Fixed(50.0),
            is_transfer: true,
            fro: Some("Nonexistent".into()),
            to: Some("AlsoMissing".into()),
            spending_category: None,
            flag: false,
            flag_color: None,
        });
        let manager = AccountManager::new(vec![account], Vec::new(), Vec::new());
        let resolver = InMemoryVariableResolver::new();
        let sample_provider = crate::resolver::InMemorySampleProvider::new(1);
        let mut warnings = Vec::new();
        let events =
            generate_events(&manager, &[], &resolver, &sample_provider, &ctx(), &mut warnings).unwrap();
        assert!(events.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DanglingReference);
    }

    #[test]
    fn segmentation_groups_by_calendar_month() {
        let mut account = Account::new(AccountId(1), "Checking", AccountType::Checking, 100.0);
        for (month, day) in [(1, 5), (1, 20), (3, 1)] {
            account.activities.push(Activity {
                id: crate::model::ActivityId(month as u32 * 100 + day as u32),
                name: "x".into(),
                date: DateSpec::Fixed(jiff::civil::date(2025, month, day)),
                category: "Misc".into(),
                amount: AmountSpec::Fixed(10.0),
                is_transfer: false,
                fro: None,
                to: None,
                spending_category: None,
                flag: false,
                flag_color: None,
            });
        }
        let manager = AccountManager::new(vec![account], Vec::new(), Vec::new());
        let resolver = InMemoryVariableResolver::new();
        let sample_provider = crate::resolver::InMemorySampleProvider::new(1);
        let mut warnings = Vec::new();
        let segments = generate_timeline(&manager, &[], &resolver, &sample_provider, &ctx(), &mut warnings).unwrap();
        assert_eq!(segments[0].events.len(), 2);
        assert_eq!(segments[1].events.len(), 0);
        assert_eq!(segments[2].events.len(), 1);
    }
}
