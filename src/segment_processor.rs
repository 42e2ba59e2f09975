//! Segment Processor (spec.md §4.3): applies every event in a segment, in
//! priority-then-insertion order, producing consolidated activities and
//! updating balances. Dispatches on `EventPayload`'s tag — a tagged variant
//! with one canonical handler per case, not a trait-object class hierarchy
//! (spec.md §9 "Polymorphism"), mirroring the teacher's `apply_eval_event`
//! match-per-variant style.

use jiff::civil::Date;
use rustc_hash::FxHashMap;

use crate::account_manager::AccountManager;
use crate::balance_tracker::BalanceTracker;
use crate::error::{ConfigurationError, Result};
use crate::model::{
    AccountId, AmountSpec, BillId, CategoryId, ConsolidatedActivity, EventPayload, InterestId,
    RmdTable, Segment, SimulationId, SpendingCategory, SymbolicAmount, TimelineEvent,
};
use crate::push_pull::{AutoTransfer, AutoTransferKind};
use crate::resolver::{HistoricalTables, VariableResolver, resolve_variable_amount};
use crate::retirement::{pension_monthly, social_security_monthly};
use crate::spending_tracker::SpendingTrackerManager;

/// Per-account, per-calendar-year tax inputs: taxable interest accrued, and
/// the magnitude of every withdrawal that should attract
/// `withdrawalTaxRate`/`earlyWithdrawlPenalty` (spec.md §4.3 "tax").
#[derive(Debug, Clone, Default)]
struct TaxLedger {
    interest_by_year: FxHashMap<(AccountId, i16), f64>,
    withdrawals_by_year: FxHashMap<(AccountId, i16), Vec<(Date, f64)>>,
}

impl TaxLedger {
    fn record_interest(&mut self, account: AccountId, date: Date, amount: f64) {
        *self.interest_by_year.entry((account, date.year())).or_insert(0.0) += amount;
    }

    fn record_withdrawal(&mut self, account: AccountId, date: Date, magnitude: f64) {
        self.withdrawals_by_year.entry((account, date.year())).or_default().push((date, magnitude));
    }

    /// The prior-calendar-year tax liability attributable to `tax_account`
    /// (spec.md §4.3 "tax"): taxable interest routed to it via other
    /// accounts' `interestPayAccount`, plus its own pull/RMD withdrawal tax.
    fn liability_for(&self, accounts: &AccountManager, tax_account: AccountId, prior_year: i16) -> f64 {
        let mut total = 0.0;
        for account in accounts.iter() {
            if account.interest_pay_account == Some(tax_account) {
                let interest = self.interest_by_year.get(&(account.id, prior_year)).copied().unwrap_or(0.0);
                total += interest * account.interest_tax_rate;
            }
        }
        if let (Some(withdrawals), Some(account)) =
            (self.withdrawals_by_year.get(&(tax_account, prior_year)), accounts.get(tax_account))
        {
            for &(date, magnitude) in withdrawals {
                total += magnitude * account.withdrawal_tax_rate;
                if let Some(early_date) = account.early_withdrawl_date {
                    if date < early_date {
                        total += magnitude * account.early_withdrawl_penalty;
                    }
                }
            }
        }
        total
    }
}

/// Collaborators the Segment Processor consults but does not own (spec.md
/// §4.3, §4.6).
pub struct SegmentContext<'a> {
    pub accounts: &'a AccountManager,
    pub resolver: &'a dyn VariableResolver,
    pub historical: &'a dyn HistoricalTables,
    pub rmd_table: &'a RmdTable,
    pub spending_categories: &'a [SpendingCategory],
    pub engine_start: Date,
    pub simulation: SimulationId,
}

/// Consolidated activities produced this segment, keyed by owning account.
pub type ActivityLog = FxHashMap<AccountId, Vec<ConsolidatedActivity>>;

#[derive(Debug, Default)]
pub struct SegmentProcessor {
    tax_ledger: TaxLedger,
}

impl SegmentProcessor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every event of `segment` in order, skipping any already
    /// recorded in `balances`' processed-event set (spec.md §4.2
    /// idempotency).
    pub fn process_segment(
        &mut self,
        segment: &Segment,
        balances: &mut BalanceTracker,
        spending: &mut SpendingTrackerManager,
        ctx: &SegmentContext,
        output: &mut ActivityLog,
    ) -> Result<()> {
        for event in &segment.events {
            if balances.has_processed(event.id) {
                continue;
            }
            self.apply_event(event, balances, spending, ctx, output)?;
            balances.mark_processed(event.id);
        }
        Ok(())
    }

    /// Apply one Push/Pull-generated transfer: both legs as a flagged
    /// `Ignore.Transfer` pair (spec.md §4.4 "flag true, flag color
    /// indigo"), and — for pulls only — the source leg's magnitude into
    /// the tax ledger as a withdrawal (spec.md §4.3 "pull-originating
    /// activities").
    pub fn apply_auto_transfer(
        &mut self,
        transfer: &AutoTransfer,
        balances: &mut BalanceTracker,
        output: &mut ActivityLog,
    ) {
        balances.adjust_balance(transfer.from, transfer.date, -transfer.amount);
        balances.adjust_balance(transfer.to, transfer.date, transfer.amount);
        if transfer.kind == AutoTransferKind::Pull {
            self.tax_ledger.record_withdrawal(transfer.from, transfer.date, transfer.amount);
        }
        let name = match transfer.kind {
            AutoTransferKind::Pull => "Auto Pull",
            AutoTransferKind::Push => "Auto Push",
        };
        push_activity(output, ConsolidatedActivity {
            id: transfer.id.clone(),
            name: name.to_string(),
            category: transfer.category.to_string(),
            flag: true,
            flag_color: Some("indigo".to_string()),
            is_transfer: true,
            fro: None,
            to: None,
            amount: -transfer.amount,
            amount_is_variable: false,
            amount_variable: None,
            date: transfer.date,
            date_is_variable: false,
            date_variable: None,
            balance: balances.get_balance(transfer.from),
            bill_id: None,
            first_bill: false,
            interest_id: None,
            first_interest: false,
            spending_category: None,
            account_id: transfer.from,
            source_activity_id: None,
        });
        push_activity(output, ConsolidatedActivity {
            id: transfer.id.clone(),
            name: name.to_string(),
            category: transfer.category.to_string(),
            flag: true,
            flag_color: Some("indigo".to_string()),
            is_transfer: true,
            fro: None,
            to: None,
            amount: transfer.amount,
            amount_is_variable: false,
            amount_variable: None,
            date: transfer.date,
            date_is_variable: false,
            date_variable: None,
            balance: balances.get_balance(transfer.to),
            bill_id: None,
            first_bill: false,
            interest_id: None,
            first_interest: false,
            spending_category: None,
            account_id: transfer.to,
            source_activity_id: None,
        });
    }

    fn apply_event(
        &mut self,
        event: &TimelineEvent,
        balances: &mut BalanceTracker,
        spending: &mut SpendingTrackerManager,
        ctx: &SegmentContext,
        output: &mut ActivityLog,
    ) -> Result<()> {
        match &event.payload {
            EventPayload::Interest { interest_id, rate, first_interest } => {
                let account_id = event.account_id;
                let balance = balances.get_balance(account_id);
                let amount = balance * rate;
                balances.adjust_balance(account_id, event.date, amount);
                self.tax_ledger.record_interest(account_id, event.date, amount);
                push_activity(output, base_activity(event, account_id, "Interest".into(), "Banking.Interest".into(), amount, balances.get_balance(account_id))
                    .with_interest(*interest_id, *first_interest));
            }

            EventPayload::Activity { name, category, amount, spending_category, flag, flag_color } => {
                let account_id = event.account_id;
                let counterparty_balance = balances.get_balance(account_id);
                let resolved = resolve_amount(amount, ctx.resolver, ctx.simulation, counterparty_balance)?;
                balances.adjust_balance(account_id, event.date, resolved);
                if let Some(cat) = spending_category {
                    spending.record_activity(*cat, event.date, resolved);
                }
                push_activity(output, base_activity(event, account_id, name.clone(), category.clone(), resolved, balances.get_balance(account_id))
                    .with_spending_category(*spending_category)
                    .with_flag(*flag, flag_color.clone())
                    .with_variable_amount(variable_name_of(amount)));
            }

            EventPayload::ActivityTransfer { name, category, amount, from_account_id, to_account_id, flag, flag_color } => {
                apply_transfer(ctx.accounts, balances, event, name, category, amount, *from_account_id, *to_account_id, None, false, *flag, flag_color.clone(), ctx, output)?;
            }

            EventPayload::Bill { bill_id, name, category, resolved_amount, symbolic, first_bill, spending_category, flag, flag_color } => {
                let account_id = event.account_id;
                let counterparty_balance = balances.get_balance(account_id);
                let outflow = -resolve_bill_like_amount(*resolved_amount, symbolic, counterparty_balance);
                balances.adjust_balance(account_id, event.date, outflow);
                if let Some(cat) = spending_category {
                    spending.record_activity(*cat, event.date, outflow);
                }
                push_activity(output, base_activity(event, account_id, name.clone(), category.clone(), outflow, balances.get_balance(account_id))
                    .with_bill(*bill_id, *first_bill)
                    .with_spending_category(*spending_category)
                    .with_flag(*flag, flag_color.clone()));
            }

            EventPayload::BillTransfer { bill_id, name, category, resolved_amount, symbolic, first_bill, from_account_id, to_account_id, flag, flag_color } => {
                let amount = bill_amount_spec(*resolved_amount, symbolic);
                apply_transfer(ctx.accounts, balances, event, name, category, &amount, *from_account_id, *to_account_id, Some(*bill_id), *first_bill, *flag, flag_color.clone(), ctx, output)?;
            }

            EventPayload::Pension { pension_id, .. } => {
                if let Some(pension) = ctx.accounts.pensions().iter().find(|p| p.id == *pension_id) {
                    let amount = pension_monthly(pension, event.date);
                    balances.adjust_balance(event.account_id, event.date, amount);
                    push_activity(output, base_activity(event, event.account_id, pension.paycheck_name.clone(), pension.category.clone(), amount, balances.get_balance(event.account_id)));
                }
            }

            EventPayload::SocialSecurity { social_security_id, .. } => {
                if let Some(record) = ctx.accounts.social_security().iter().find(|s| s.id == *social_security_id) {
                    let amount = social_security_monthly(record, ctx.historical.average_wage_index(), ctx.historical.bend_points(), event.date);
                    balances.adjust_balance(event.account_id, event.date, amount);
                    push_activity(output, base_activity(event, event.account_id, record.paycheck_name.clone(), record.category.clone(), amount, balances.get_balance(event.account_id)));
                }
            }

            EventPayload::Rmd { rmd_account_id } => {
                let account_id = event.account_id;
                if let Some(account) = ctx.accounts.get(account_id) {
                    if let Some(dob) = account.account_owner_dob {
                        let age = crate::date_math::years_between(dob, event.date).max(0) as u8;
                        if let Some(divisor) = ctx.rmd_table.divisor_for_age(age) {
                            let year_end_balance = balances.get_balance(account_id);
                            let amount = (year_end_balance / divisor).max(0.0);
                            balances.adjust_balance(account_id, event.date, -amount);
                            balances.adjust_balance(*rmd_account_id, event.date, amount);
                            self.tax_ledger.record_withdrawal(account_id, event.date, amount);
                            let from_name = name_of(ctx.accounts, account_id);
                            let to_name = name_of(ctx.accounts, *rmd_account_id);
                            push_activity(output, base_activity(event, account_id, "RMD".into(), "Banking.Transfer".into(), -amount, balances.get_balance(account_id))
                                .with_transfer(Some(from_name.clone()), Some(to_name.clone())));
                            push_activity(output, base_activity(event, *rmd_account_id, "RMD".into(), "Banking.Transfer".into(), amount, balances.get_balance(*rmd_account_id))
                                .with_transfer(Some(from_name), Some(to_name)));
                        }
                    }
                }
            }

            EventPayload::Tax => {
                let account_id = event.account_id;
                let prior_year = event.date.year() - 1;
                let liability = self.tax_ledger.liability_for(ctx.accounts, account_id, prior_year);
                if liability != 0.0 {
                    balances.adjust_balance(account_id, event.date, -liability);
                    push_activity(output, base_activity(event, account_id, "Taxes".into(), "Banking.Taxes".into(), -liability, balances.get_balance(account_id)));
                }
            }

            EventPayload::SpendingTracker { category_id, period_end, virtual_event, .. } => {
                let Some(category) = ctx.spending_categories.iter().find(|c| c.id == *category_id) else {
                    return Ok(());
                };
                if *virtual_event {
                    spending.mark_period_processed(*category_id, *period_end);
                    spending.reset_period_spending(*category_id);
                    return Ok(());
                }
                let snapshot = spending.snapshot(category, ctx.engine_start, *period_end);
                if snapshot.remainder > 0.0 {
                    let account_id = category.target_account;
                    balances.adjust_balance(account_id, event.date, -snapshot.remainder);
                    spending.record_activity(*category_id, *period_end, -snapshot.remainder);
                    push_activity(output, base_activity(event, account_id, "Remainder".into(), category.name.clone(), -snapshot.remainder, balances.get_balance(account_id))
                        .with_spending_category(Some(*category_id)));
                }
                spending.update_carry(category, ctx.engine_start, *period_end);
                spending.reset_period_spending(*category_id);
                spending.mark_period_processed(*category_id, *period_end);
            }
        }
        Ok(())
    }
}

/// The resolver-keyed variable name behind an `AmountSpec::Variable`, if
/// this amount came from one (spec.md §6 "amountIsVariable"/"amountVariable").
fn variable_name_of(amount: &AmountSpec) -> Option<String> {
    match amount {
        AmountSpec::Variable(name) => Some(name.clone()),
        _ => None,
    }
}

fn resolve_amount(amount: &AmountSpec, resolver: &dyn VariableResolver, simulation: SimulationId, counterparty_balance: f64) -> Result<f64> {
    match amount {
        AmountSpec::Fixed(v) => Ok(*v),
        AmountSpec::Variable(name) => resolve_variable_amount(resolver, name, simulation)
            .ok_or_else(|| ConfigurationError::MissingVariable(name.clone()).into()),
        AmountSpec::Symbolic(symbol) => Ok(symbol.resolve(counterparty_balance)),
    }
}

/// A Bill's generation-time resolution collapses to either a plain f64 (for
/// Fixed/Variable) or a pass-through symbolic marker; fold both back into
/// a single `AmountSpec` so transfer legs can share `resolve_amount`.
fn bill_amount_spec(resolved_amount: f64, symbolic: &Option<SymbolicAmount>) -> AmountSpec {
    match symbolic {
        Some(s) => AmountSpec::Symbolic(*s),
        None => AmountSpec::Fixed(resolved_amount),
    }
}

fn resolve_bill_like_amount(resolved_amount: f64, symbolic: &Option<SymbolicAmount>, counterparty_balance: f64) -> f64 {
    match symbolic {
        Some(s) => s.resolve(counterparty_balance),
        None => resolved_amount,
    }
}

fn name_of(accounts: &AccountManager, id: AccountId) -> String {
    accounts.get(id).map(|a| a.name.clone()).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn apply_transfer(
    accounts: &AccountManager,
    balances: &mut BalanceTracker,
    event: &TimelineEvent,
    name: &str,
    category: &str,
    amount: &AmountSpec,
    from_account_id: Option<AccountId>,
    to_account_id: Option<AccountId>,
    bill_id: Option<BillId>,
    first_bill: bool,
    flag: bool,
    flag_color: Option<String>,
    ctx: &SegmentContext,
    output: &mut ActivityLog,
) -> Result<()> {
    let counterparty_balance = match (from_account_id, to_account_id) {
        (_, Some(to_id)) => balances.get_balance(to_id),
        (Some(from_id), None) => balances.get_balance(from_id),
        (None, None) => 0.0,
    };
    let mut magnitude = resolve_amount(amount, ctx.resolver, ctx.simulation, counterparty_balance)?.abs();
    let variable_name = variable_name_of(amount);

    // Loan/Credit destinations never receive more than clears the balance
    // (spec.md §4.3 transfer capping); non-capping sources transferring
    // into a Savings/Investment reserve cap at the source's available
    // balance.
    if let Some(to_id) = to_account_id {
        if let Some(to_acct) = accounts.get(to_id) {
            if to_acct.account_type.caps_incoming_transfer_at_balance() {
                magnitude = magnitude.min(balances.get_balance(to_id).abs());
            }
        }
    }
    if let (Some(from_id), Some(to_id)) = (from_account_id, to_account_id) {
        let from_caps = accounts.get(from_id).map(|a| a.account_type.caps_incoming_transfer_at_balance()).unwrap_or(false);
        let to_is_reserve = accounts.get(to_id).map(|a| a.account_type.is_reserve_destination()).unwrap_or(false);
        if !from_caps && to_is_reserve {
            magnitude = magnitude.min(balances.get_balance(from_id).max(0.0));
        }
    }

    let from_name = from_account_id.map(|id| name_of(accounts, id));
    let to_name = to_account_id.map(|id| name_of(accounts, id));

    if let Some(from_id) = from_account_id {
        balances.adjust_balance(from_id, event.date, -magnitude);
        let mut activity = base_activity(event, from_id, name.to_string(), category.to_string(), -magnitude, balances.get_balance(from_id))
            .with_transfer(from_name.clone(), to_name.clone())
            .with_flag(flag, flag_color.clone())
            .with_variable_amount(variable_name.clone());
        if let Some(bid) = bill_id {
            activity = activity.with_bill(bid, first_bill);
        }
        push_activity(output, activity);
    }
    if let Some(to_id) = to_account_id {
        balances.adjust_balance(to_id, event.date, magnitude);
        let mut activity = base_activity(event, to_id, name.to_string(), category.to_string(), magnitude, balances.get_balance(to_id))
            .with_transfer(from_name, to_name)
            .with_flag(flag, flag_color)
            .with_variable_amount(variable_name);
        if let Some(bid) = bill_id {
            activity = activity.with_bill(bid, first_bill);
        }
        push_activity(output, activity);
    }
    Ok(())
}

fn push_activity(output: &mut ActivityLog, activity: ConsolidatedActivity) {
    output.entry(activity.account_id).or_default().push(activity);
}

/// A `ConsolidatedActivity` with every field at its non-transfer, non-bill,
/// non-interest, non-flagged default — the common shape every event
/// handler starts from before layering on its type-specific fields.
fn base_activity(event: &TimelineEvent, account_id: AccountId, name: String, category: String, amount: f64, balance: f64) -> ConsolidatedActivity {
    ConsolidatedActivity {
        id: format!("EVT-{}-{}", event.id.0, account_id.0),
        name,
        category,
        flag: false,
        flag_color: None,
        is_transfer: false,
        fro: None,
        to: None,
        amount,
        amount_is_variable: false,
        amount_variable: None,
        date: event.date,
        date_is_variable: false,
        date_variable: None,
        balance,
        bill_id: None,
        first_bill: false,
        interest_id: None,
        first_interest: false,
        spending_category: None,
        account_id,
        source_activity_id: None,
    }
}

/// Small fluent helpers over the field-complete `ConsolidatedActivity`
/// value `base_activity` returns, letting each dispatch arm layer on just
/// the fields its event type actually carries.
trait ConsolidatedActivityExt: Sized {
    fn with_interest(self, interest_id: InterestId, first_interest: bool) -> Self;
    fn with_bill(self, bill_id: BillId, first_bill: bool) -> Self;
    fn with_transfer(self, fro: Option<String>, to: Option<String>) -> Self;
    fn with_flag(self, flag: bool, flag_color: Option<String>) -> Self;
    fn with_spending_category(self, category: Option<CategoryId>) -> Self;
    fn with_variable_amount(self, variable_name: Option<String>) -> Self;
}

impl ConsolidatedActivityExt for ConsolidatedActivity {
    fn with_interest(mut self, interest_id: InterestId, first_interest: bool) -> Self {
        self.interest_id = Some(interest_id);
        self.first_interest = first_interest;
        self
    }

    fn with_bill(mut self, bill_id: BillId, first_bill: bool) -> Self {
        self.bill_id = Some(bill_id);
        self.first_bill = first_bill;
        self
    }

    fn with_transfer(mut self, fro: Option<String>, to: Option<String>) -> Self {
        self.is_transfer = true;
        self.fro = fro;
        self.to = to;
        self
    }

    fn with_flag(mut self, flag: bool, flag_color: Option<String>) -> Self {
        self.flag = flag;
        self.flag_color = flag_color;
        self
    }

    fn with_spending_category(mut self, category: Option<CategoryId>) -> Self {
        self.spending_category = category;
        self
    }

    fn with_variable_amount(mut self, variable_name: Option<String>) -> Self {
        self.amount_is_variable = variable_name.is_some();
        self.amount_variable = variable_name;
        self
    }
}
