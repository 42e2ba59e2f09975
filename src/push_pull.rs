//! Push/Pull Handler (spec.md §4.4): end-of-segment liquidity management.
//! Drains the lowest-priority pullable accounts first, the same
//! priority-ordered-selection idiom the teacher's `liquidation.rs` applies
//! to lot selection, generalized here to whole accounts.

use jiff::civil::Date;

use crate::account_manager::AccountManager;
use crate::balance_tracker::BalanceTracker;
use crate::model::{AccountId, AmountSpec, epoch_millis};

/// Whether an `AutoTransfer` drains a reserve into a needy account or
/// skims a surplus out to a push destination — the Segment Processor only
/// attributes withdrawal tax to the former (spec.md §4.3 "tax": "for
/// pull-originating activities ... the withdrawal tax").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoTransferKind {
    Pull,
    Push,
}

/// One auto-generated transfer leg the Push/Pull Handler wants applied:
/// `amount` drains `from` and credits `to`, both already the correctly
/// signed legs.
#[derive(Debug, Clone)]
pub struct AutoTransfer {
    pub id: String,
    pub category: &'static str,
    pub kind: AutoTransferKind,
    pub date: Date,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: f64,
}

impl AutoTransfer {
    #[must_use]
    pub fn from_account_amount(&self) -> AmountSpec {
        AmountSpec::Fixed(-self.amount)
    }

    #[must_use]
    pub fn to_account_amount(&self) -> AmountSpec {
        AmountSpec::Fixed(self.amount)
    }
}

/// Evaluate pull/push need for one account at the end of a segment and
/// produce the auto-transfers required, without applying them — the caller
/// (Segment Processor / Engine Orchestrator) applies them and triggers the
/// bounded reprocess (spec.md §4.4).
#[must_use]
pub fn evaluate_account(
    accounts: &AccountManager,
    balances: &BalanceTracker,
    account_id: AccountId,
    segment_start: Date,
    today: Date,
) -> Vec<AutoTransfer> {
    let Some(account) = accounts.get(account_id) else { return Vec::new() };
    if !account.performs_pulls && !account.performs_pushes {
        return Vec::new();
    }
    if let Some(push_start) = account.push_start {
        if segment_start < push_start {
            return Vec::new();
        }
    }
    if let Some(push_end) = account.push_end {
        if segment_start > push_end {
            return Vec::new();
        }
    }
    if segment_start < today {
        return Vec::new();
    }
    let Some(minimum_balance) = account.minimum_balance else { return Vec::new() };
    let Some(range) = balances.get_range(account_id) else { return Vec::new() };

    if account.performs_pulls && range.min < minimum_balance {
        return pull_transfers(accounts, balances, account, minimum_balance, range.min, segment_start);
    }

    let minimum_pull_amount = account.minimum_pull_amount.unwrap_or(0.0);
    if account.performs_pushes && range.min > minimum_balance + minimum_pull_amount * 4.0 {
        if let Some(push_account) = account.push_account {
            let push_amount = range.min - minimum_balance - minimum_pull_amount * 4.0;
            return vec![auto_transfer("AUTO-PUSH", AutoTransferKind::Push, segment_start, account.id, account.id, push_account, push_amount)];
        }
    }
    Vec::new()
}

fn pull_transfers(
    accounts: &AccountManager,
    balances: &BalanceTracker,
    account: &crate::model::Account,
    minimum_balance: f64,
    min_observed: f64,
    segment_start: Date,
) -> Vec<AutoTransfer> {
    let minimum_pull_amount = account.minimum_pull_amount.unwrap_or(0.0);
    let mut remaining = (minimum_balance - min_observed).max(minimum_pull_amount);
    let mut transfers = Vec::new();
    // Track balances consumed by transfers generated so far this call,
    // since the Balance Tracker itself isn't mutated until the caller
    // applies them.
    let mut drawn_down: rustc_hash::FxHashMap<AccountId, f64> = rustc_hash::FxHashMap::default();

    for &candidate_id in accounts.pull_priority_catalog() {
        if remaining <= 0.0 {
            break;
        }
        if candidate_id == account.id {
            continue;
        }
        let Some(candidate) = accounts.get(candidate_id) else { continue };
        let Some(candidate_min_balance) = candidate.minimum_balance else { continue };
        let current_balance =
            balances.get_balance(candidate_id) - drawn_down.get(&candidate_id).copied().unwrap_or(0.0);
        if current_balance <= candidate_min_balance {
            continue;
        }
        let available = current_balance - candidate_min_balance;
        let draw = remaining.min(available);
        if draw <= 0.0 {
            continue;
        }
        *drawn_down.entry(candidate_id).or_insert(0.0) += draw;
        remaining -= draw;
        transfers.push(auto_transfer("AUTO-PULL", AutoTransferKind::Pull, segment_start, account.id, candidate_id, account.id, draw));
    }
    transfers
}

/// `owning_account` is the account whose liquidity need drove this transfer
/// — the puller for `AUTO-PULL`, the pusher for `AUTO-PUSH` — and is what
/// the `{accountId}` slot of the auto-transfer id names (spec.md §4.4).
fn auto_transfer(id_prefix: &'static str, kind: AutoTransferKind, date: Date, owning_account: AccountId, from: AccountId, to: AccountId, amount: f64) -> AutoTransfer {
    AutoTransfer {
        id: format!("{id_prefix}_{}_{}", owning_account.0, epoch_millis(date)),
        category: "Ignore.Transfer",
        kind,
        date,
        from,
        to,
        amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, AccountType};

    fn account(id: u32, name: &str, balance: f64, min: f64) -> Account {
        let mut a = Account::new(AccountId(id), name, AccountType::Checking, balance);
        a.balance = balance;
        a.minimum_balance = Some(min);
        a.pull_priority = id as i32;
        a
    }

    #[test]
    fn pull_drains_lowest_priority_account_first() {
        let mut checking = account(1, "Checking", 50.0, 500.0);
        checking.performs_pulls = true;
        let savings = account(2, "Savings", 2000.0, 100.0);

        let manager = AccountManager::new(vec![checking, savings], Vec::new(), Vec::new());
        let mut balances = BalanceTracker::new([(AccountId(1), 50.0), (AccountId(2), 2000.0)]);
        balances.reset_segment_ranges();
        balances.adjust_balance(AccountId(1), jiff::civil::date(2025, 1, 1), 0.0);

        let transfers = evaluate_account(
            &manager,
            &balances,
            AccountId(1),
            jiff::civil::date(2025, 1, 1),
            jiff::civil::date(2024, 1, 1),
        );
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from, AccountId(2));
        assert_eq!(transfers[0].to, AccountId(1));
        assert!((transfers[0].amount - 450.0).abs() < 1e-9);
    }

    #[test]
    fn push_moves_surplus_to_push_account() {
        let mut checking = account(1, "Checking", 5000.0, 500.0);
        checking.performs_pushes = true;
        checking.push_account = Some(AccountId(2));
        let savings = account(2, "Savings", 0.0, 0.0);

        let manager = AccountManager::new(vec![checking, savings], Vec::new(), Vec::new());
        let mut balances = BalanceTracker::new([(AccountId(1), 5000.0), (AccountId(2), 0.0)]);
        balances.reset_segment_ranges();

        let transfers = evaluate_account(
            &manager,
            &balances,
            AccountId(1),
            jiff::civil::date(2025, 1, 1),
            jiff::civil::date(2024, 1, 1),
        );
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].category, "Ignore.Transfer");
        assert!((transfers[0].amount - 4500.0).abs() < 1e-9);
    }
}
