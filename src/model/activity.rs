//! Activity — manual, one-off (or variable-dated) financial events
//! (spec.md §3).

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::{ActivityId, CategoryId};

/// Half/full-of-counterparty-balance symbolic amounts, resolved at segment
/// time against the transfer counterparty (spec.md §3, §4.7 dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolicAmount {
    Half,
    Full,
    NegHalf,
    NegFull,
}

impl SymbolicAmount {
    /// Resolve against a counterparty balance. Always non-negative for
    /// `Half`/`Full`, non-positive for the negated variants, matching the
    /// symbolic spellings `{HALF}|{FULL}|-{HALF}|-{FULL}`.
    #[must_use]
    pub fn resolve(self, counterparty_balance: f64) -> f64 {
        match self {
            SymbolicAmount::Half => counterparty_balance * 0.5,
            SymbolicAmount::Full => counterparty_balance,
            SymbolicAmount::NegHalf => -(counterparty_balance * 0.5),
            SymbolicAmount::NegFull => -counterparty_balance,
        }
    }
}

/// An amount that is either a literal, a named variable resolved via the
/// Variable Resolver, or one of the symbolic half/full markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AmountSpec {
    Fixed(f64),
    Variable(String),
    Symbolic(SymbolicAmount),
}

impl AmountSpec {
    #[must_use]
    pub fn is_symbolic(&self) -> bool {
        matches!(self, AmountSpec::Symbolic(_))
    }
}

/// A date that is either fixed or resolved via the Variable Resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DateSpec {
    Fixed(Date),
    Variable(String),
}

/// A manual, single (or variable-dated) financial event. Non-transfer
/// activities apply directly to their owning account; transfer activities
/// move money between two named accounts (spec.md §3 invariant: if
/// `is_transfer`, both `fro` and `to` must resolve to account names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub name: String,
    pub date: DateSpec,
    pub category: String,
    pub amount: AmountSpec,
    pub is_transfer: bool,
    /// Historical spelling preserved on the output wire type (spec.md §6);
    /// internally we just call this `fro`/`to` to match.
    pub fro: Option<String>,
    pub to: Option<String>,
    pub spending_category: Option<CategoryId>,
    pub flag: bool,
    pub flag_color: Option<String>,
}

impl Activity {
    #[must_use]
    pub fn is_valid_transfer(&self) -> bool {
        !self.is_transfer || (self.fro.is_some() && self.to.is_some())
    }
}
