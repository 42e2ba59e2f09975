//! Collaborator-facing value types shared between the account model and the
//! `resolver` module's traits (spec.md §6).

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

/// A named simulation run, scoping variable resolution (spec.md §6:
/// "Variable Resolver `(name, simulation) -> AmountOrDate`").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationId(pub u32);

/// The value a named variable resolves to: either a dollar amount or a
/// date, depending on where it's referenced from (`Activity`/`Bill` amount
/// vs. date fields, retirement `startDate`, etc).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum AmountOrDate {
    Amount(f64),
    Date(Date),
}

impl AmountOrDate {
    #[must_use]
    pub fn as_amount(self) -> Option<f64> {
        match self {
            AmountOrDate::Amount(a) => Some(a),
            AmountOrDate::Date(_) => None,
        }
    }

    #[must_use]
    pub fn as_date(self) -> Option<Date> {
        match self {
            AmountOrDate::Date(d) => Some(d),
            AmountOrDate::Amount(_) => None,
        }
    }
}
