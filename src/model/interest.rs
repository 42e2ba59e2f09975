//! Interest — per-account compounding schedule entries (spec.md §3).

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::InterestId;
use crate::date_math::Period as CompoundPeriod;

/// One entry in an account's interest schedule. For a given account,
/// entries are sorted by `applicable_date`; at any instant the active
/// entry is the latest whose date is `<=` today (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interest {
    pub id: InterestId,
    pub applicable_date: Date,
    /// APR expressed as a fraction (e.g. `0.05` for 5%), applied per the
    /// `compounded` period.
    pub apr: f64,
    pub compounded: CompoundPeriod,
    pub apr_variable: Option<String>,
    pub monte_carlo_sample_type: Option<String>,
}

impl Interest {
    /// Periods per year implied by `compounded` (365/52/12/1), the
    /// denominator `per_period_rate` divides `apr` by.
    #[must_use]
    pub fn periods_per_year(&self) -> f64 {
        match self.compounded {
            CompoundPeriod::Day => 365.0,
            CompoundPeriod::Week => 52.0,
            CompoundPeriod::Month => 12.0,
            CompoundPeriod::Year => 1.0,
        }
    }

    /// Per-period rate derived from the nominal annual APR — simple
    /// division (`apr / periods_per_year`), the everyday "APR / 12 per
    /// month" convention, not an effective-annual-rate geometric
    /// conversion. spec.md §8 S1 (`apr=0.12` monthly compounding reaching
    /// `10,000 · 1.01^3`) is the literal check that pins this down.
    #[must_use]
    pub fn per_period_rate(&self) -> f64 {
        self.apr / self.periods_per_year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_compounding_matches_s1_scenario() {
        let interest = Interest {
            id: InterestId(1),
            applicable_date: jiff::civil::date(2025, 1, 1),
            apr: 0.12,
            compounded: CompoundPeriod::Month,
            apr_variable: None,
            monte_carlo_sample_type: None,
        };
        let rate = interest.per_period_rate();
        assert!((rate - 0.01).abs() < 1e-9);
    }
}
