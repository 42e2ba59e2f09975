//! Bill — a recurring activity generator with optional ceiling-rounded
//! inflation (spec.md §3, §4.1 "Bill amount resolution").

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::activity::AmountSpec;
use super::ids::{BillId, CategoryId};
use crate::date_math::{self, Period};

/// Maximum occurrences a single generator may emit before the loop guard in
/// spec.md §3/§4.1 trips (`GeneratorOverflow`).
pub const MAX_GENERATOR_OCCURRENCES: u32 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub name: String,
    pub category: String,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub periods: Period,
    pub every_n: u32,
    pub amount: AmountSpec,
    /// Annual inflation rate applied at each anniversary of `increase_by_date`.
    pub increase_by: f64,
    /// Month/day anchor for inflation anniversaries.
    pub increase_by_date: Date,
    /// Round up to the nearest multiple after each inflation step.
    pub ceiling_multiple: Option<f64>,
    /// Redirects amount/inflation to a stochastic Monte Carlo provider;
    /// when set, `ceiling_multiple` is not applied (spec.md §4.1).
    pub monte_carlo_sample_type: Option<String>,
    pub is_transfer: bool,
    pub fro: Option<String>,
    pub to: Option<String>,
    pub spending_category: Option<CategoryId>,
    pub flag: bool,
    pub flag_color: Option<String>,
}

/// Round `amount` up to the nearest multiple of `multiple`, or pass through
/// unchanged when no ceiling is configured.
#[must_use]
pub fn apply_ceiling(amount: f64, multiple: Option<f64>) -> f64 {
    match multiple {
        Some(m) if m > 0.0 => (amount / m).ceil() * m,
        _ => amount,
    }
}

impl Bill {
    /// Anniversary dates of `increase_by_date` strictly within
    /// `(start_date, through_inclusive]`, in ascending order. Each such date
    /// is one inflation (or Monte Carlo resample) milestone.
    #[must_use]
    pub fn anniversary_dates(&self, through_inclusive: Date) -> Vec<Date> {
        if through_inclusive <= self.start_date {
            return Vec::new();
        }
        let mut dates = Vec::new();
        let mut year = self.start_date.year();
        loop {
            let day = self
                .increase_by_date
                .day()
                .min(date_math::days_in_month(year, self.increase_by_date.month()));
            let candidate = jiff::civil::date(year, self.increase_by_date.month(), day);
            if candidate > self.start_date && candidate <= through_inclusive {
                dates.push(candidate);
            }
            if candidate > through_inclusive {
                break;
            }
            year += 1;
            if year as i32 - self.start_date.year() as i32 > 400 {
                break;
            }
        }
        dates
    }

    /// Resolve a fixed (non-symbolic, already variable-resolved) base amount
    /// through the deterministic ceiling+inflation pipeline: ceiling once,
    /// then re-apply `(1 + increase_by)` and re-ceiling at every anniversary
    /// of `increase_by_date` through `current_date`.
    #[must_use]
    pub fn deterministic_resolved_amount(&self, base_amount: f64, current_date: Date) -> f64 {
        let mut amount = apply_ceiling(base_amount, self.ceiling_multiple);
        for _ in self.anniversary_dates(current_date) {
            amount *= 1.0 + self.increase_by;
            amount = apply_ceiling(amount, self.ceiling_multiple);
        }
        amount
    }

    /// Monte Carlo variant: at each anniversary draw a sample via
    /// `sample_at(date)` and multiply by `(1 + sample)`; no ceiling is ever
    /// applied in this mode (spec.md §4.1).
    pub fn monte_carlo_resolved_amount(
        &self,
        base_amount: f64,
        current_date: Date,
        mut sample_at: impl FnMut(Date) -> f64,
    ) -> f64 {
        let mut amount = base_amount;
        for anniversary in self.anniversary_dates(current_date) {
            amount *= 1.0 + sample_at(anniversary);
        }
        amount
    }

    /// Whether this bill is in Monte Carlo inflation mode.
    #[must_use]
    pub fn is_monte_carlo(&self) -> bool {
        self.monte_carlo_sample_type.is_some()
    }

    /// Generate occurrence dates from `start_date` by `next_date` stepping,
    /// bounded by `self.end_date` and the horizon `through`. Returns an
    /// error-shaped `None` sentinel via the `MAX_GENERATOR_OCCURRENCES`
    /// guard — callers (timeline.rs) check the returned length against the
    /// constant and raise `GeneratorOverflow` themselves so the error can
    /// carry the bill's id.
    #[must_use]
    pub fn occurrences_through(&self, through: Date) -> Vec<Date> {
        let mut dates = Vec::new();
        let mut current = self.start_date;
        let hard_end = match self.end_date {
            Some(d) => d.min(through),
            None => through,
        };
        while current <= hard_end {
            dates.push(current);
            if dates.len() as u32 > MAX_GENERATOR_OCCURRENCES {
                break;
            }
            current = date_math::next_date(current, self.periods, self.every_n);
        }
        dates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill(start: Date, increase_by_date: Date, increase_by: f64, ceiling: Option<f64>) -> Bill {
        Bill {
            id: BillId(1),
            name: "Rent".into(),
            category: "Housing".into(),
            start_date: start,
            end_date: None,
            periods: Period::Month,
            every_n: 1,
            amount: AmountSpec::Fixed(1000.0),
            increase_by,
            increase_by_date,
            ceiling_multiple: ceiling,
            monte_carlo_sample_type: None,
            is_transfer: false,
            fro: None,
            to: None,
            spending_category: None,
            flag: false,
            flag_color: None,
        }
    }

    #[test]
    fn deterministic_inflation_compounds_per_anniversary() {
        let b = bill(
            jiff::civil::date(2023, 1, 1),
            jiff::civil::date(2023, 1, 1),
            0.10,
            None,
        );
        let amount = b.deterministic_resolved_amount(1000.0, jiff::civil::date(2025, 6, 1));
        // two anniversaries passed (2024-01-01, 2025-01-01)
        assert!((amount - 1000.0 * 1.1 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn ceiling_reapplied_each_step() {
        let b = bill(
            jiff::civil::date(2023, 1, 1),
            jiff::civil::date(2023, 1, 1),
            0.10,
            Some(50.0),
        );
        let amount = b.deterministic_resolved_amount(1000.0, jiff::civil::date(2024, 6, 1));
        // 1000 -> ceiling(1000,50)=1000 -> *1.1=1100 -> ceiling=1100
        assert!((amount - 1100.0).abs() < 1e-9);
    }

    #[test]
    fn occurrences_through_respects_end_date() {
        let mut b = bill(
            jiff::civil::date(2025, 1, 1),
            jiff::civil::date(2025, 1, 1),
            0.0,
            None,
        );
        b.end_date = Some(jiff::civil::date(2025, 3, 15));
        let occ = b.occurrences_through(jiff::civil::date(2025, 12, 31));
        assert_eq!(
            occ,
            vec![
                jiff::civil::date(2025, 1, 1),
                jiff::civil::date(2025, 2, 1),
                jiff::civil::date(2025, 3, 1),
            ]
        );
    }
}
