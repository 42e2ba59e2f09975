//! Pension / Social Security input records (spec.md §3) and the historical
//! tables the Retirement Calculator (§4.6) indexes into.

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, PensionId, SocialSecurityId};

/// A requirement set for pension eligibility: an optional minimum age and a
/// minimum years-of-service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ServiceRequirement {
    pub age: Option<u8>,
    pub years_worked: f64,
}

/// Table of `age -> years_worked -> reduction_rate`, sorted-integer-keyed
/// on both axes per spec.md §4.6 ("table keys are sorted integers").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReductionRateTable {
    pub by_age: BTreeMap<u32, BTreeMap<u32, f64>>,
}

impl ReductionRateTable {
    /// Clamped lookup: ages below the minimum tabulated key use the
    /// minimum; ages above the maximum return a reduction factor of `1.0`
    /// (fully unreduced); years-of-service clamp the same way within the
    /// row selected for the (clamped) age.
    #[must_use]
    pub fn reduction_factor(&self, age: u32, years_worked: u32) -> f64 {
        if self.by_age.is_empty() {
            return 1.0;
        }
        let min_age = *self.by_age.keys().next().unwrap();
        let max_age = *self.by_age.keys().next_back().unwrap();
        if age > max_age {
            return 1.0;
        }
        let clamped_age = age.max(min_age);
        // Find the row for the largest tabulated age <= clamped_age, or the
        // minimum row if clamped_age sits below every tabulated key.
        let row = self
            .by_age
            .range(..=clamped_age)
            .next_back()
            .map(|(_, row)| row)
            .unwrap_or_else(|| self.by_age.get(&min_age).unwrap());
        if row.is_empty() {
            return 1.0;
        }
        let min_years = *row.keys().next().unwrap();
        let max_years = *row.keys().next_back().unwrap();
        if years_worked > max_years {
            return 1.0;
        }
        let clamped_years = years_worked.max(min_years);
        *row.range(..=clamped_years)
            .next_back()
            .map(|(_, rate)| rate)
            .unwrap_or_else(|| row.get(&min_years).unwrap())
    }
}

/// Social Security Average Wage Index, keyed by calendar year. Past the
/// last known year, values are linearly extrapolated by the mean observed
/// year-over-year growth rate (spec.md §4.6 step 1).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AverageWageIndex {
    pub by_year: BTreeMap<i32, f64>,
}

impl AverageWageIndex {
    #[must_use]
    pub fn value_for_year(&self, year: i32) -> Option<f64> {
        if let Some(&v) = self.by_year.get(&year) {
            return Some(v);
        }
        extrapolate(&self.by_year, year)
    }
}

/// Social Security bend points `(b1, b2)` by the year of eligibility
/// (`yearTurn62`), same extrapolation rule as the AWI table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BendPointTable {
    pub by_year: BTreeMap<i32, (f64, f64)>,
}

impl BendPointTable {
    #[must_use]
    pub fn bend_points_for_year(&self, year: i32) -> Option<(f64, f64)> {
        if let Some(&bp) = self.by_year.get(&year) {
            return Some(bp);
        }
        let b1 = extrapolate(
            &self.by_year.iter().map(|(&y, &(b1, _))| (y, b1)).collect(),
            year,
        )?;
        let b2 = extrapolate(
            &self.by_year.iter().map(|(&y, &(_, b2))| (y, b2)).collect(),
            year,
        )?;
        Some((b1, b2))
    }
}

/// Linear extrapolation past the last known year by the mean
/// year-over-year growth rate observed in the series (spec.md §4.6).
fn extrapolate(series: &BTreeMap<i32, f64>, year: i32) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    let last_year = *series.keys().next_back().unwrap();
    if year <= last_year {
        return series.get(&year).copied().or_else(|| {
            // Years before the first known entry are not extrapolated
            // backward; use the earliest known value.
            series.values().next().copied()
        });
    }
    let last_value = *series.get(&last_year).unwrap();
    let growth_rates: Vec<f64> = series
        .iter()
        .zip(series.iter().skip(1))
        .filter(|((_, &a), (_, &b))| a > 0.0 && b.is_finite())
        .map(|((_, &a), (_, &b))| b / a - 1.0)
        .collect();
    if growth_rates.is_empty() {
        return Some(last_value);
    }
    let mean_growth = growth_rates.iter().sum::<f64>() / growth_rates.len() as f64;
    let years_ahead = (year - last_year) as i32;
    Some(last_value * (1.0 + mean_growth).powi(years_ahead))
}

/// A Social Security input record (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSecurity {
    pub id: SocialSecurityId,
    pub pay_to_account: AccountId,
    pub paycheck_name: String,
    pub category: String,
    /// Resolved start-of-collection date (from a variable; collection age
    /// drives the reduction factor in §4.6).
    pub start_date: Date,
    pub birth_date: Date,
    /// Prior annual net (nominal) incomes by calendar year, used to build
    /// the AIME series.
    pub prior_annual_incomes: BTreeMap<i32, f64>,
}

/// A Pension input record (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pension {
    pub id: PensionId,
    pub pay_to_account: AccountId,
    pub paycheck_name: String,
    pub category: String,
    pub start_date: Date,
    pub birth_date: Date,
    pub work_start_date: Date,
    pub unreduced_requirements: Vec<ServiceRequirement>,
    pub reduced_requirements: Vec<ServiceRequirement>,
    pub highest_compensation_consecutive_years_to_average: u32,
    pub accrual_factor: f64,
    pub reduced_rate_by_age_then_years_of_service: ReductionRateTable,
    /// Prior annual compensation by calendar year, used for the
    /// highest-consecutive-years average.
    pub prior_annual_compensation: BTreeMap<i32, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_table_clamps_below_min_age() {
        let mut table = ReductionRateTable::default();
        table.by_age.insert(55, BTreeMap::from([(25, 0.8), (30, 0.9)]));
        table.by_age.insert(60, BTreeMap::from([(25, 0.85), (30, 0.95)]));
        assert_eq!(table.reduction_factor(50, 30), 0.9);
    }

    #[test]
    fn reduction_table_above_max_age_is_unreduced() {
        let mut table = ReductionRateTable::default();
        table.by_age.insert(55, BTreeMap::from([(25, 0.8)]));
        assert_eq!(table.reduction_factor(90, 25), 1.0);
    }

    #[test]
    fn reduction_table_s4_scenario() {
        let mut table = ReductionRateTable::default();
        table.by_age.insert(55, BTreeMap::from([(25, 0.8), (30, 0.9)]));
        table.by_age.insert(60, BTreeMap::from([(25, 0.85), (30, 0.95)]));
        assert_eq!(table.reduction_factor(57, 30), 0.9);
    }

    #[test]
    fn awi_extrapolates_by_mean_growth() {
        let mut awi = AverageWageIndex::default();
        awi.by_year.insert(2020, 100.0);
        awi.by_year.insert(2021, 110.0);
        awi.by_year.insert(2022, 121.0);
        // mean growth = 10% exactly
        let v = awi.value_for_year(2023).unwrap();
        assert!((v - 133.1).abs() < 1e-6);
    }
}
