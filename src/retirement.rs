//! Retirement Calculator (spec.md §4.6): Social Security AIME/PIA
//! bend-point math and Pension accrual-factor/reduction-factor math.

use crate::date_math;
use crate::model::{AverageWageIndex, BendPointTable, Pension, SocialSecurity};

/// Collection-age factor table (spec.md §4.6 step 4).
#[must_use]
pub fn collection_age_factor(age: u32) -> f64 {
    match age {
        0..=61 => 0.0,
        62 => 0.70,
        63 => 0.75,
        64 => 0.80,
        65 => 13.0 / 15.0,
        66 => 14.0 / 15.0,
        67 => 1.0,
        68 => 1.08,
        69 => 1.16,
        _ => 1.24,
    }
}

/// Average Indexed Monthly Earnings (spec.md §4.6 steps 1-2).
///
/// Each prior year `y <= year_turn_60` is indexed by
/// `awi[year_turn_60] / awi[y]`; years after `year_turn_60` are used at
/// nominal value. The series is padded to 35 entries with zeroes, the top
/// 35 (by value) are kept, averaged, and divided by 12.
#[must_use]
pub fn compute_aime(
    prior_annual_incomes: &std::collections::BTreeMap<i32, f64>,
    awi: &AverageWageIndex,
    year_turn_60: i32,
) -> f64 {
    let awi_at_60 = awi.value_for_year(year_turn_60).unwrap_or(1.0);

    let mut indexed: Vec<f64> = prior_annual_incomes
        .iter()
        .map(|(&year, &income)| {
            if year <= year_turn_60 {
                let awi_y = awi.value_for_year(year).unwrap_or(awi_at_60);
                if awi_y > 0.0 {
                    income * (awi_at_60 / awi_y)
                } else {
                    income
                }
            } else {
                income
            }
        })
        .collect();

    while indexed.len() < 35 {
        indexed.push(0.0);
    }
    indexed.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    indexed.truncate(35);

    let total: f64 = indexed.iter().sum();
    (total / 35.0) / 12.0
}

/// Primary Insurance Amount from AIME and the bend points for the
/// beneficiary's `yearTurn62` (spec.md §4.6 step 3).
#[must_use]
pub fn compute_pia(aime: f64, bend_points: (f64, f64)) -> f64 {
    let (b1, b2) = bend_points;
    0.9 * aime.min(b1) + 0.32 * (aime - b1).max(0.0).min(b2 - b1) + 0.15 * (aime - b2).max(0.0)
}

/// Monthly Social Security payout at `as_of` (spec.md §4.6).
#[must_use]
pub fn social_security_monthly(
    record: &SocialSecurity,
    awi: &AverageWageIndex,
    bend_points: &BendPointTable,
    as_of: jiff::civil::Date,
) -> f64 {
    let year_turn_60 = record.birth_date.year() as i32 + 60;
    let year_turn_62 = record.birth_date.year() as i32 + 62;

    let aime = compute_aime(&record.prior_annual_incomes, awi, year_turn_60);
    let bp = bend_points.bend_points_for_year(year_turn_62).unwrap_or((0.0, 0.0));
    let pia = compute_pia(aime, bp);

    let collection_age = date_math::years_between(record.birth_date, as_of).max(0) as u32;
    pia * collection_age_factor(collection_age)
}

/// Whether a set of eligibility requirements is met: the years-of-service
/// threshold must be met, and if an age requirement is specified, age must
/// also be met.
fn requirement_met(age: u32, years_worked: f64, req: &crate::model::ServiceRequirement) -> bool {
    years_worked + 1e-9 >= req.years_worked && req.age.map(|a| age >= a as u32).unwrap_or(true)
}

/// Pension reduction factor: `1.0` if any unreduced requirement is met,
/// `0.0` if no reduced requirement is met either, else a table lookup
/// (spec.md §4.6).
#[must_use]
pub fn pension_reduction_factor(pension: &Pension, age: u32, years_worked: f64) -> f64 {
    if pension.unreduced_requirements.iter().any(|r| requirement_met(age, years_worked, r)) {
        return 1.0;
    }
    if !pension.reduced_requirements.iter().any(|r| requirement_met(age, years_worked, r)) {
        return 0.0;
    }
    pension
        .reduced_rate_by_age_then_years_of_service
        .reduction_factor(age, years_worked.floor().max(0.0) as u32)
}

/// Highest average of `n` consecutive prior compensation years. Falls back
/// to averaging whatever contiguous-or-not years are on record when fewer
/// than `n` are available.
#[must_use]
pub fn highest_consecutive_average(
    prior_annual_compensation: &std::collections::BTreeMap<i32, f64>,
    n: u32,
) -> f64 {
    if prior_annual_compensation.is_empty() {
        return 0.0;
    }
    let n = n.max(1);
    let years: Vec<i32> = prior_annual_compensation.keys().copied().collect();
    let min_year = *years.first().unwrap();
    let max_year = *years.last().unwrap();

    let mut best = f64::MIN;
    let mut found_full_window = false;
    let mut start = min_year;
    while start + n as i32 - 1 <= max_year {
        let mut sum = 0.0;
        let mut complete = true;
        for y in start..start + n as i32 {
            match prior_annual_compensation.get(&y) {
                Some(&v) => sum += v,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            found_full_window = true;
            best = best.max(sum / n as f64);
        }
        start += 1;
    }

    if found_full_window {
        best
    } else {
        let total: f64 = prior_annual_compensation.values().sum();
        total / prior_annual_compensation.len() as f64
    }
}

/// Monthly pension payout (spec.md §4.6).
#[must_use]
pub fn pension_monthly(pension: &Pension, as_of: jiff::civil::Date) -> f64 {
    let age = date_math::years_between(pension.birth_date, as_of).max(0) as u32;
    let years_worked =
        date_math::fast_days_between(pension.work_start_date, as_of) as f64 / 365.25;
    let highest_average = highest_consecutive_average(
        &pension.prior_annual_compensation,
        pension.highest_compensation_consecutive_years_to_average,
    );
    let reduction = pension_reduction_factor(pension, age, years_worked);
    highest_average * pension.accrual_factor * years_worked * reduction / 12.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccountId, PensionId, ReductionRateTable, ServiceRequirement};
    use std::collections::BTreeMap;

    fn base_pension() -> Pension {
        Pension {
            id: PensionId(1),
            pay_to_account: AccountId(1),
            paycheck_name: "Pension".into(),
            category: "Income.Pension".into(),
            start_date: jiff::civil::date(2025, 1, 1),
            birth_date: jiff::civil::date(1968, 1, 1),
            work_start_date: jiff::civil::date(1990, 1, 1),
            unreduced_requirements: vec![ServiceRequirement { age: Some(65), years_worked: 30.0 }],
            reduced_requirements: vec![ServiceRequirement { age: Some(55), years_worked: 25.0 }],
            highest_compensation_consecutive_years_to_average: 4,
            accrual_factor: 0.02,
            reduced_rate_by_age_then_years_of_service: {
                let mut t = ReductionRateTable::default();
                t.by_age.insert(55, BTreeMap::from([(25, 0.8), (30, 0.9)]));
                t.by_age.insert(60, BTreeMap::from([(25, 0.85), (30, 0.95)]));
                t
            },
            prior_annual_compensation: BTreeMap::new(),
        }
    }

    #[test]
    fn s4_pension_reduction_scenarios() {
        let p = base_pension();
        assert_eq!(pension_reduction_factor(&p, 57, 30.0), 0.9);
        assert_eq!(pension_reduction_factor(&p, 65, 35.0), 1.0);
        assert_eq!(pension_reduction_factor(&p, 50, 20.0), 0.0);
    }

    #[test]
    fn collection_age_factor_table() {
        assert_eq!(collection_age_factor(61), 0.0);
        assert_eq!(collection_age_factor(62), 0.70);
        assert_eq!(collection_age_factor(67), 1.0);
        assert_eq!(collection_age_factor(70), 1.24);
        assert_eq!(collection_age_factor(75), 1.24);
    }

    #[test]
    fn pia_bend_point_formula() {
        // Below first bend point: 90% flows through
        let pia = compute_pia(500.0, (1000.0, 6000.0));
        assert!((pia - 450.0).abs() < 1e-9);
        // Spans both bend points
        let pia = compute_pia(7000.0, (1000.0, 6000.0));
        let expected = 0.9 * 1000.0 + 0.32 * 5000.0 + 0.15 * 1000.0;
        assert!((pia - expected).abs() < 1e-9);
    }

    #[test]
    fn highest_consecutive_average_picks_best_window() {
        let mut comp = BTreeMap::new();
        comp.insert(2018, 50_000.0);
        comp.insert(2019, 60_000.0);
        comp.insert(2020, 70_000.0);
        comp.insert(2021, 80_000.0);
        comp.insert(2022, 40_000.0);
        let avg = highest_consecutive_average(&comp, 4);
        assert!((avg - (50_000.0 + 60_000.0 + 70_000.0 + 80_000.0) / 4.0).abs() < 1e-6);
    }
}
