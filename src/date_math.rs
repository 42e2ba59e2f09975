//! Fast date arithmetic helpers that bypass jiff's `Span` machinery.
//!
//! jiff `Span` operations (`Date - Date`, `Span::years()`, `Span::resign()`)
//! are correct but relatively heavy for a hot simulation loop. The helpers here
//! use Rata Die day-numbering to perform O(1) day-difference calculations and
//! direct calendar arithmetic for year/month offsets — no `Span` allocation or
//! normalisation involved.

use jiff::civil::Date;

/// Fast leap year check.
#[inline]
pub fn is_leap_year(year: i16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Fast inline days-in-month calculation without creating a `jiff::civil::Date`.
#[inline]
pub fn days_in_month(year: i16, month: i8) -> i8 {
    const DAYS: [i8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    if month == 2 && is_leap_year(year) {
        29
    } else {
        DAYS[(month - 1) as usize]
    }
}

/// Convert a civil date to a Rata Die day number (days since 0001-01-01).
///
/// Uses the proleptic Gregorian calendar algorithm from Baum (2017).
/// This is an O(1) operation with no branches beyond the month adjustment.
#[inline]
fn rata_die(d: Date) -> i32 {
    let y = d.year() as i32;
    let m = d.month() as i32;
    let day = d.day() as i32;

    // Shift March = month 1 so Feb (end of "year") is month 12
    let a = (14 - m) / 12;
    let y2 = y - a;
    let m2 = m + 12 * a - 3;

    day + (153 * m2 + 2) / 5 + 365 * y2 + y2 / 4 - y2 / 100 + y2 / 400 - 306
}

/// Compute the number of days between two dates (d2 - d1).
///
/// Positive when `d2 > d1`. This replaces `(d2 - d1).get_days()` which
/// creates an intermediate `jiff::Span` and calls the expensive `resign()`
/// normalisation path.
#[inline]
pub fn fast_days_between(d1: Date, d2: Date) -> i32 {
    rata_die(d2) - rata_die(d1)
}

/// Add `n` days to a date without going through `jiff::Span`.
///
/// Converts to Rata Die, adds, then converts back — O(1) with no
/// `Span` allocation.
#[inline]
pub fn add_days(d: Date, n: i32) -> Date {
    rd_to_date(rata_die(d) + n)
}

/// Recurrence period for Bills and Interest schedule entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

/// Advance `date` by one occurrence of `period * every_n`, clamping on
/// month/year rollovers the way calendar-aware schedulers must: Jan 31 +
/// 1 month lands on Feb 28/29, not March 3.
#[inline]
pub fn next_date(date: Date, period: Period, every_n: u32) -> Date {
    let n = every_n.max(1) as i64;
    match period {
        Period::Day => add_days(date, (n) as i32),
        Period::Week => add_days(date, (n * 7) as i32),
        Period::Month => add_months_clamped(date, n),
        Period::Year => add_months_clamped(date, n * 12),
    }
}

/// Add `months` calendar months to `date`, clamping the day-of-month to the
/// target month's length (the "annual-date clamping" spec.md §3/§4.1 call
/// out for Bill `nextDate`).
#[inline]
pub fn add_months_clamped(date: Date, months: i64) -> Date {
    let total = date.year() as i64 * 12 + (date.month() as i64 - 1) + months;
    let year = total.div_euclid(12) as i16;
    let month = (total.rem_euclid(12) + 1) as i8;
    let day = date.day().min(days_in_month(year, month));
    jiff::civil::date(year, month, day)
}

/// First day of the calendar month containing `date`.
#[inline]
pub fn start_of_month(date: Date) -> Date {
    jiff::civil::date(date.year(), date.month(), 1)
}

/// Last day of the calendar month containing `date`.
#[inline]
pub fn end_of_month(date: Date) -> Date {
    jiff::civil::date(date.year(), date.month(), days_in_month(date.year(), date.month()))
}

/// Whether `date` falls exactly on an anniversary of `anchor` (same
/// month/day, any year). Used for bill-inflation and spending-tracker
/// threshold-inflation milestone counting.
#[inline]
pub fn is_anniversary_of(anchor: Date, date: Date) -> bool {
    date.month() == anchor.month() && date.day() == anchor.day()
}

/// Count how many anniversaries of `anchor` fall strictly after
/// `after_exclusive` and on-or-before `through_inclusive`.
///
/// Used for bill inflation ("for each anniversary of `increaseByDate`
/// strictly within `(startDate, currentDate]`") and spending-tracker
/// threshold inflation (same rule, spec.md §4.5).
pub fn count_anniversaries(anchor: Date, after_exclusive: Date, through_inclusive: Date) -> u32 {
    if through_inclusive <= after_exclusive {
        return 0;
    }
    let mut count = 0u32;
    let mut year = after_exclusive.year();
    loop {
        let day = anchor.day().min(days_in_month(year, anchor.month()));
        let candidate = jiff::civil::date(year, anchor.month(), day);
        if candidate > after_exclusive && candidate <= through_inclusive {
            count += 1;
        }
        if candidate > through_inclusive {
            break;
        }
        year += 1;
        // Loop guard: anniversaries are at most one per year, so this can
        // never run away, but bound it defensively against malformed input.
        if year as i32 - after_exclusive.year() as i32 > 400 {
            break;
        }
    }
    count
}

/// Whole-year age as of `as_of`, the "manual calendar subtraction" idiom the
/// teacher uses for `current_age()` rather than `jiff::Span::until` (which
/// is days-only and awkward to turn into whole years).
#[inline]
pub fn years_between(birth_date: Date, as_of: Date) -> i32 {
    let mut years = as_of.year() as i32 - birth_date.year() as i32;
    if as_of.month() < birth_date.month()
        || (as_of.month() == birth_date.month() && as_of.day() < birth_date.day())
    {
        years -= 1;
    }
    years
}

/// Convert a Rata Die day number back to a `jiff::civil::Date`.
///
/// Inverse of `rata_die()`, using the same proleptic Gregorian algorithm.
#[inline]
fn rd_to_date(rd: i32) -> Date {
    // Shift so day 0 = March 1, year 0
    let z = rd + 306;
    let h = 100 * z - 25;
    let a = h / 3_652_425;
    let b = a - a / 4;
    let y = (100 * b + h) / 36_525;
    let c = b + z - 365 * y - y / 4;
    let m = (5 * c + 456) / 153;
    let day = c - (153 * m - 457) / 5;

    let (year, month) = if m > 12 { (y + 1, m - 12) } else { (y, m) };

    jiff::civil::date(year as i16, month as i8, day as i8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_fast_days_between_same_date() {
        let d = date(2025, 6, 15);
        assert_eq!(fast_days_between(d, d), 0);
    }

    #[test]
    fn test_fast_days_between_one_day() {
        assert_eq!(fast_days_between(date(2025, 1, 1), date(2025, 1, 2)), 1);
        assert_eq!(fast_days_between(date(2025, 1, 2), date(2025, 1, 1)), -1);
    }

    #[test]
    fn test_fast_days_between_across_year() {
        // 2024 is a leap year → 366 days
        assert_eq!(fast_days_between(date(2024, 1, 1), date(2025, 1, 1)), 366);
        // 2025 is not a leap year → 365 days
        assert_eq!(fast_days_between(date(2025, 1, 1), date(2026, 1, 1)), 365);
    }

    #[test]
    fn test_fast_days_between_leap_feb() {
        assert_eq!(fast_days_between(date(2024, 2, 28), date(2024, 3, 1)), 2);
        assert_eq!(fast_days_between(date(2025, 2, 28), date(2025, 3, 1)), 1);
    }

    #[test]
    fn test_fast_days_between_matches_jiff() {
        let pairs = [
            (date(2020, 1, 1), date(2030, 6, 15)),
            (date(2024, 2, 29), date(2025, 2, 28)),
            (date(2000, 3, 1), date(2100, 3, 1)),
            (date(2025, 12, 31), date(2026, 1, 1)),
        ];
        for (d1, d2) in pairs {
            let jiff_days = (d2 - d1).get_days();
            let fast_days = fast_days_between(d1, d2);
            assert_eq!(
                fast_days, jiff_days,
                "mismatch for {d1} → {d2}: fast={fast_days}, jiff={jiff_days}"
            );
        }
    }

    #[test]
    fn test_add_days_basic() {
        assert_eq!(add_days(date(2025, 1, 1), 1), date(2025, 1, 2));
        assert_eq!(add_days(date(2025, 1, 31), 1), date(2025, 2, 1));
        assert_eq!(add_days(date(2025, 12, 31), 1), date(2026, 1, 1));
    }

    #[test]
    fn test_add_days_negative() {
        assert_eq!(add_days(date(2025, 1, 1), -1), date(2024, 12, 31));
    }

    #[test]
    fn test_add_days_leap_year() {
        assert_eq!(add_days(date(2024, 2, 28), 1), date(2024, 2, 29));
        assert_eq!(add_days(date(2024, 2, 29), 1), date(2024, 3, 1));
        assert_eq!(add_days(date(2025, 2, 28), 1), date(2025, 3, 1));
    }

    #[test]
    fn test_next_date_month_clamps() {
        assert_eq!(
            next_date(date(2025, 1, 31), Period::Month, 1),
            date(2025, 2, 28)
        );
        assert_eq!(
            next_date(date(2024, 1, 31), Period::Month, 1),
            date(2024, 2, 29)
        );
    }

    #[test]
    fn test_next_date_year() {
        assert_eq!(
            next_date(date(2024, 2, 29), Period::Year, 1),
            date(2025, 2, 28)
        );
    }

    #[test]
    fn test_start_end_of_month() {
        assert_eq!(start_of_month(date(2025, 6, 15)), date(2025, 6, 1));
        assert_eq!(end_of_month(date(2025, 6, 15)), date(2025, 6, 30));
        assert_eq!(end_of_month(date(2024, 2, 10)), date(2024, 2, 29));
    }

    #[test]
    fn test_count_anniversaries() {
        let anchor = date(2020, 3, 15);
        // one year later exactly on the anniversary: counted (inclusive end)
        assert_eq!(count_anniversaries(anchor, date(2020, 3, 15), date(2021, 3, 15)), 1);
        // exclusive start means the anchor date itself never counts
        assert_eq!(count_anniversaries(anchor, date(2021, 3, 15), date(2021, 3, 15)), 0);
        assert_eq!(count_anniversaries(anchor, date(2020, 1, 1), date(2023, 6, 1)), 3);
    }

    #[test]
    fn test_years_between() {
        assert_eq!(years_between(date(1970, 1, 1), date(2025, 6, 15)), 55);
        assert_eq!(years_between(date(1966, 1, 1), date(2025, 1, 1)), 59);
        assert_eq!(years_between(date(1966, 7, 1), date(2025, 6, 30)), 58);
    }

    #[test]
    fn test_roundtrip() {
        let dates = [
            date(2000, 1, 1),
            date(2024, 2, 29),
            date(2025, 6, 15),
            date(2099, 12, 31),
        ];
        for d in dates {
            let rd = rata_die(d);
            let back = rd_to_date(rd);
            assert_eq!(d, back, "roundtrip failed for {d}");
        }
    }
}
