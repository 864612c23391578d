//! Calendar-period alignment.
//!
//! Every date maps to a period index for a given [`Frequency`]. Indices
//! increase by exactly one from one period to the next, so "same period" is
//! index equality and "prior period" is `index(a) + 1 == index(b)`.
//!
//! Instants are compared on their local calendar date in whatever time zone
//! they carry; callers must pass both instants in the same zone.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};

use super::Frequency;

/// Monotonic period number containing `date`.
pub fn period_index(frequency: Frequency, date: NaiveDate) -> i64 {
    match frequency {
        Frequency::Daily => i64::from(date.num_days_from_ce()),
        Frequency::Weekly => {
            // Day numbers of Mondays are spaced exactly 7 apart.
            let monday = i64::from(date.num_days_from_ce())
                - i64::from(date.weekday().num_days_from_monday());
            monday.div_euclid(7)
        }
        Frequency::Monthly => i64::from(date.year()) * 12 + i64::from(date.month0()),
        Frequency::Quarterly => i64::from(date.year()) * 4 + i64::from(date.month0() / 3),
        Frequency::Yearly => i64::from(date.year()),
    }
}

/// First calendar day of the period containing `date`.
pub fn period_start(frequency: Frequency, date: NaiveDate) -> NaiveDate {
    let first_of = |month: u32| NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date);
    match frequency {
        Frequency::Daily => date,
        Frequency::Weekly => {
            date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
        }
        Frequency::Monthly => first_of(date.month()),
        Frequency::Quarterly => first_of(date.month0() / 3 * 3 + 1),
        Frequency::Yearly => first_of(1),
    }
}

/// Whether `a` and `b` fall in the same calendar period.
pub fn same_period<Tz: TimeZone>(frequency: Frequency, a: &DateTime<Tz>, b: &DateTime<Tz>) -> bool {
    period_index(frequency, a.date_naive()) == period_index(frequency, b.date_naive())
}

/// Whether `a` falls in the period immediately before the one containing `b`.
pub fn is_prior_period<Tz: TimeZone>(
    frequency: Frequency,
    a: &DateTime<Tz>,
    b: &DateTime<Tz>,
) -> bool {
    period_index(frequency, a.date_naive()) + 1 == period_index(frequency, b.date_naive())
}
