//! Completion ledger.
//!
//! Append-only audit trail of completion events. Removal always works on the
//! calendar day of `now`, whatever the habit's frequency.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use super::store::LedgerStore;
use super::CompletionLogEntry;
use crate::error::Result;

/// Half-open UTC range `[start_of_day(now), start_of_day(now) + 1 day)`,
/// where the day is the calendar day of `now` in its own offset.
pub fn day_window(now: &DateTime<FixedOffset>) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = now.date_naive().and_time(chrono::NaiveTime::MIN);
    // A fixed offset maps every local time to exactly one instant.
    let start = now
        .offset()
        .from_local_datetime(&midnight)
        .single()
        .unwrap_or(*now)
        .with_timezone(&Utc);
    (start, start + Duration::days(1))
}

/// Record one completion at `now`. No deduplication.
pub fn append<S>(store: &S, habit_id: &str, now: &DateTime<FixedOffset>) -> Result<CompletionLogEntry>
where
    S: LedgerStore + ?Sized,
{
    let entry = CompletionLogEntry::new(habit_id, now.with_timezone(&Utc));
    store.insert_entry(&entry)?;
    Ok(entry)
}

/// Delete every entry of `habit_id` logged on the calendar day of `now`.
pub fn remove_for_today<S>(store: &S, habit_id: &str, now: &DateTime<FixedOffset>) -> Result<usize>
where
    S: LedgerStore + ?Sized,
{
    let (start, end) = day_window(now);
    let removed = store.delete_entries_between(habit_id, start, end)?;
    if removed > 1 {
        tracing::warn!(habit_id, removed, %start, "removed more than one ledger entry for a single day");
    }
    Ok(removed)
}
