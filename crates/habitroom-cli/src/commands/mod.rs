pub mod config;
pub mod habit;
pub mod simulate;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Resolve a `--at` argument: RFC 3339 instant, or a bare `YYYY-MM-DD`
/// meaning noon of that day at `offset`. Absent means now.
pub fn resolve_at(
    at: Option<&str>,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    let Some(raw) = at else {
        return Ok(Utc::now());
    };
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("invalid time '{raw}': expected RFC 3339 or YYYY-MM-DD"))?;
    let noon = date.and_time(NaiveTime::from_hms_opt(12, 0, 0).ok_or("invalid time")?);
    offset
        .from_local_datetime(&noon)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("invalid time '{raw}'").into())
}
