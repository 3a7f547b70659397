//! Timezone helpers shared by the grammar reader and the calendar converter.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

/// Look up an IANA timezone id. Unknown ids yield `None` so callers can
/// fall back to UTC instead of failing.
pub fn named_zone(id: &str) -> Option<Tz> {
    id.trim().parse::<Tz>().ok()
}

/// Attach a zone to a wall-clock time. Without a zone (or when the local
/// time does not exist in it) the time is read as UTC.
pub fn localize(naive: NaiveDateTime, zone: Option<Tz>) -> DateTime<FixedOffset> {
    zone.and_then(|tz| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.fixed_offset())
        .unwrap_or_else(|| naive.and_utc().fixed_offset())
}

/// Express an instant in `zone`, or in UTC when there is none.
pub fn in_zone<Z: TimeZone>(instant: DateTime<Z>, zone: Option<Tz>) -> DateTime<FixedOffset> {
    match zone {
        Some(tz) => instant.with_timezone(&tz).fixed_offset(),
        None => instant.with_timezone(&chrono::Utc).fixed_offset(),
    }
}
