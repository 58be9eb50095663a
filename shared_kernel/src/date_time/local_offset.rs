use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Current UTC offset of `tz` in whole hours, at the given instant.
///
/// The outage schedule publishes wall-clock times for a region that observes
/// daylight saving, so the offset has to be computed at query time rather
/// than pinned once.
pub fn offset_hours(tz: Tz, at: DateTime<Utc>) -> i64 {
    let local = tz.from_utc_datetime(&at.naive_utc());
    i64::from(local.offset().fix().local_minus_utc()) / 3600
}

/// The instant `at`, expressed as naive local wall-clock time in `tz`.
pub fn local_wall_clock(tz: Tz, at: DateTime<Utc>) -> NaiveDateTime {
    at.naive_utc() + Duration::hours(offset_hours(tz, at))
}
