use time::format_description::well_known::Rfc3339;
use time::macros::time;
use time::{format_description, Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// Wall time assumed when an absence has no explicit start.
pub const DAY_START: Time = time!(00:00);
/// Wall time assumed when an absence has no explicit end.
pub const DAY_END: Time = time!(23:59);

/// Parse a store timestamp into an absolute instant.
///
/// Contract:
/// - RFC3339 (with offset) is taken as-is.
/// - The naive allowlist (`YYYY-MM-DD[T ]HH:MM[:SS]`) is read as wall-clock time at `offset`.
/// - Anything else yields `None`; callers decide whether that skips a row or raises a warning.
pub fn parse_instant(raw: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(dt);
    }

    for fmt in [
        "[year]-[month]-[day]T[hour]:[minute]:[second]",
        "[year]-[month]-[day]T[hour]:[minute]",
        "[year]-[month]-[day] [hour]:[minute]:[second]",
        "[year]-[month]-[day] [hour]:[minute]",
    ] {
        let Ok(items) = format_description::parse(fmt) else {
            continue;
        };
        if let Ok(pdt) = PrimitiveDateTime::parse(trimmed, &items) {
            return Some(pdt.assume_offset(offset));
        }
    }

    None
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<Date> {
    let items = format_description::parse("[year]-[month]-[day]").ok()?;
    Date::parse(raw.trim(), &items).ok()
}

/// Parse an `HH:MM` or `HH:MM:SS` wall time (the store returns the latter for `time` columns).
pub fn parse_wall_time(raw: &str) -> Option<Time> {
    let trimmed = raw.trim();
    ["[hour]:[minute]:[second]", "[hour]:[minute]"]
        .into_iter()
        .filter_map(|fmt| format_description::parse(fmt).ok())
        .find_map(|items| Time::parse(trimmed, &items).ok())
}

pub fn local_instant(date: Date, wall: Time, offset: UtcOffset) -> OffsetDateTime {
    PrimitiveDateTime::new(date, wall).assume_offset(offset)
}

/// Calendar date of `dt` on the organisation's wall clock.
pub fn local_date(dt: OffsetDateTime, offset: UtcOffset) -> Date {
    dt.to_offset(offset).date()
}

/// Signed difference `to - from` in fractional hours.
pub fn hours_between(from: OffsetDateTime, to: OffsetDateTime) -> f64 {
    (to - from).as_seconds_f64() / 3600.0
}

/// `dt + hours`, or `None` when the amount is not representable.
pub fn add_hours(dt: OffsetDateTime, hours: f64) -> Option<OffsetDateTime> {
    let dur = Duration::checked_seconds_f64(hours * 3600.0)?;
    dt.checked_add(dur)
}

pub fn unix_millis(dt: OffsetDateTime) -> i64 {
    (dt.unix_timestamp_nanos() / 1_000_000) as i64
}

pub fn from_unix_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}

/// Strict open-interval overlap; touching endpoints do not overlap.
pub fn windows_overlap(
    a_start: OffsetDateTime,
    a_end: OffsetDateTime,
    b_start: OffsetDateTime,
    b_end: OffsetDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}
