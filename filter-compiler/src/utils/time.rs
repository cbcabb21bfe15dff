//! Time utility functions
//!
//! Stored date values are epoch seconds. Literals arriving in filters are
//! either epoch seconds or calendar strings, interpreted in the configured
//! time zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Seconds in one day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Parse a date-only literal (`2024-05-01` or `2024/05/01`)
pub fn parse_naive_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Attach a time zone to a wall-clock value, picking the earlier instant on
/// DST overlaps and skipping forward on gaps
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + chrono::TimeDelta::hours(1))).earliest())
}

/// Convert a date or datetime literal to epoch seconds
///
/// RFC 3339 strings carry their own offset. Naive strings are read as wall
/// clock time in `tz`; a bare date means the start of that day.
pub fn parse_epoch_seconds(s: &str, tz: Tz) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Some(dt.timestamp());
    }
    if let Some(naive) = parse_naive_datetime(s) {
        return localize(naive, tz).map(|dt| dt.timestamp());
    }
    let date = parse_naive_date(s)?;
    localize(date.and_time(NaiveTime::MIN), tz).map(|dt| dt.timestamp())
}

/// Calendar date named by a date literal, as seen in `tz`
///
/// Naive strings name their own date. RFC 3339 instants are moved into `tz`
/// first.
pub fn literal_date(s: &str, tz: Tz) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
        return Some(dt.with_timezone(&tz).date_naive());
    }
    if let Some(naive) = parse_naive_datetime(s) {
        return Some(naive.date());
    }
    parse_naive_date(s)
}

/// Calendar date of epoch seconds in `tz`
pub fn epoch_date(secs: i64, tz: Tz) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.with_timezone(&tz).date_naive())
}

/// Epoch seconds of the start of `date` and of the following day in `tz`
pub fn day_bounds(date: NaiveDate, tz: Tz) -> Option<(i64, i64)> {
    let start = localize(date.and_time(NaiveTime::MIN), tz)?;
    let next = localize(date.succ_opt()?.and_time(NaiveTime::MIN), tz)?;
    Some((start.timestamp(), next.timestamp()))
}

/// Offset of `tz` from UTC at `at`, in seconds
pub fn utc_offset_seconds(at: DateTime<Utc>, tz: Tz) -> i64 {
    i64::from(at.with_timezone(&tz).offset().fix().local_minus_utc())
}

/// Epoch seconds of midnight of `now`'s calendar day in `tz`
pub fn start_of_day(now: DateTime<Utc>, tz: Tz) -> i64 {
    let local = now.with_timezone(&tz).date_naive().and_time(NaiveTime::MIN);
    localize(local, tz)
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| {
            tracing::warn!(%tz, "Could not resolve start of day, using current instant");
            now.timestamp()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_naive_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(parse_naive_date("2024-05-01"), Some(expected));
        assert_eq!(parse_naive_date("2024/05/01"), Some(expected));
        assert_eq!(parse_naive_date(" 2024-05-01 "), Some(expected));
        assert_eq!(parse_naive_date("05/01/2024"), None);
        assert_eq!(parse_naive_date("not a date"), None);
    }

    #[test]
    fn test_parse_epoch_seconds_date_utc() {
        // 2024-01-01 00:00:00 UTC
        assert_eq!(parse_epoch_seconds("2024-01-01", Tz::UTC), Some(1704067200));
    }

    #[test]
    fn test_parse_epoch_seconds_date_tokyo() {
        // Midnight in Tokyo is 15:00 the previous day in UTC
        assert_eq!(
            parse_epoch_seconds("2024-01-01", Tz::Asia__Tokyo),
            Some(1704067200 - 9 * 3600)
        );
    }

    #[test]
    fn test_parse_epoch_seconds_datetime() {
        assert_eq!(
            parse_epoch_seconds("2024-01-01 12:30:00", Tz::UTC),
            Some(1704067200 + 12 * 3600 + 30 * 60)
        );
        assert_eq!(
            parse_epoch_seconds("2024/01/01 12:30", Tz::UTC),
            Some(1704067200 + 12 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn test_parse_epoch_seconds_rfc3339_ignores_zone() {
        assert_eq!(
            parse_epoch_seconds("2024-01-01T09:00:00+09:00", Tz::America__New_York),
            Some(1704067200)
        );
    }

    #[test]
    fn test_parse_epoch_seconds_invalid() {
        assert_eq!(parse_epoch_seconds("tomorrow", Tz::UTC), None);
        assert_eq!(parse_epoch_seconds("2024-13-01", Tz::UTC), None);
    }

    #[test]
    fn test_literal_date() {
        let may_first = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(literal_date("2024/05/01", Tz::UTC), Some(may_first));
        assert_eq!(literal_date("2024-05-01 23:59:59", Tz::Asia__Tokyo), Some(may_first));
        assert_eq!(literal_date("garbage", Tz::UTC), None);
    }

    #[test]
    fn test_literal_date_moves_instants_into_zone() {
        // 2024-04-30T20:00Z is already May 1st in Tokyo
        assert_eq!(
            literal_date("2024-04-30T20:00:00Z", Tz::Asia__Tokyo),
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
        assert_eq!(
            literal_date("2024-04-30T20:00:00Z", Tz::UTC),
            NaiveDate::from_ymd_opt(2024, 4, 30)
        );
    }

    #[test]
    fn test_epoch_date() {
        assert_eq!(epoch_date(0, Tz::UTC), NaiveDate::from_ymd_opt(1970, 1, 1));
        assert_eq!(epoch_date(1704067199, Tz::UTC), NaiveDate::from_ymd_opt(2023, 12, 31));
        assert_eq!(
            epoch_date(1704067200 - 9 * 3600, Tz::Asia__Tokyo),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            day_bounds(date, Tz::UTC),
            Some((1704067200, 1704067200 + SECONDS_PER_DAY))
        );
        let tokyo_start = 1704067200 - 9 * 3600;
        assert_eq!(
            day_bounds(date, Tz::Asia__Tokyo),
            Some((tokyo_start, tokyo_start + SECONDS_PER_DAY))
        );
        assert_eq!(
            day_bounds(date, Tz::Asia__Tokyo).map(|(start, _)| start),
            parse_epoch_seconds("2024-01-01", Tz::Asia__Tokyo)
        );
    }

    #[test]
    fn test_day_bounds_dst_day_is_short() {
        // 2024-03-10 springs forward in New York
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let (start, end) = day_bounds(date, Tz::America__New_York).unwrap();
        assert_eq!(end - start, SECONDS_PER_DAY - 3600);
    }

    #[test]
    fn test_utc_offset_seconds() {
        let winter = DateTime::<Utc>::from_timestamp(1704067200, 0).unwrap();
        let summer = DateTime::<Utc>::from_timestamp(1715355000, 0).unwrap();
        assert_eq!(utc_offset_seconds(winter, Tz::UTC), 0);
        assert_eq!(utc_offset_seconds(winter, Tz::Asia__Tokyo), 9 * 3600);
        assert_eq!(utc_offset_seconds(winter, Tz::America__New_York), -5 * 3600);
        assert_eq!(utc_offset_seconds(summer, Tz::America__New_York), -4 * 3600);
    }

    #[test]
    fn test_start_of_day_utc() {
        let now = DateTime::<Utc>::from_timestamp(1704067200 + 5000, 0).unwrap();
        assert_eq!(start_of_day(now, Tz::UTC), 1704067200);
    }

    #[test]
    fn test_start_of_day_tokyo() {
        // 2024-01-01 20:00 UTC is 2024-01-02 05:00 in Tokyo
        let now = DateTime::<Utc>::from_timestamp(1704067200 + 20 * 3600, 0).unwrap();
        let expected = 1704067200 + SECONDS_PER_DAY - 9 * 3600;
        assert_eq!(start_of_day(now, Tz::Asia__Tokyo), expected);
    }
}
