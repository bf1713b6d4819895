use chrono::{DateTime, FixedOffset, NaiveDate};

/// Completion timestamps are bucketed on the calendar of UTC+9.
pub const CLOSED_DATE_OFFSET_HOURS: i32 = 9;

/// Calendar date of a UTC completion timestamp after applying the +9h offset.
/// Returns `None` for anything that is not an RFC 3339 timestamp.
pub fn to_closed_date(utc_timestamp: &str) -> Option<NaiveDate> {
    let instant = DateTime::parse_from_rfc3339(utc_timestamp).ok()?;
    let offset = FixedOffset::east_opt(CLOSED_DATE_OFFSET_HOURS * 3600)?;
    Some(instant.with_timezone(&offset).date_naive())
}

/// Calendar date taken from the leading `YYYY-MM-DD` of a timestamp, with no
/// offset applied.
pub fn leading_date(value: &str) -> Option<NaiveDate> {
    let prefix = value.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_date_crosses_midnight() {
        assert_eq!(
            to_closed_date("2026-02-25T15:05:00Z"),
            NaiveDate::from_ymd_opt(2026, 2, 26)
        );
    }

    #[test]
    fn closed_date_stays_on_same_day_before_cutover() {
        assert_eq!(
            to_closed_date("2026-02-25T02:23:30Z"),
            NaiveDate::from_ymd_opt(2026, 2, 25)
        );
    }

    #[test]
    fn malformed_timestamps_have_no_date() {
        assert_eq!(to_closed_date("yesterday"), None);
        assert_eq!(leading_date("2026-02"), None);
        assert_eq!(leading_date("not-a-date"), None);
    }

    #[test]
    fn leading_date_ignores_time_of_day() {
        assert_eq!(
            leading_date("2026-02-05T23:59:59Z"),
            NaiveDate::from_ymd_opt(2026, 2, 5)
        );
        assert_eq!(leading_date("2026-03-01"), NaiveDate::from_ymd_opt(2026, 3, 1));
    }
}
