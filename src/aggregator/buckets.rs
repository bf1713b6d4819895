use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::settings::AnchorWeekday;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketMode {
    Daily { hide_weekends: bool },
    Weekly { anchor: AnchorWeekday },
}

impl BucketMode {
    /// Moves an event date onto the bucket that counts it.
    pub fn remap(self, date: NaiveDate) -> NaiveDate {
        match self {
            BucketMode::Weekly { anchor } => next_anchor(date, anchor),
            BucketMode::Daily { hide_weekends: true } => shift_to_monday(date),
            BucketMode::Daily { hide_weekends: false } => date,
        }
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Saturday and Sunday land on the following Monday, weekdays stay put.
/// Dates with no following Monday in range stay put as well.
pub fn shift_to_monday(date: NaiveDate) -> NaiveDate {
    let days_ahead = match date.weekday() {
        Weekday::Sat => 2,
        Weekday::Sun => 1,
        _ => 0,
    };
    date.checked_add_days(Days::new(days_ahead)).unwrap_or(date)
}

/// First date on or after `date` that falls on the anchor weekday, or `date`
/// itself at the end of the calendar.
pub fn next_anchor(date: NaiveDate, anchor: AnchorWeekday) -> NaiveDate {
    let target = anchor.weekday().num_days_from_sunday();
    let current = date.weekday().num_days_from_sunday();
    let days_ahead = (target + 7 - current) % 7;
    date.checked_add_days(Days::new(u64::from(days_ahead)))
        .unwrap_or(date)
}

/// Ordered bucket dates covering `[from, to]`.
///
/// Daily mode yields every calendar day in the range, leaving out Saturdays and
/// Sundays when weekends are hidden. Weekly mode starts at the first anchor day
/// on or after `from` and steps by seven days until it reaches the first anchor
/// day on or after `to`, so the current partial week always has a bucket.
pub fn plan(from: NaiveDate, to: NaiveDate, mode: BucketMode) -> Vec<NaiveDate> {
    match mode {
        BucketMode::Daily { hide_weekends } => from
            .iter_days()
            .take_while(|day| *day <= to)
            .filter(|day| !(hide_weekends && is_weekend(*day)))
            .collect(),
        BucketMode::Weekly { anchor } => {
            let mut buckets = Vec::new();
            let mut current = next_anchor(from, anchor);
            loop {
                buckets.push(current);
                if current >= to {
                    break;
                }
                match current.checked_add_days(Days::new(7)) {
                    Some(next) => current = next,
                    None => break,
                }
            }
            buckets
        }
    }
}
