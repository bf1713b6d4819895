use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use super::buckets::{self, BucketMode};
use super::conditions::{custom_field_id, matches_all};
use super::timezone::{leading_date, to_closed_date};
use super::DataPoint;
use crate::models::Issue;
use crate::settings::{Aggregation, AggregationOptions, DateField, SeriesDefinition};

/// Days shown before today when no start date is configured.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 14;

/// Date an issue contributes to a series, before any bucket remapping.
pub fn resolve_date(issue: &Issue, series: &SeriesDefinition) -> Option<NaiveDate> {
    match series.date_field {
        DateField::CreatedOn => leading_date(&issue.created_on),
        DateField::ClosedOn => issue.closed_on.as_deref().and_then(to_closed_date),
        DateField::Custom => {
            let key = series.custom_date_field_key.as_deref()?;
            let raw = match custom_field_id(key) {
                Some(id) => issue.custom_field(id?)?.value.first()?,
                None => issue.attribute(key)?,
            };
            if raw.is_empty() {
                return None;
            }
            leading_date(raw)
        }
    }
}

fn passes_filters(issue: &Issue, series: &SeriesDefinition) -> bool {
    if !series.status_ids.is_empty() && !series.status_ids.contains(&issue.status.id) {
        return false;
    }
    series.conditions.is_empty() || matches_all(issue, &series.conditions)
}

/// Bucket date an issue is counted on for a series, if any.
fn bucket_date(issue: &Issue, series: &SeriesDefinition, mode: BucketMode) -> Option<NaiveDate> {
    if !passes_filters(issue, series) {
        return None;
    }
    resolve_date(issue, series).map(|date| mode.remap(date))
}

fn bucket_mode(options: &AggregationOptions) -> BucketMode {
    if options.weekly_mode {
        BucketMode::Weekly {
            anchor: options.anchor_weekday,
        }
    } else {
        BucketMode::Daily {
            hide_weekends: options.hide_weekends,
        }
    }
}

fn window_start(options: &AggregationOptions, today: NaiveDate) -> NaiveDate {
    options.start_date.unwrap_or_else(|| {
        today
            .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
            .unwrap_or(today)
    })
}

/// Per-bucket counts of one series, in bucket order.
fn count_series(
    issues: &[Issue],
    series: &SeriesDefinition,
    bucket_keys: &[NaiveDate],
    mode: BucketMode,
) -> Vec<u64> {
    let index: BTreeMap<NaiveDate, usize> = bucket_keys
        .iter()
        .enumerate()
        .map(|(position, date)| (*date, position))
        .collect();
    let mut counts = vec![0u64; bucket_keys.len()];
    for date in issues.iter().filter_map(|issue| bucket_date(issue, series, mode)) {
        if let Some(position) = index.get(&date) {
            counts[*position] += 1;
        }
    }
    counts
}

/// Matching issues that land before the first visible bucket.
fn backfill(issues: &[Issue], series: &SeriesDefinition, first_bucket: NaiveDate, mode: BucketMode) -> u64 {
    issues
        .iter()
        .filter_map(|issue| bucket_date(issue, series, mode))
        .filter(|date| *date < first_bucket)
        .count() as u64
}

fn accumulate(counts: &mut [u64], seed: u64) {
    let mut running = seed;
    for count in counts.iter_mut() {
        running += *count;
        *count = running;
    }
}

/// Turns issues into one data point per bucket for the window ending `today`.
///
/// Cumulative series are seeded with the issues dated before the first bucket
/// only when the caller pinned `start_date`; the default lookback window starts
/// from zero.
pub fn aggregate(
    issues: &[Issue],
    series: &[SeriesDefinition],
    options: &AggregationOptions,
    today: NaiveDate,
) -> Vec<DataPoint> {
    let mode = bucket_mode(options);
    let bucket_keys = buckets::plan(window_start(options, today), today, mode);

    let columns: Vec<(&str, Vec<u64>)> = series
        .iter()
        .map(|definition| {
            let mut counts = count_series(issues, definition, &bucket_keys, mode);
            if definition.aggregation == Aggregation::Cumulative {
                let seed = match (options.start_date, bucket_keys.first()) {
                    (Some(_), Some(first)) => backfill(issues, definition, *first, mode),
                    _ => 0,
                };
                accumulate(&mut counts, seed);
            }
            (definition.id.as_str(), counts)
        })
        .collect();

    tracing::debug!(
        issues = issues.len(),
        series = series.len(),
        buckets = bucket_keys.len(),
        "Aggregated issue series"
    );

    bucket_keys
        .iter()
        .enumerate()
        .map(|(position, date)| DataPoint {
            date: *date,
            values: columns
                .iter()
                .map(|(id, counts)| (id.to_string(), counts[position]))
                .collect(),
        })
        .collect()
}
