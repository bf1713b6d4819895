//! Turns a fetched issue list into chart data: calendar-bucketed series for the
//! combo chart and grouped counts for the pie charts. Everything here is pure;
//! the current date is always passed in.

pub mod buckets;
pub mod conditions;
pub mod pie;
pub mod series;
pub mod timezone;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

pub use pie::aggregate_pie;
pub use series::aggregate;

/// One bucket on the time axis with the value of every series in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, u64>,
}

impl DataPoint {
    pub fn value(&self, series_id: &str) -> u64 {
        self.values.get(series_id).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PieSlice {
    pub name: String,
    pub count: u64,
}
