use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub const SETTINGS_VERSION: u32 = 1;
pub const DEFAULT_CHART_HEIGHT: u32 = 320;

/// Years a configured start date may fall in.
pub const START_DATE_YEARS: RangeInclusive<i32> = 1970..=9999;

/// Data points carry their bucket date under this key, so no series may use it.
pub const RESERVED_SERIES_ID: &str = "date";

fn deserialize_series_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let id = String::deserialize(deserializer)?;
    if id == RESERVED_SERIES_ID {
        return Err(D::Error::custom(format!("series id \"{RESERVED_SERIES_ID}\" is reserved")));
    }
    Ok(id)
}

fn deserialize_start_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    match Option::<NaiveDate>::deserialize(deserializer)? {
        Some(date) if !START_DATE_YEARS.contains(&date.year()) => Err(D::Error::custom(format!(
            "start date {date} must fall between the years {} and {}",
            START_DATE_YEARS.start(),
            START_DATE_YEARS.end()
        ))),
        date => Ok(date),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateField {
    CreatedOn,
    ClosedOn,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Daily,
    Cumulative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    EqualsAny,
    #[serde(rename = "!")]
    NotEqualsAny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDefinition {
    #[serde(deserialize_with = "deserialize_series_id")]
    pub id: String,
    pub label: String,
    pub date_field: DateField,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_date_field_key: Option<String>,
    #[serde(default)]
    pub status_ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    pub chart_type: ChartType,
    #[serde(rename = "yAxisId")]
    pub axis: Axis,
    pub aggregation: Aggregation,
    pub color: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

/// Weekday that closes each week in weekly mode, 1 = Monday through 5 = Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AnchorWeekday(u8);

impl AnchorWeekday {
    pub const MONDAY: AnchorWeekday = AnchorWeekday(1);

    pub fn new(day: u8) -> Option<Self> {
        (1..=5).contains(&day).then_some(AnchorWeekday(day))
    }

    pub fn weekday(self) -> Weekday {
        match self.0 {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            _ => Weekday::Fri,
        }
    }
}

impl Default for AnchorWeekday {
    fn default() -> Self {
        AnchorWeekday::MONDAY
    }
}

impl TryFrom<u8> for AnchorWeekday {
    type Error = String;

    fn try_from(day: u8) -> Result<Self, Self::Error> {
        AnchorWeekday::new(day)
            .ok_or_else(|| format!("anchor weekday must be between 1 (Monday) and 5 (Friday), got {day}"))
    }
}

impl From<AnchorWeekday> for u8 {
    fn from(anchor: AnchorWeekday) -> Self {
        anchor.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregationOptions {
    pub start_date: Option<NaiveDate>,
    pub hide_weekends: bool,
    pub weekly_mode: bool,
    pub anchor_weekday: AnchorWeekday,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "yyyy-mm-dd")]
    Iso,
    #[serde(rename = "M/D")]
    MonthDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieSettings {
    pub group_by: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl PieSettings {
    fn grouped_by(group_by: &str) -> Self {
        Self {
            group_by: group_by.to_string(),
            conditions: Vec::new(),
        }
    }
}

/// Everything a dashboard remembers per project. Also the body of a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSettings {
    pub series: Vec<SeriesDefinition>,
    #[serde(
        default,
        deserialize_with = "deserialize_start_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub hide_weekends: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_left_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_right_max: Option<f64>,
    #[serde(default)]
    pub weekly_mode: bool,
    #[serde(default)]
    pub anchor_day: AnchorWeekday,
    #[serde(default)]
    pub date_format: DateFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pie_left: Option<PieSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pie_right: Option<PieSettings>,
}

impl ChartSettings {
    pub fn aggregation_options(&self) -> AggregationOptions {
        AggregationOptions {
            start_date: self.start_date,
            hide_weekends: self.hide_weekends,
            weekly_mode: self.weekly_mode,
            anchor_weekday: self.anchor_day,
        }
    }

    pub fn chart_height(&self) -> u32 {
        self.chart_height.unwrap_or(DEFAULT_CHART_HEIGHT)
    }

    pub fn pie(&self, slot: PieSlot) -> PieSettings {
        match slot {
            PieSlot::Left => self
                .pie_left
                .clone()
                .unwrap_or_else(|| PieSettings::grouped_by("status_id")),
            PieSlot::Right => self
                .pie_right
                .clone()
                .unwrap_or_else(|| PieSettings::grouped_by("tracker_id")),
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            series: vec![
                SeriesDefinition {
                    id: "series-0".to_string(),
                    label: "Created".to_string(),
                    date_field: DateField::CreatedOn,
                    custom_date_field_key: None,
                    status_ids: Vec::new(),
                    conditions: Vec::new(),
                    chart_type: ChartType::Bar,
                    axis: Axis::Right,
                    aggregation: Aggregation::Daily,
                    color: "#93c5fd".to_string(),
                    visible: true,
                },
                SeriesDefinition {
                    id: "series-1".to_string(),
                    label: "Closed (cumulative)".to_string(),
                    date_field: DateField::ClosedOn,
                    custom_date_field_key: None,
                    status_ids: Vec::new(),
                    conditions: Vec::new(),
                    chart_type: ChartType::Line,
                    axis: Axis::Left,
                    aggregation: Aggregation::Cumulative,
                    color: "#3b82f6".to_string(),
                    visible: true,
                },
            ],
            start_date: None,
            hide_weekends: false,
            y_axis_left_min: None,
            y_axis_right_max: None,
            weekly_mode: false,
            anchor_day: AnchorWeekday::default(),
            date_format: DateFormat::default(),
            chart_height: None,
            pie_left: None,
            pie_right: None,
        }
    }
}

/// Stored per-project settings, versioned so that older payloads can be ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub version: u32,
    #[serde(flatten)]
    pub chart: ChartSettings,
}

impl UserSettings {
    pub fn new(chart: ChartSettings) -> Self {
        Self {
            version: SETTINGS_VERSION,
            chart,
        }
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::new(ChartSettings::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub settings: ChartSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieSlot {
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_anchor_weekday_outside_monday_to_friday() {
        assert!(serde_json::from_str::<AnchorWeekday>("3").is_ok());
        assert!(serde_json::from_str::<AnchorWeekday>("0").is_err());
        assert!(serde_json::from_str::<AnchorWeekday>("6").is_err());
    }

    #[test]
    fn rejects_start_dates_outside_supported_years() {
        let settings = |start: &str| {
            serde_json::from_str::<UserSettings>(&format!(r#"{{"version": 1, "series": [], "startDate": "{start}"}}"#))
        };

        assert!(settings("+262142-12-31").is_err());
        assert!(settings("1969-12-31").is_err());
        assert!(settings("1970-01-01").is_ok());
        assert!(serde_json::from_str::<UserSettings>(r#"{"version": 1, "series": [], "startDate": null}"#)
            .unwrap()
            .chart
            .start_date
            .is_none());
    }

    #[test]
    fn rejects_series_named_like_the_date_column() {
        let json = r##"{
            "id": "date",
            "label": "Date",
            "dateField": "created_on",
            "chartType": "bar",
            "yAxisId": "left",
            "aggregation": "daily",
            "color": "#000000"
        }"##;

        let error = serde_json::from_str::<SeriesDefinition>(json).unwrap_err();
        assert!(error.to_string().contains("reserved"));
    }

    #[test]
    fn parses_series_definition_from_dashboard_json() {
        let json = r##"{
            "id": "series-2",
            "label": "QA bugs",
            "dateField": "custom",
            "customDateFieldKey": "cf_12",
            "statusIds": [5],
            "chartType": "line",
            "yAxisId": "left",
            "aggregation": "cumulative",
            "color": "#10b981",
            "conditions": [{"field": "cf_628", "operator": "!", "values": ["QA"]}]
        }"##;

        let series: SeriesDefinition = serde_json::from_str(json).unwrap();

        assert_eq!(series.date_field, DateField::Custom);
        assert_eq!(series.custom_date_field_key.as_deref(), Some("cf_12"));
        assert_eq!(series.axis, Axis::Left);
        assert_eq!(series.conditions[0].operator, Operator::NotEqualsAny);
        assert!(series.visible);
    }

    #[test]
    fn user_settings_fill_in_defaults() {
        let json = r#"{"version": 1, "series": [], "startDate": "2026-02-09"}"#;
        let settings: UserSettings = serde_json::from_str(json).unwrap();
        let options = settings.chart.aggregation_options();

        assert_eq!(options.start_date, NaiveDate::from_ymd_opt(2026, 2, 9));
        assert_eq!(options.anchor_weekday, AnchorWeekday::MONDAY);
        assert_eq!(settings.chart.chart_height(), DEFAULT_CHART_HEIGHT);
        assert_eq!(settings.chart.pie(PieSlot::Right).group_by, "tracker_id");
        assert_eq!(settings.chart.date_format, DateFormat::Iso);
    }
}
