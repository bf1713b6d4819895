use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;

use crate::aggregator::{aggregate, aggregate_pie, DataPoint, PieSlice};
use crate::collector::ProjectSnapshot;
use crate::combo_chart::render_combo_chart;
use crate::filter_catalog::FilterCatalog;
use crate::pie_chart::render_pie_chart;
use crate::routes::error::AppError;
use crate::settings::{ChartSettings, PieSlot, UserSettings};
use crate::AppState;

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn parse_slot(raw: &str) -> Result<PieSlot, AppError> {
    match raw {
        "left" => Ok(PieSlot::Left),
        "right" => Ok(PieSlot::Right),
        other => Err(AppError::not_found(&format!("Unknown pie slot {other}"))),
    }
}

/// Chart title for a pie grouped by `group_by`.
pub fn pie_title(catalog: &FilterCatalog, group_by: &str) -> String {
    if let Some(name) = catalog.field_name(group_by) {
        return name.to_string();
    }
    match group_by {
        "status_id" => "Status",
        "tracker_id" => "Tracker",
        "priority_id" => "Priority",
        "assigned_to_id" => "Assignee",
        key => key,
    }
    .to_string()
}

pub async fn project_snapshot(state: &AppState, project_id: &str) -> Result<ProjectSnapshot, AppError> {
    state
        .store
        .snapshot(project_id)
        .await
        .ok_or_else(|| AppError::not_found(&format!("Unknown project {project_id}")))
}

/// Stored chart settings of a project, or the defaults when none are stored.
pub async fn project_settings(state: &AppState, project_id: &str) -> Result<ChartSettings, AppError> {
    let stored = state.database.load_settings(project_id).await?;
    Ok(stored.map(|settings| settings.chart).unwrap_or_default())
}

pub fn series_points(snapshot: &ProjectSnapshot, settings: &ChartSettings, today: NaiveDate) -> Vec<DataPoint> {
    aggregate(
        &snapshot.issues(),
        &settings.series,
        &settings.aggregation_options(),
        today,
    )
}

pub fn pie_slices(snapshot: &ProjectSnapshot, settings: &ChartSettings, slot: PieSlot) -> Vec<PieSlice> {
    let pie = settings.pie(slot);
    aggregate_pie(&snapshot.issues(), &pie.group_by, &pie.conditions)
}

pub fn pie_svg(catalog: &FilterCatalog, snapshot: &ProjectSnapshot, settings: &ChartSettings, slot: PieSlot) -> String {
    let title = pie_title(catalog, &settings.pie(slot).group_by);
    render_pie_chart(&pie_slices(snapshot, settings, slot), &title)
}

/// Fetch state of a project: loading flag, progress, last error and fetch time.
pub async fn status(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectSnapshot>, AppError> {
    Ok(Json(project_snapshot(&state, &project_id).await?))
}

pub async fn series(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<DataPoint>>, AppError> {
    let snapshot = project_snapshot(&state, &project_id).await?;
    let settings = project_settings(&state, &project_id).await?;
    Ok(Json(series_points(&snapshot, &settings, today())))
}

pub async fn combo_svg(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = project_snapshot(&state, &project_id).await?;
    let settings = project_settings(&state, &project_id).await?;
    let points = series_points(&snapshot, &settings, today());
    Ok(([(axum::http::header::CONTENT_TYPE, "image/svg+xml")], render_combo_chart(&points, &settings)))
}

pub async fn pie(
    State(state): State<AppState>,
    Path((project_id, slot)): Path<(String, String)>,
) -> Result<Json<Vec<PieSlice>>, AppError> {
    let slot = parse_slot(&slot)?;
    let snapshot = project_snapshot(&state, &project_id).await?;
    let settings = project_settings(&state, &project_id).await?;
    Ok(Json(pie_slices(&snapshot, &settings, slot)))
}

pub async fn pie_chart_svg(
    State(state): State<AppState>,
    Path((project_id, slot)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let slot = parse_slot(&slot)?;
    let snapshot = project_snapshot(&state, &project_id).await?;
    let settings = project_settings(&state, &project_id).await?;
    Ok(([(axum::http::header::CONTENT_TYPE, "image/svg+xml")], pie_svg(&state.catalog, &snapshot, &settings, slot)))
}

pub async fn get_settings(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<UserSettings>, AppError> {
    project_snapshot(&state, &project_id).await?;
    let settings = project_settings(&state, &project_id).await?;
    Ok(Json(UserSettings::new(settings)))
}

/// Replaces the stored settings. The body may carry a `version` field, the
/// stored row always gets the current one.
pub async fn put_settings(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(chart): Json<ChartSettings>,
) -> Result<Json<UserSettings>, AppError> {
    project_snapshot(&state, &project_id).await?;
    let settings = UserSettings::new(chart);
    state.database.save_settings(&project_id, &settings).await?;
    tracing::info!(project_id, series = settings.chart.series.len(), "Saved chart settings");
    Ok(Json(settings))
}
