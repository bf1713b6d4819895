use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::filter_catalog::FilterField;
use crate::models::{FilterOption, IssueStatus};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiltersResponse {
    pub fields: Vec<FilterField>,
    pub date_fields: Vec<FilterField>,
}

#[derive(Debug, Deserialize)]
pub struct OptionsQuery {
    pub project_id: Option<String>,
}

pub async fn statuses(State(state): State<AppState>) -> Json<Vec<IssueStatus>> {
    Json(state.store.statuses().await)
}

pub async fn filters(State(state): State<AppState>) -> Json<FiltersResponse> {
    Json(FiltersResponse {
        fields: state.catalog.list_fields(),
        date_fields: state.catalog.date_fields(),
    })
}

/// Value options of one filter field. Without `project_id` the first configured
/// project is asked.
pub async fn filter_options(
    State(state): State<AppState>,
    Path(field_key): Path<String>,
    Query(query): Query<OptionsQuery>,
) -> Json<Vec<FilterOption>> {
    let project_id = match query.project_id {
        Some(project_id) => project_id,
        None => state.store.project_ids().await.into_iter().next().unwrap_or_default(),
    };
    Json(state.catalog.options(&state.client, &project_id, &field_key).await)
}
