use axum::extract::{Path, State};
use axum::response::Html;
use itertools::Itertools;

use crate::collector::ProjectSnapshot;
use crate::combo_chart::render_combo_chart;
use crate::routes::error::AppError;
use crate::routes::projects::{pie_svg, project_settings, project_snapshot, series_points, today};
use crate::settings::PieSlot;
use crate::AppState;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Fetch state shown above the charts. Empty once issues are loaded.
pub fn status_banner(snapshot: &ProjectSnapshot) -> String {
    if snapshot.loading {
        let total = snapshot
            .progress
            .total
            .map(|total| total.to_string())
            .unwrap_or_else(|| "?".to_string());
        return format!(
            r#"<p class="loading">Loading issues... {} / {}</p>"#,
            snapshot.progress.fetched, total
        );
    }
    match (&snapshot.error, &snapshot.issues) {
        (Some(error), _) => format!(
            r#"<p class="error">Data unavailable: {}</p>"#,
            escape(error)
        ),
        (None, None) => r#"<p class="loading">Waiting for the first fetch...</p>"#.to_string(),
        (None, Some(_)) => String::new(),
    }
}

pub async fn root(State(state): State<AppState>) -> Html<String> {
    let project_ids = state.store.project_ids().await;

    let projects_html = project_ids
        .iter()
        .map(|id| {
            let id = escape(id);
            format!(r#"<li><a href="/projects/{id}">{id}</a></li>"#)
        })
        .join("");

    Html(format!(
        r#"
        <!DOCTYPE html>
        <html>
            <head>
                <title>Redmine issue graph</title>
            </head>
            <body>
                <h1>Projects</h1>
                <ul>
                    {}
                </ul>
            </body>
        </html>
        "#,
        projects_html
    ))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let snapshot = project_snapshot(&state, &project_id).await?;
    let settings = project_settings(&state, &project_id).await?;

    let points = series_points(&snapshot, &settings, today());
    let combo = render_combo_chart(&points, &settings);
    let pies = [PieSlot::Left, PieSlot::Right]
        .into_iter()
        .map(|slot| format!("<div>{}</div>", pie_svg(&state.catalog, &snapshot, &settings, slot)))
        .join("");
    let fetched_at = snapshot
        .fetched_at
        .map(|at| format!("<p>Last fetched {}</p>", at.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_default();

    Ok(Html(format!(
        r#"
        <!DOCTYPE html>
        <html>
            <head>
                <title>{project} | Redmine issue graph</title>
            </head>
            <body>
                <a href="/">Projects</a>
                <h1>{project}</h1>
                {banner}
                {fetched_at}
                <div>{combo}</div>
                <div style="display: flex">{pies}</div>
            </body>
        </html>
        "#,
        project = escape(&project_id),
        banner = status_banner(&snapshot),
    )))
}
