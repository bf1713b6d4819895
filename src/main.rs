mod aggregator;
mod collector;
mod combo_chart;
mod config;
mod database;
mod filter_catalog;
mod logging;
mod models;
mod pie_chart;
mod redmine_client;
mod renderer;
mod routes;
mod settings;

use std::sync::Arc;

use axum::routing::{delete, get};
use tower_http::trace::TraceLayer;

use collector::*;
use config::Config;
use database::*;
use filter_catalog::FilterCatalog;
use redmine_client::RedmineClient;
use routes::{catalog, presets, projects, root};

#[derive(Clone)]
pub struct AppState {
    database: Arc<Database>,
    store: Arc<IssueStore>,
    catalog: Arc<FilterCatalog>,
    client: Arc<RedmineClient>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    logging::init_tracing(&config.log_level);
    tracing::info!(?config, "Starting redmine-issue-graph");

    let state = AppState {
        database: Arc::new(Database::new(&config.storage_dir).await?),
        store: Arc::new(IssueStore::new(&config.redmine.projects)),
        catalog: Arc::new(FilterCatalog::load(config.redmine.available_filters_path.as_deref())),
        client: Arc::new(RedmineClient::new(&config.redmine)?),
    };

    tokio::spawn(run_data_collector(
        state.clone(),
        config.redmine.issue_query.clone(),
        tokio::time::Duration::from_secs(config.refresh_interval_secs),
    ));

    let app = axum::Router::new()
        .route("/", get(root::root))
        .route("/projects/{project_id}", get(root::dashboard))
        .route("/projects/{project_id}/status", get(projects::status))
        .route("/projects/{project_id}/series", get(projects::series))
        .route("/projects/{project_id}/combo.svg", get(projects::combo_svg))
        .route("/projects/{project_id}/pie/{slot}", get(projects::pie))
        .route("/projects/{project_id}/pie/{slot}/chart.svg", get(projects::pie_chart_svg))
        .route(
            "/projects/{project_id}/settings",
            get(projects::get_settings).put(projects::put_settings),
        )
        .route("/presets", get(presets::list_presets).post(presets::create_preset))
        .route("/presets/{preset_id}", delete(presets::delete_preset))
        .route("/statuses", get(catalog::statuses))
        .route("/filters", get(catalog::filters))
        .route("/filters/{field_key}/options", get(catalog::filter_options))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str()).await?;
    tracing::info!(addr = %config.bind_addr, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_data_collector(state: AppState, issue_query: String, interval: tokio::time::Duration) {
    loop {
        collect_data(&state.client, &state.catalog, &state.store, &issue_query).await;

        tracing::info!(seconds = interval.as_secs(), "Sleeping until next refresh");
        tokio::time::sleep(interval).await;
    }
}
