use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::filter_catalog::FilterCatalog;
use crate::models::{FetchProgress, Issue, IssueStatus};
use crate::redmine_client::{fallback_statuses, RedmineClient};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectSnapshot {
    #[serde(skip)]
    pub issues: Option<Arc<Vec<Issue>>>,
    pub loading: bool,
    pub progress: FetchProgress,
    pub error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl ProjectSnapshot {
    /// Issues to aggregate. Nothing fetched yet, or a failed fetch, means none.
    pub fn issues(&self) -> Arc<Vec<Issue>> {
        self.issues.clone().unwrap_or_default()
    }
}

/// Latest fetched state of every configured project, shared with the routes.
pub struct IssueStore {
    projects: RwLock<HashMap<String, ProjectSnapshot>>,
    statuses: RwLock<Vec<IssueStatus>>,
}

impl IssueStore {
    pub fn new(project_ids: &[String]) -> Self {
        let projects = project_ids
            .iter()
            .map(|id| (id.clone(), ProjectSnapshot::default()))
            .collect();
        Self {
            projects: RwLock::new(projects),
            statuses: RwLock::new(Vec::new()),
        }
    }

    pub async fn project_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.projects.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn snapshot(&self, project_id: &str) -> Option<ProjectSnapshot> {
        self.projects.read().await.get(project_id).cloned()
    }

    pub async fn statuses(&self) -> Vec<IssueStatus> {
        self.statuses.read().await.clone()
    }

    async fn update(&self, project_id: &str, apply: impl FnOnce(&mut ProjectSnapshot)) {
        let mut projects = self.projects.write().await;
        apply(projects.entry(project_id.to_string()).or_default());
    }

    pub async fn mark_loading(&self, project_id: &str) {
        self.update(project_id, |snapshot| {
            snapshot.loading = true;
            snapshot.progress = FetchProgress::default();
        })
        .await;
    }

    pub async fn record_progress(&self, project_id: &str, progress: FetchProgress) {
        self.update(project_id, |snapshot| snapshot.progress = progress).await;
    }

    pub async fn record_issues(&self, project_id: &str, issues: Vec<Issue>) {
        let fetched = issues.len() as u64;
        self.update(project_id, |snapshot| {
            snapshot.issues = Some(Arc::new(issues));
            snapshot.loading = false;
            snapshot.error = None;
            snapshot.progress = FetchProgress {
                fetched,
                total: Some(fetched),
            };
            snapshot.fetched_at = Some(Utc::now());
        })
        .await;
    }

    pub async fn record_failure(&self, project_id: &str, error: String) {
        self.update(project_id, |snapshot| {
            snapshot.issues = None;
            snapshot.loading = false;
            snapshot.error = Some(error);
            snapshot.progress = FetchProgress::default();
        })
        .await;
    }

    pub async fn set_statuses(&self, statuses: Vec<IssueStatus>) {
        *self.statuses.write().await = statuses;
    }
}

/// Status catalog in order of preference: the query's filter definitions, the
/// Redmine API, then the built-in list.
pub async fn collect_statuses(client: &RedmineClient, catalog: &FilterCatalog) -> Vec<IssueStatus> {
    if let Some(statuses) = catalog.statuses() {
        return statuses;
    }
    match client.fetch_issue_statuses().await {
        Ok(statuses) => statuses,
        Err(error) => {
            tracing::warn!(%error, "Could not fetch issue statuses, using fallback list");
            fallback_statuses()
        }
    }
}

pub async fn collect_project(client: &RedmineClient, store: &IssueStore, project_id: &str, issue_query: &str) {
    store.mark_loading(project_id).await;

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let fetch = client.fetch_all_issues(project_id, issue_query, move |progress| {
        let _ = progress_tx.send(progress);
    });
    let forward = async {
        while let Some(progress) = progress_rx.recv().await {
            store.record_progress(project_id, progress).await;
        }
    };
    // The sender lives inside `fetch`, so `forward` ends once the fetch is done.
    let (result, ()) = tokio::join!(fetch, forward);

    match result {
        Ok(issues) => {
            tracing::info!(project_id, issues = issues.len(), "Collected issues");
            store.record_issues(project_id, issues).await;
        }
        Err(error) => {
            tracing::error!(project_id, %error, "Error collecting issues");
            store.record_failure(project_id, error.to_string()).await;
        }
    }
}

pub async fn collect_data(client: &RedmineClient, catalog: &FilterCatalog, store: &IssueStore, issue_query: &str) {
    tracing::info!("Collecting data...");

    store.set_statuses(collect_statuses(client, catalog).await).await;
    for project_id in store.project_ids().await {
        collect_project(client, store, &project_id, issue_query).await;
    }

    tracing::info!("Data collected");
}
