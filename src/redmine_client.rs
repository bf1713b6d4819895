use crate::config::RedmineConfig;
use crate::models::*;
use thiserror::Error;

pub const PAGE_SIZE: u64 = 100;
const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Parameters the client always sets itself on issue queries.
const FORCED_ISSUE_PARAMS: [&str; 3] = ["status_id", "limit", "offset"];

#[derive(Error, Debug)]
pub enum RedmineError {
    #[error("Request to {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {path} returned status {status}")]
    Status { path: String, status: u16 },
    #[error("Invalid API key header: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

pub struct RedmineClient {
    client: reqwest::Client,
    base_url: String,
}

/// Statuses used when Redmine cannot be asked for its own.
pub fn fallback_statuses() -> Vec<IssueStatus> {
    [
        (1, "New", false),
        (2, "In Progress", false),
        (3, "Feedback", false),
        (4, "Resolved", false),
        (5, "Closed", true),
        (6, "Dropped", true),
    ]
    .into_iter()
    .map(|(id, name, is_closed)| IssueStatus {
        id,
        name: name.to_string(),
        is_closed,
    })
    .collect()
}

/// Keeps the caller's filters but takes over status and paging.
pub fn issue_query_params(raw_query: &str, offset: u64, limit: u64) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url::form_urlencoded::parse(raw_query.trim_start_matches('?').as_bytes())
        .filter(|(key, _)| !FORCED_ISSUE_PARAMS.iter().any(|forced| *forced == *key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    params.push(("status_id".to_string(), "*".to_string()));
    params.push(("limit".to_string(), limit.to_string()));
    params.push(("offset".to_string(), offset.to_string()));
    params
}

/// Accepts both `["QA","BUG"]` and `[["Bug","1"], ...]` shaped option lists.
pub fn parse_filter_options(data: &serde_json::Value) -> Vec<FilterOption> {
    let Some(items) = data.as_array() else {
        return Vec::new();
    };
    match items.first() {
        Some(serde_json::Value::String(_)) => items
            .iter()
            .filter_map(serde_json::Value::as_str)
            .map(|value| FilterOption {
                label: value.to_string(),
                value: value.to_string(),
            })
            .collect(),
        Some(serde_json::Value::Array(_)) => items.iter().filter_map(option_pair).collect(),
        _ => Vec::new(),
    }
}

pub fn option_pair(item: &serde_json::Value) -> Option<FilterOption> {
    let pair = item.as_array()?;
    if pair.len() < 2 {
        return None;
    }
    let text = |value: &serde_json::Value| match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    Some(FilterOption {
        label: text(&pair[0])?,
        value: text(&pair[1])?,
    })
}

impl RedmineClient {
    pub fn new(config: &RedmineConfig) -> Result<Self, RedmineError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if !config.api_key.is_empty() {
            headers.insert(API_KEY_HEADER, config.api_key.parse()?);
        }

        Ok(Self {
            client: reqwest::Client::builder()
                .default_headers(headers)
                .build()
                .map_err(RedmineError::Client)?,
            base_url: config.base_url.clone(),
        })
    }

    async fn _get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, RedmineError> {
        let url = format!("{}{}", self.base_url, path);
        let http_error = |source| RedmineError::Http {
            path: path.to_string(),
            source,
        };
        let response = self.client.get(url).query(query).send().await.map_err(http_error)?;
        if !response.status().is_success() {
            return Err(RedmineError::Status {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }
        response.json::<T>().await.map_err(http_error)
    }

    pub async fn fetch_issue_statuses(&self) -> Result<Vec<IssueStatus>, RedmineError> {
        let response: IssueStatusesResponse = self._get("/issue_statuses.json", &[]).await?;
        Ok(response.issue_statuses)
    }

    /// Pages through every issue of the query, reporting progress after each page.
    pub async fn fetch_all_issues(
        &self,
        project_id: &str,
        raw_query: &str,
        mut on_progress: impl FnMut(FetchProgress),
    ) -> Result<Vec<Issue>, RedmineError> {
        let path = format!("/projects/{}/issues.json", project_id);
        let mut issues: Vec<Issue> = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                ._get::<IssueListResponse>(&path, &issue_query_params(raw_query, offset, PAGE_SIZE))
                .await?;

            let page_size = page.issues.len();
            issues.extend(page.issues);
            on_progress(FetchProgress {
                fetched: issues.len() as u64,
                total: Some(page.total_count),
            });
            tracing::debug!(
                project_id,
                fetched = issues.len(),
                total = page.total_count,
                "Fetched issue page"
            );

            if issues.len() as u64 >= page.total_count || page_size == 0 {
                break;
            }
            offset += PAGE_SIZE;
        }

        Ok(issues)
    }

    pub async fn fetch_filter_options(
        &self,
        project_id: &str,
        field_key: &str,
    ) -> Result<Vec<FilterOption>, RedmineError> {
        let query = [
            ("project_id".to_string(), project_id.to_string()),
            ("type".to_string(), "IssueQuery".to_string()),
            ("name".to_string(), field_key.to_string()),
        ];
        let data: serde_json::Value = self._get("/queries/filter", &query).await?;
        Ok(parse_filter_options(&data))
    }
}
