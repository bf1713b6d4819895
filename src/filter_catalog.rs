use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::models::{FilterOption, IssueStatus};
use crate::redmine_client::{option_pair, RedmineClient};

const LIST_TYPES: [&str; 4] = [
    "list",
    "list_optional",
    "list_with_history",
    "list_optional_with_history",
];

/// One entry of Redmine's `availableFilters` document.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableFilter {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterField {
    pub key: String,
    pub name: String,
}

/// Filterable fields of the issue query plus a process-wide cache of their
/// value options.
pub struct FilterCatalog {
    filters: BTreeMap<String, AvailableFilter>,
    options: RwLock<HashMap<String, Vec<FilterOption>>>,
}

impl FilterCatalog {
    pub fn new(filters: BTreeMap<String, AvailableFilter>) -> Self {
        Self {
            filters,
            options: RwLock::new(HashMap::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    /// Reads an `availableFilters` JSON document. A missing or malformed file
    /// leaves the catalog empty.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::empty();
        };
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(filters) => Self::new(filters),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Could not load available filters");
                Self::empty()
            }
        }
    }

    fn fields_where(&self, keep: impl Fn(&str, &AvailableFilter) -> bool) -> Vec<FilterField> {
        self.filters
            .iter()
            .filter(|(key, filter)| keep(key, filter))
            .map(|(key, filter)| FilterField {
                key: key.clone(),
                name: filter.name.clone(),
            })
            .collect()
    }

    /// Fields with a fixed set of choices, usable in conditions and pie grouping.
    pub fn list_fields(&self) -> Vec<FilterField> {
        self.fields_where(|_, filter| LIST_TYPES.contains(&filter.field_type.as_str()))
    }

    /// Date fields that the issues API returns directly on each issue.
    pub fn date_fields(&self) -> Vec<FilterField> {
        self.fields_where(|key, filter| filter.field_type == "date" && !key.contains('.'))
    }

    pub fn field_name(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(|filter| filter.name.as_str())
    }

    pub fn statuses(&self) -> Option<Vec<IssueStatus>> {
        let values = self.filters.get("status_id")?.values.as_ref()?;
        let statuses: Vec<IssueStatus> = values
            .iter()
            .filter_map(option_pair)
            .filter_map(|option| {
                Some(IssueStatus {
                    id: option.value.parse().ok()?,
                    name: option.label,
                    is_closed: false,
                })
            })
            .collect();
        (!statuses.is_empty()).then_some(statuses)
    }

    pub async fn options(&self, client: &RedmineClient, project_id: &str, field_key: &str) -> Vec<FilterOption> {
        if let Some(cached) = self.options.read().await.get(field_key) {
            return cached.clone();
        }
        let Some(filter) = self.filters.get(field_key) else {
            return Vec::new();
        };

        let options = match (&filter.values, filter.remote) {
            (Some(values), false) => values.iter().filter_map(option_pair).collect(),
            _ => match client.fetch_filter_options(project_id, field_key).await {
                Ok(options) => options,
                Err(error) => {
                    tracing::warn!(field_key, %error, "Could not fetch filter options");
                    return Vec::new();
                }
            },
        };

        self.options
            .write()
            .await
            .insert(field_key.to_string(), options.clone());
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RedmineConfig;

    fn catalog() -> FilterCatalog {
        let json = serde_json::json!({
            "status_id": {"name": "Status", "type": "list_status", "values": [["New", "1"], ["Closed", "5"]]},
            "tracker_id": {"name": "Tracker", "type": "list", "values": [["Bug", "1"], ["Task", "2"]]},
            "cf_628": {"name": "Type", "type": "list_optional", "remote": true},
            "due_date": {"name": "Due date", "type": "date"},
            "created_on": {"name": "Created", "type": "date_past"},
            "fixed_version.due_date": {"name": "Version due", "type": "date"},
            "subject": {"name": "Subject", "type": "text"}
        });
        FilterCatalog::new(serde_json::from_value(json).unwrap())
    }

    fn offline_client() -> RedmineClient {
        RedmineClient::new(&RedmineConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: String::new(),
            projects: Vec::new(),
            issue_query: String::new(),
            available_filters_path: None,
        })
        .unwrap()
    }

    #[test]
    fn lists_choice_and_date_fields() {
        let catalog = catalog();
        let keys = |fields: Vec<FilterField>| fields.into_iter().map(|f| f.key).collect::<Vec<_>>();

        assert_eq!(keys(catalog.list_fields()), vec!["cf_628", "tracker_id"]);
        assert_eq!(keys(catalog.date_fields()), vec!["due_date"]);
        assert_eq!(catalog.field_name("cf_628"), Some("Type"));
        assert_eq!(catalog.field_name("cf_1"), None);
    }

    #[test]
    fn reads_statuses_from_status_filter() {
        let statuses = catalog().statuses().unwrap();
        assert_eq!(statuses.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 5]);
        assert!(statuses.iter().all(|s| !s.is_closed));
        assert!(FilterCatalog::empty().statuses().is_none());
    }

    #[test]
    fn missing_file_gives_empty_catalog() {
        let catalog = FilterCatalog::load(Some(Path::new("/nonexistent/filters.json")));
        assert!(catalog.list_fields().is_empty());
    }

    #[tokio::test]
    async fn local_options_are_served_without_network() {
        let catalog = catalog();
        let client = offline_client();

        let options = catalog.options(&client, "europe", "tracker_id").await;

        assert_eq!(options.len(), 2);
        assert_eq!(options[0].label, "Bug");
        assert!(catalog.options(&client, "europe", "unknown").await.is_empty());
    }

    #[tokio::test]
    async fn remote_failures_are_not_cached() {
        let catalog = catalog();
        let client = offline_client();

        assert!(catalog.options(&client, "europe", "cf_628").await.is_empty());
        assert!(!catalog.options.read().await.contains_key("cf_628"));
    }
}
