use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: u64,
    pub name: String,
}

/// Value of a Redmine custom field. Multi-select fields come back as lists,
/// unset fields as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomFieldValue {
    Text(String),
    List(Vec<Option<String>>),
    #[default]
    Null,
}

impl CustomFieldValue {
    /// Every non-null value, in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            CustomFieldValue::Text(value) => vec![value.as_str()],
            CustomFieldValue::List(values) => values.iter().flatten().map(String::as_str).collect(),
            CustomFieldValue::Null => Vec::new(),
        }
    }

    /// The scalar value, or the first list element when it is non-null.
    pub fn first(&self) -> Option<&str> {
        match self {
            CustomFieldValue::Text(value) => Some(value.as_str()),
            CustomFieldValue::List(values) => values.first().and_then(|v| v.as_deref()),
            CustomFieldValue::Null => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub value: CustomFieldValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub status: NamedRef,
    pub tracker: NamedRef,
    #[serde(default)]
    pub priority: Option<NamedRef>,
    #[serde(default)]
    pub assigned_to: Option<NamedRef>,
    pub created_on: String,
    #[serde(default)]
    pub closed_on: Option<String>,
    #[serde(default)]
    pub updated_on: Option<String>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    #[serde(flatten)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Issue {
    pub fn custom_field(&self, id: u64) -> Option<&CustomField> {
        self.custom_fields.iter().find(|field| field.id == id)
    }

    /// Looks up a string-valued attribute by its Redmine name (`due_date`,
    /// `start_date`, ...).
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match name {
            "created_on" => Some(self.created_on.as_str()),
            "closed_on" => self.closed_on.as_deref(),
            "updated_on" => self.updated_on.as_deref(),
            _ => self.attributes.get(name).and_then(serde_json::Value::as_str),
        }
    }
}

#[derive(Deserialize)]
pub struct IssueListResponse {
    pub issues: Vec<Issue>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStatus {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub is_closed: bool,
}

#[derive(Deserialize)]
pub struct IssueStatusesResponse {
    pub issue_statuses: Vec<IssueStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchProgress {
    pub fetched: u64,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}
