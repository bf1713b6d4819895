use crate::models::Issue;
use crate::settings::{Condition, Operator};

/// Issue fields a condition can test. Keys that map to `Unsupported` make the
/// condition a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueField {
    StatusId,
    TrackerId,
    PriorityId,
    CustomField(Option<u64>),
    Unsupported,
}

const FIELD_TABLE: &[(&str, IssueField)] = &[
    ("status_id", IssueField::StatusId),
    ("tracker_id", IssueField::TrackerId),
    ("priority_id", IssueField::PriorityId),
];

const CUSTOM_FIELD_PREFIX: &str = "cf_";

pub fn custom_field_id(key: &str) -> Option<Option<u64>> {
    key.strip_prefix(CUSTOM_FIELD_PREFIX).map(|id| id.parse().ok())
}

impl IssueField {
    pub fn from_key(key: &str) -> Self {
        if let Some((_, field)) = FIELD_TABLE.iter().find(|(name, _)| *name == key) {
            return *field;
        }
        match custom_field_id(key) {
            Some(id) => IssueField::CustomField(id),
            None => IssueField::Unsupported,
        }
    }

    /// Values the issue holds for this field, `None` when the field is unsupported.
    pub fn resolve(self, issue: &Issue) -> Option<Vec<String>> {
        let values = match self {
            IssueField::StatusId => vec![issue.status.id.to_string()],
            IssueField::TrackerId => vec![issue.tracker.id.to_string()],
            IssueField::PriorityId => issue
                .priority
                .iter()
                .map(|priority| priority.id.to_string())
                .collect(),
            IssueField::CustomField(id) => id
                .and_then(|id| issue.custom_field(id))
                .map(|field| field.value.values().into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
            IssueField::Unsupported => return None,
        };
        Some(values)
    }
}

pub fn matches(issue: &Issue, condition: &Condition) -> bool {
    let Some(issue_values) = IssueField::from_key(&condition.field).resolve(issue) else {
        return true;
    };
    let overlaps = condition
        .values
        .iter()
        .any(|wanted| issue_values.iter().any(|value| value == wanted));
    match condition.operator {
        Operator::EqualsAny => overlaps,
        Operator::NotEqualsAny => !overlaps,
    }
}

pub fn matches_all(issue: &Issue, conditions: &[Condition]) -> bool {
    conditions.iter().all(|condition| matches(issue, condition))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{CustomField, CustomFieldValue, Issue, NamedRef};

    pub fn issue(id: u64, status: u64, tracker: u64, created_on: &str) -> Issue {
        Issue {
            id,
            status: NamedRef {
                id: status,
                name: format!("Status {status}"),
            },
            tracker: NamedRef {
                id: tracker,
                name: format!("Tracker {tracker}"),
            },
            priority: None,
            assigned_to: None,
            created_on: created_on.to_string(),
            closed_on: None,
            updated_on: None,
            custom_fields: Vec::new(),
            attributes: serde_json::Map::new(),
        }
    }

    pub fn with_custom_field(mut issue: Issue, id: u64, value: CustomFieldValue) -> Issue {
        issue.custom_fields.push(CustomField {
            id,
            name: format!("Field {id}"),
            value,
        });
        issue
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::models::{CustomFieldValue, NamedRef};
    use proptest::prelude::*;

    fn condition(field: &str, operator: Operator, values: &[&str]) -> Condition {
        Condition {
            field: field.to_string(),
            operator,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn field_keys_map_to_resolvers() {
        assert_eq!(IssueField::from_key("status_id"), IssueField::StatusId);
        assert_eq!(IssueField::from_key("cf_628"), IssueField::CustomField(Some(628)));
        assert_eq!(IssueField::from_key("cf_x"), IssueField::CustomField(None));
        assert_eq!(IssueField::from_key("assigned_to_id"), IssueField::Unsupported);
    }

    #[test]
    fn tracker_condition_compares_ids_as_strings() {
        let bug = issue(1, 1, 2, "2026-02-10T00:00:00Z");
        assert!(matches(&bug, &condition("tracker_id", Operator::EqualsAny, &["1", "2"])));
        assert!(!matches(&bug, &condition("tracker_id", Operator::NotEqualsAny, &["2"])));
    }

    #[test]
    fn missing_priority_only_satisfies_not_equals() {
        let mut plain = issue(1, 1, 1, "2026-02-10T00:00:00Z");
        assert!(!matches(&plain, &condition("priority_id", Operator::EqualsAny, &["3"])));
        assert!(matches(&plain, &condition("priority_id", Operator::NotEqualsAny, &["3"])));

        plain.priority = Some(NamedRef { id: 3, name: "High".to_string() });
        assert!(matches(&plain, &condition("priority_id", Operator::EqualsAny, &["3"])));
    }

    #[test]
    fn custom_field_lists_match_any_element() {
        let tagged = with_custom_field(
            issue(1, 1, 1, "2026-02-10T00:00:00Z"),
            628,
            CustomFieldValue::List(vec![Some("QA".to_string()), None, Some("BUG".to_string())]),
        );
        assert!(matches(&tagged, &condition("cf_628", Operator::EqualsAny, &["BUG"])));
        assert!(!matches(&tagged, &condition("cf_628", Operator::NotEqualsAny, &["QA"])));
        assert!(matches(&tagged, &condition("cf_999", Operator::NotEqualsAny, &["QA"])));
        assert!(!matches(&tagged, &condition("cf_999", Operator::EqualsAny, &["QA"])));
    }

    #[test]
    fn unknown_fields_are_ignored_for_both_operators() {
        let any = issue(1, 1, 1, "2026-02-10T00:00:00Z");
        assert!(matches(&any, &condition("category_id", Operator::EqualsAny, &["1"])));
        assert!(matches(&any, &condition("category_id", Operator::NotEqualsAny, &["1"])));
    }

    #[test]
    fn all_conditions_must_hold() {
        let bug = issue(1, 5, 1, "2026-02-10T00:00:00Z");
        let conditions = vec![
            condition("status_id", Operator::EqualsAny, &["5"]),
            condition("tracker_id", Operator::NotEqualsAny, &["1"]),
        ];
        assert!(matches_all(&bug, &[]));
        assert!(matches_all(&bug, &conditions[..1]));
        assert!(!matches_all(&bug, &conditions));
    }

    proptest! {
        #[test]
        fn operators_are_complements_for_known_fields(
            status in 1u64..6,
            tracker in 1u64..4,
            field in prop::sample::select(vec!["status_id", "tracker_id", "priority_id", "cf_7", "cf_8"]),
            wanted in prop::collection::vec("[1-5]", 0..3),
            cf_value in prop::option::of("[1-5]"),
        ) {
            let mut subject = issue(1, status, tracker, "2026-02-10T00:00:00Z");
            if let Some(value) = cf_value {
                subject = with_custom_field(subject, 7, CustomFieldValue::Text(value));
            }
            let wanted: Vec<&str> = wanted.iter().map(String::as_str).collect();
            let equals = matches(&subject, &condition(field, Operator::EqualsAny, &wanted));
            let not_equals = matches(&subject, &condition(field, Operator::NotEqualsAny, &wanted));
            prop_assert_ne!(equals, not_equals);
        }

        #[test]
        fn unknown_fields_match_under_both_operators(
            field in "[a-z]{1,8}_id",
            wanted in prop::collection::vec("[1-5]", 0..3),
        ) {
            prop_assume!(IssueField::from_key(&field) == IssueField::Unsupported);
            let subject = issue(1, 1, 1, "2026-02-10T00:00:00Z");
            let wanted: Vec<&str> = wanted.iter().map(String::as_str).collect();
            prop_assert!(matches(&subject, &condition(&field, Operator::EqualsAny, &wanted)));
            prop_assert!(matches(&subject, &condition(&field, Operator::NotEqualsAny, &wanted)));
        }
    }
}
