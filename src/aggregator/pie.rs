use itertools::Itertools;

use super::conditions::{custom_field_id, matches_all};
use super::PieSlice;
use crate::models::Issue;
use crate::settings::Condition;

fn group_label<'a>(issue: &'a Issue, group_by: &str) -> Option<&'a str> {
    match group_by {
        "status_id" => Some(issue.status.name.as_str()),
        "tracker_id" => Some(issue.tracker.name.as_str()),
        "priority_id" => issue.priority.as_ref().map(|p| p.name.as_str()),
        "assigned_to_id" => issue.assigned_to.as_ref().map(|a| a.name.as_str()),
        key => issue.custom_field(custom_field_id(key)??)?.value.first(),
    }
}

/// Counts issues per `group_by` label, largest group first. Issues without a
/// label are left out.
pub fn aggregate_pie(issues: &[Issue], group_by: &str, conditions: &[Condition]) -> Vec<PieSlice> {
    issues
        .iter()
        .filter(|issue| conditions.is_empty() || matches_all(issue, conditions))
        .filter_map(|issue| group_label(issue, group_by))
        .filter(|label| !label.is_empty())
        .counts()
        .into_iter()
        .map(|(name, count)| PieSlice {
            name: name.to_string(),
            count: count as u64,
        })
        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)))
        .collect()
}
