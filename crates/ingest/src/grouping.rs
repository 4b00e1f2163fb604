use std::collections::BTreeMap;

use serde_json::Value;

use crate::normalizer::TITLE_COLUMN;
use crate::table::Row;

/// Cleaned rows keyed by job title. Rows keep their source order within a
/// title and no longer carry the `title` field themselves.
pub type GroupedJobs = BTreeMap<String, Vec<Row>>;

pub fn group_by_title(rows: Vec<Row>) -> GroupedJobs {
    let mut groups = GroupedJobs::new();

    for mut row in rows {
        let key = match row.shift_remove(TITLE_COLUMN) {
            Some(Value::String(title)) => title,
            Some(other) => other.to_string(),
            // Normalized rows always have a title; keep stragglers under ""
            None => String::new(),
        };
        groups.entry(key).or_default().push(row);
    }

    groups
}

pub fn total_rows(groups: &GroupedJobs) -> usize {
    groups.values().map(Vec::len).sum()
}
