//! Comparison summaries
//!
//! A user-chosen set of records lined up against each other: ceiling
//! block counts and each entry's share of the largest.

use serde::Serialize;

use crate::models::Snapshot;
use crate::normalize::sort_value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub id: String,
    pub name: String,
    pub category_name: String,
    pub value_billions: f64,
    /// Whole blocks needed to cover the value (ceiling division).
    pub blocks: u64,
    /// Share of the largest entry in the set, in [0, 1].
    pub ratio_of_largest: f64,
}

/// Summarize the chosen ids, sorted by value descending. Unknown ids
/// are ignored; an empty selection yields an empty summary.
pub fn compare(snapshot: &Snapshot, ids: &[String], scale_per_block: f64) -> Vec<ComparisonEntry> {
    let mut entries: Vec<ComparisonEntry> = snapshot
        .items
        .iter()
        .filter(|record| ids.contains(&record.id))
        .map(|record| {
            let value_billions = sort_value(record);
            ComparisonEntry {
                id: record.id.clone(),
                name: record.name.clone(),
                category_name: snapshot
                    .category_by_id(&record.category_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                value_billions,
                blocks: (value_billions / scale_per_block).ceil() as u64,
                ratio_of_largest: 0.0,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.value_billions
            .partial_cmp(&a.value_billions)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let largest = entries.first().map(|e| e.value_billions).unwrap_or(0.0);
    for entry in &mut entries {
        entry.ratio_of_largest = if largest > 0.0 {
            entry.value_billions / largest
        } else {
            0.0
        };
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Metadata, Record};

    fn record(id: &str, value: f64) -> Record {
        Record {
            id: id.into(),
            slug: format!("{id}-slug"),
            name: id.to_uppercase(),
            category_id: "cat".into(),
            value_billions: Some(value),
            value_formatted: None,
            is_live_updatable: false,
            api_config: None,
            color: None,
            last_updated: None,
            data_source: None,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            metadata: Metadata {
                last_updated: "2025-07-04T00:00:00Z".into(),
                data_version: "1.0".into(),
                currency: "USD".into(),
                base_unit: "billions".into(),
                block_representation: 100.0,
            },
            categories: vec![Category {
                id: "cat".into(),
                name: "Category".into(),
                color: None,
            }],
            items: vec![record("a", 240.0), record("b", 480.0), record("c", 10.0)],
        }
    }

    #[test]
    fn test_compare_sorts_descending_with_ratios() {
        let ids = vec!["a".to_string(), "b".to_string()];
        let entries = compare(&snapshot(), &ids, 100.0);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "b");
        assert_eq!(entries[0].ratio_of_largest, 1.0);
        assert_eq!(entries[0].blocks, 5);
        assert_eq!(entries[1].id, "a");
        assert_eq!(entries[1].ratio_of_largest, 0.5);
        assert_eq!(entries[1].blocks, 3);
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let ids = vec!["a".to_string(), "nope".to_string()];
        let entries = compare(&snapshot(), &ids, 100.0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a");
    }

    #[test]
    fn test_empty_selection_is_empty() {
        assert!(compare(&snapshot(), &[], 100.0).is_empty());
    }
}
