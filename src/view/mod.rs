//! View pipeline
//!
//! Presentation staging layered on the authoritative snapshot:
//! filtering, sorting, statistics and the block-level render plan the
//! renderer consumes. Nothing here mutates the snapshot.

pub mod compare;
pub mod filter;
pub mod render;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::models::{Record, Snapshot};
use crate::normalize::sort_value;
use crate::quantize::{quantize, Quantization};

use self::filter::ViewFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Ascending by magnitude, the display default.
    #[default]
    Value,
    Name,
    Category,
}

/// How much to trust a record's figure, from its update channel and age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Credibility {
    /// Manually curated figure, no live channel.
    Static,
    /// Live-updated within the last day.
    Live,
    /// Live-updatable but last refreshed `days` ago (within a week).
    Recent { days: i64 },
    /// Live-updatable but not refreshed for over a week.
    Outdated,
}

pub fn credibility(record: &Record, now: DateTime<Utc>) -> Credibility {
    if !record.is_live_updatable && record.api_config.is_none() {
        return Credibility::Static;
    }

    let days_since_update = record
        .last_updated
        .as_deref()
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| (now - t.with_timezone(&Utc)).num_days())
        .unwrap_or(i64::MAX);

    match days_since_update {
        d if d <= 1 => Credibility::Live,
        d if d <= 7 => Credibility::Recent { days: d },
        _ => Credibility::Outdated,
    }
}

#[derive(Debug, Clone)]
pub struct ViewItem {
    pub record: Record,
    /// NaN-sanitized magnitude used for sorting, stats and blocks.
    pub value_billions: f64,
    pub category_name: String,
    pub quantization: Quantization,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewStats {
    pub total_value: f64,
    pub total_items: usize,
    pub live_items: usize,
    pub total_blocks: u64,
}

#[derive(Debug, Clone)]
pub struct View {
    pub items: Vec<ViewItem>,
    pub stats: ViewStats,
    pub scale_per_block: f64,
}

/// Build the filtered, sorted, quantized view of a snapshot.
pub fn build_view(
    snapshot: &Snapshot,
    filter: &ViewFilter,
    sort: SortBy,
    scale_per_block: f64,
) -> View {
    let mut items: Vec<ViewItem> = snapshot
        .items
        .iter()
        .filter(|record| filter.matches(record, snapshot))
        .map(|record| {
            let category_name = match snapshot.category_by_id(&record.category_id) {
                Some(category) => category.name.clone(),
                None => {
                    warn!(
                        id = %record.id,
                        category = %record.category_id,
                        "unresolved category reference"
                    );
                    "Unknown".to_string()
                }
            };
            let value_billions = sort_value(record);
            ViewItem {
                value_billions,
                category_name,
                quantization: quantize(value_billions, scale_per_block),
                record: record.clone(),
            }
        })
        .collect();

    match sort {
        SortBy::Value => items.sort_by(|a, b| {
            a.value_billions
                .partial_cmp(&b.value_billions)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortBy::Name => items.sort_by(|a, b| a.record.name.cmp(&b.record.name)),
        SortBy::Category => items.sort_by(|a, b| a.record.category_id.cmp(&b.record.category_id)),
    }

    let stats = ViewStats {
        total_value: items.iter().map(|i| i.value_billions).sum(),
        total_items: items.len(),
        live_items: items
            .iter()
            .filter(|i| i.record.is_live_updatable)
            .count(),
        total_blocks: items.iter().map(|i| i.quantization.total_blocks()).sum(),
    };

    View {
        items,
        stats,
        scale_per_block,
    }
}
