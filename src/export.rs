//! Export artifact
//!
//! One-way JSON document describing the current filtered view. It is
//! never re-ingested by this system.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::models::Metadata;
use crate::view::View;

#[derive(Debug, Clone, Serialize)]
pub struct ExportItem {
    pub name: String,
    pub slug: String,
    pub category: String,
    /// Human-readable value string.
    pub value: Option<String>,
    #[serde(rename = "valueBillions")]
    pub value_billions: f64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<String>,
    #[serde(rename = "isLiveUpdatable")]
    pub is_live_updatable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportStatistics {
    #[serde(rename = "totalValue")]
    pub total_value: f64,
    #[serde(rename = "totalItems")]
    pub total_items: usize,
    #[serde(rename = "liveItems")]
    pub live_items: usize,
    #[serde(rename = "exportDate")]
    pub export_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportDocument {
    pub metadata: Metadata,
    #[serde(rename = "filteredItems")]
    pub filtered_items: Vec<ExportItem>,
    pub statistics: ExportStatistics,
}

pub fn build_export(metadata: &Metadata, view: &View) -> ExportDocument {
    let filtered_items = view
        .items
        .iter()
        .map(|item| ExportItem {
            name: item.record.name.clone(),
            slug: item.record.slug.clone(),
            category: item.category_name.clone(),
            value: item.record.value_formatted.clone(),
            value_billions: item.value_billions,
            last_updated: item.record.last_updated.clone(),
            is_live_updatable: item.record.is_live_updatable,
        })
        .collect();

    ExportDocument {
        metadata: metadata.clone(),
        filtered_items,
        statistics: ExportStatistics {
            total_value: view.stats.total_value,
            total_items: view.stats.total_items,
            live_items: view.stats.live_items,
            export_date: Utc::now().to_rfc3339(),
        },
    }
}

/// `wealth-data-export-YYYY-MM-DD.json` in the working directory.
pub fn default_export_path() -> PathBuf {
    PathBuf::from(format!(
        "wealth-data-export-{}.json",
        Utc::now().format("%Y-%m-%d")
    ))
}

pub fn write_export(document: &ExportDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(document).context("Failed to serialize export")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;
    Ok(())
}
