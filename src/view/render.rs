//! Render plan
//!
//! The renderer consumes a flat instruction list; all block math and
//! labeling is finished here so the renderer never touches magnitudes.

use serde::Serialize;

use super::View;
use crate::models::Color;
use crate::normalize::format_billions;

/// Placeholder for records that somehow reach rendering uncolored.
const UNCOLORED: Color = Color {
    r: 0x99,
    g: 0x99,
    b: 0x99,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialBlock {
    /// Fractional occupancy of the block, in (0, 1].
    pub ratio: f64,
    /// Edge scale applied to both dimensions so rendered area equals
    /// `ratio`.
    pub area_scale: f64,
}

/// One item's stretch of blocks.
#[derive(Debug, Clone, Serialize)]
pub struct BlockRun {
    pub id: String,
    pub slug: String,
    pub name: String,
    /// "[Category] Name ($240 billion)" wrapper label.
    pub label: String,
    pub tooltip: String,
    pub color: Color,
    pub full_blocks: u64,
    pub partial: Option<PartialBlock>,
}

impl BlockRun {
    pub fn total_blocks(&self) -> u64 {
        self.full_blocks + u64::from(self.partial.is_some())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderPlan {
    /// The "= $100B" scale reference shown ahead of the runs.
    pub scale_per_block: f64,
    pub runs: Vec<BlockRun>,
    pub total_blocks: u64,
}

pub fn render_plan(view: &View) -> RenderPlan {
    let runs: Vec<BlockRun> = view
        .items
        .iter()
        .map(|item| {
            let display_value = item
                .record
                .value_formatted
                .clone()
                .unwrap_or_else(|| format_billions(item.value_billions));

            BlockRun {
                id: item.record.id.clone(),
                slug: item.record.slug.clone(),
                name: item.record.name.clone(),
                label: format!(
                    "[{}] {} (${})",
                    item.category_name, item.record.name, display_value
                ),
                tooltip: format!("{}: ${}", item.record.name, display_value),
                color: item.record.color.unwrap_or(UNCOLORED),
                full_blocks: item.quantization.full_blocks,
                partial: item.quantization.has_partial.then(|| PartialBlock {
                    ratio: item.quantization.partial_ratio,
                    area_scale: item.quantization.area_scale(),
                }),
            }
        })
        .collect();

    let total_blocks = runs.iter().map(BlockRun::total_blocks).sum();

    RenderPlan {
        scale_per_block: view.scale_per_block,
        runs,
        total_blocks,
    }
}
