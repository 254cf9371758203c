//! Block quantization
//!
//! Converts a magnitude in billions into whole display blocks plus an
//! optional trailing partial block. The partial block is an honest
//! area-proportional encoding: a block is two-dimensional, so the
//! renderer scales both edges by `area_scale` (the square root of the
//! occupancy ratio) and the rendered area equals the ratio exactly.

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantization {
    pub full_blocks: u64,
    pub has_partial: bool,
    /// Fractional occupancy of the trailing block, in (0, 1] whenever
    /// `has_partial`; 1.0 otherwise.
    pub partial_ratio: f64,
}

impl Quantization {
    /// Blocks the renderer actually draws, partial included.
    pub fn total_blocks(&self) -> u64 {
        self.full_blocks + u64::from(self.has_partial)
    }

    /// Edge scale factor for the partial block. Area scales with the
    /// square of the edge, so sqrt keeps area proportional to value.
    pub fn area_scale(&self) -> f64 {
        self.partial_ratio.sqrt()
    }
}

/// Quantize a magnitude into blocks of `scale_per_block` billions each.
///
/// `scale_per_block` is validated as positive at configuration time and
/// never reaches this function otherwise. Negative or NaN magnitudes
/// are data-quality errors: they quantize to zero blocks, logged, and
/// the record stays in the output.
pub fn quantize(value_billions: f64, scale_per_block: f64) -> Quantization {
    debug_assert!(
        scale_per_block > 0.0,
        "scale_per_block must be validated positive before quantization"
    );

    let value = if value_billions.is_nan() || value_billions < 0.0 {
        warn!(value = value_billions, "invalid magnitude, quantizing as 0");
        0.0
    } else {
        value_billions
    };

    let full_blocks = (value / scale_per_block).floor() as u64;
    let remainder = value % scale_per_block;
    let has_partial = remainder > 0.0;
    let partial_ratio = if has_partial {
        remainder / scale_per_block
    } else {
        1.0
    };

    Quantization {
        full_blocks,
        has_partial,
        partial_ratio,
    }
}
