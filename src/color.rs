//! Deterministic slug coloring
//!
//! Every item and category gets a stable, vibrant color derived from a
//! SHA-256 digest of its slug: same slug, same color, within and across
//! runs. Color is cosmetic and never used as a key.

use sha2::{Digest, Sha256};

use crate::models::{Color, Snapshot};

const SATURATION_BOOST: f64 = 1.5;

/// Derive a stable color from a slug.
///
/// The 64-char hex digest is split into thirds; the leading byte of each
/// third seeds one channel, then saturation is boosted around the
/// channel minimum to keep adjacent slugs visually distinct.
pub fn colorize(slug: &str) -> Color {
    let digest = hex::encode(Sha256::digest(slug.as_bytes()));

    let third = digest.len() / 3;
    let r = channel_from_hex(&digest[..third]);
    let g = channel_from_hex(&digest[third..third * 2]);
    let b = channel_from_hex(&digest[third * 2..]);

    boost_saturation(r, g, b)
}

fn channel_from_hex(part: &str) -> u8 {
    u8::from_str_radix(&part[..2], 16).unwrap_or(0)
}

fn boost_saturation(r: u8, g: u8, b: u8) -> Color {
    let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
    let lo = r.min(g).min(b);
    let hi = r.max(g).max(b);

    if hi == 0.0 {
        return Color::new(0, 0, 0);
    }

    let boost = |c: f64| (lo + (c - lo) * SATURATION_BOOST).clamp(0.0, 255.0).round() as u8;
    Color::new(boost(r), boost(g), boost(b))
}

/// Pure enrichment pass: returns a copy of the snapshot with every
/// category (colored by id) and item (colored by slug) filled in.
/// Already-set colors are kept untouched: once assigned for a slug,
/// a color is immutable.
pub fn colorize_snapshot(snapshot: &Snapshot) -> Snapshot {
    let mut enriched = snapshot.clone();
    for category in &mut enriched.categories {
        if category.color.is_none() {
            category.color = Some(colorize(&category.id));
        }
    }
    for item in &mut enriched.items {
        if item.color.is_none() {
            item.color = Some(colorize(&item.slug));
        }
    }
    enriched
}
