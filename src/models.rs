//! Data model for the wealth snapshot pipeline
//!
//! Mirrors the baseline document's JSON wire shape (camelCase fields),
//! so a fetched document round-trips without a translation layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::normalize::format_billions;

/// An RGB color, serialized in the CSS form the renderer consumes
/// (`rgb(r, g, b)`); `#rrggbb` is accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex_part) = text.strip_prefix('#') {
            if hex_part.len() != 6 {
                return None;
            }
            let r = u8::from_str_radix(&hex_part[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex_part[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex_part[4..6], 16).ok()?;
            return Some(Self { r, g, b });
        }
        let inner = text.strip_prefix("rgb(")?.strip_suffix(')')?;
        let mut channels = inner.split(',').map(|c| c.trim().parse::<u8>());
        let r = channels.next()?.ok()?;
        let g = channels.next()?.ok()?;
        let b = channels.next()?.ok()?;
        Some(Self { r, g, b })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Color::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized color: {text}")))
    }
}

/// Unit transform applied to a value extracted from a live endpoint.
/// Unknown wire strings fall back to `None` (raw passthrough), matching
/// the tolerance untrusted endpoint configs require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Transform {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "divide_by_1e9")]
    DivideBy1e9,
    #[serde(rename = "multiply_by_1000")]
    MultiplyBy1000,
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(match text.as_str() {
            "divide_by_1e9" => Transform::DivideBy1e9,
            "multiply_by_1000" => Transform::MultiplyBy1000,
            _ => Transform::None,
        })
    }
}

impl Transform {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Transform::None => value,
            Transform::DivideBy1e9 => value / 1e9,
            Transform::MultiplyBy1000 => value * 1000.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Transform::None => "none",
            Transform::DivideBy1e9 => "divide_by_1e9",
            Transform::MultiplyBy1000 => "multiply_by_1000",
        }
    }
}

/// Descriptor for a record's live-update endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub endpoint: String,
    #[serde(rename = "dataPath")]
    pub data_path: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(rename = "authRequired", default)]
    pub auth_required: bool,
}

/// One comparable monetary magnitude entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(rename = "categoryId")]
    pub category_id: String,
    /// Canonical magnitude in billions; the source of truth for all
    /// computation. Absent means "parse `valueFormatted` instead".
    #[serde(rename = "valueBillions", default)]
    pub value_billions: Option<f64>,
    /// Human-readable form. Always derivable from `valueBillions`;
    /// regenerated on every magnitude write, never edited on its own.
    #[serde(rename = "valueFormatted", default)]
    pub value_formatted: Option<String>,
    #[serde(rename = "isLiveUpdatable", default)]
    pub is_live_updatable: bool,
    #[serde(rename = "apiConfig", default, skip_serializing_if = "Option::is_none")]
    pub api_config: Option<ApiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Provenance blob (provider, url, notes). Passed through untouched.
    #[serde(rename = "dataSource", default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<Value>,
}

impl Record {
    /// Every magnitude write goes through here so `valueFormatted` and
    /// `lastUpdated` can never drift from the value itself.
    pub fn set_value(&mut self, value_billions: f64, updated_at: chrono::DateTime<chrono::Utc>) {
        self.value_billions = Some(value_billions);
        self.value_formatted = Some(format_billions(value_billions));
        self.last_updated = Some(updated_at.to_rfc3339());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    #[serde(rename = "dataVersion")]
    pub data_version: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(rename = "baseUnit", default = "default_base_unit")]
    pub base_unit: String,
    /// Billions per display block, as declared by the document.
    #[serde(rename = "blockRepresentation", default = "default_block_representation")]
    pub block_representation: f64,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_base_unit() -> String {
    "billions".to_string()
}

fn default_block_representation() -> f64 {
    100.0
}

/// The full reconciled data set at a point in time. `id` is unique
/// within `items`; a `categoryId` that resolves to nothing is tolerated
/// and rendered as "Unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub metadata: Metadata,
    pub categories: Vec<Category>,
    pub items: Vec<Record>,
}

impl Snapshot {
    pub fn category_by_id(&self, category_id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == category_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_round_trip() {
        let color = Color::new(255, 128, 0);
        assert_eq!(color.to_string(), "rgb(255, 128, 0)");
        assert_eq!(Color::parse("rgb(255, 128, 0)"), Some(color));
        assert_eq!(Color::parse("#ff8000"), Some(color));
        assert_eq!(Color::parse("not a color"), None);
    }

    #[test]
    fn test_transform_apply() {
        assert_eq!(Transform::None.apply(42.0), 42.0);
        assert_eq!(Transform::DivideBy1e9.apply(2.4e12), 2400.0);
        assert_eq!(Transform::MultiplyBy1000.apply(2.4), 2400.0);
    }

    #[test]
    fn test_record_wire_shape() {
        let json = r#"{
            "id": "crypto-market-cap",
            "slug": "cryptocurrency-total-market-cap",
            "name": "Cryptocurrency",
            "categoryId": "digital-assets",
            "valueBillions": 2400,
            "valueFormatted": "2.4 trillion",
            "isLiveUpdatable": true,
            "apiConfig": {
                "endpoint": "https://api.coingecko.com/api/v3/global",
                "dataPath": "data.total_market_cap.usd",
                "transform": "divide_by_1e9"
            }
        }"#;

        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.value_billions, Some(2400.0));
        assert!(record.is_live_updatable);
        let config = record.api_config.as_ref().unwrap();
        assert_eq!(config.transform, Transform::DivideBy1e9);
        assert!(!config.auth_required);
    }

    #[test]
    fn test_unknown_transform_falls_back_to_none() {
        let json = r#"{"endpoint": "https://x", "dataPath": "a.b", "transform": "sqrt"}"#;
        let config: ApiConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.transform, Transform::None);
    }

    #[test]
    fn test_set_value_regenerates_display_fields() {
        let mut record = Record {
            id: "x".into(),
            slug: "x-slug".into(),
            name: "X".into(),
            category_id: "cat".into(),
            value_billions: Some(100.0),
            value_formatted: Some("100 billion".into()),
            is_live_updatable: false,
            api_config: None,
            color: None,
            last_updated: None,
            data_source: None,
        };

        record.set_value(2400.0, chrono::Utc::now());
        assert_eq!(record.value_billions, Some(2400.0));
        assert_eq!(record.value_formatted.as_deref(), Some("2.4 trillion"));
        assert!(record.last_updated.is_some());
    }
}
