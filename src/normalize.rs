//! Magnitude normalization and formatting
//!
//! Canonicalizes heterogeneous records into billions-of-dollars floats,
//! and regenerates the human-readable forms derived from them.

use tracing::warn;

use crate::models::Record;

/// Canonical magnitude in billions for a record.
///
/// A numeric `valueBillions` short-circuits; this is the common path.
/// Otherwise the formatted text is parsed ("2.4 trillion" -> 2400.0).
/// Unparseable text yields NaN: callers sort and aggregate it as zero
/// but keep the record visible.
pub fn normalized_value(record: &Record) -> f64 {
    if let Some(value) = record.value_billions {
        return value;
    }
    parse_formatted(record.value_formatted.as_deref().unwrap_or("0"))
}

/// Parse a free-text magnitude like "2.4 trillion" into billions.
pub fn parse_formatted(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let cleaned: String = lower
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let number: f64 = match cleaned.parse() {
        Ok(n) => n,
        Err(_) => return f64::NAN,
    };

    if lower.contains("trillion") {
        number * 1000.0
    } else {
        number
    }
}

/// Sorting/aggregation value for a record: NaN counts as zero, with a
/// data-quality warning so the bad record stays visible in diagnostics.
pub fn sort_value(record: &Record) -> f64 {
    let value = normalized_value(record);
    if value.is_nan() {
        warn!(id = %record.id, "unparseable magnitude, treating as 0 for sorting/aggregation");
        0.0
    } else {
        value
    }
}

/// Regenerate the display form of a magnitude ("2.4 trillion",
/// "240 billion"). Round-trips through [`parse_formatted`].
pub fn format_billions(billions: f64) -> String {
    if billions.abs() >= 1000.0 {
        format!("{} trillion", billions / 1000.0)
    } else {
        format!("{} billion", billions)
    }
}

/// Compact aggregate form for statistics readouts: "$240B", "$2.4T",
/// "$1.5Q".
pub fn format_compact(billions: f64) -> String {
    if billions >= 1_000_000.0 {
        format!("${:.1}Q", billions / 1_000_000.0)
    } else if billions >= 1000.0 {
        format!("${:.1}T", billions / 1000.0)
    } else {
        format!("${:.0}B", billions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_record(formatted: &str) -> Record {
        Record {
            id: "t".into(),
            slug: "t-slug".into(),
            name: "T".into(),
            category_id: "cat".into(),
            value_billions: None,
            value_formatted: Some(formatted.into()),
            is_live_updatable: false,
            api_config: None,
            color: None,
            last_updated: None,
            data_source: None,
        }
    }

    #[test]
    fn test_numeric_field_short_circuits() {
        let mut record = text_record("definitely not 77");
        record.value_billions = Some(77.0);
        assert_eq!(normalized_value(&record), 77.0);
    }

    #[test]
    fn test_trillion_text_scales_by_1000() {
        assert_eq!(normalized_value(&text_record("2.4 trillion")), 2400.0);
        assert_eq!(normalized_value(&text_record("$27 Trillion")), 27000.0);
    }

    #[test]
    fn test_billion_text_passes_through() {
        assert_eq!(normalized_value(&text_record("240 billion")), 240.0);
        assert_eq!(normalized_value(&text_record("$240 billion USD")), 240.0);
    }

    #[test]
    fn test_unparseable_text_is_nan() {
        assert!(normalized_value(&text_record("unknown")).is_nan());
        assert!(parse_formatted("").is_nan());
    }

    #[test]
    fn test_sort_value_maps_nan_to_zero() {
        assert_eq!(sort_value(&text_record("unknown")), 0.0);
        assert_eq!(sort_value(&text_record("150 billion")), 150.0);
    }

    #[test]
    fn test_format_billions_round_trips() {
        for value in [240.0, 2400.0, 27000.0, 0.5, 999.0, 1000.0] {
            let formatted = format_billions(value);
            assert_eq!(parse_formatted(&formatted), value, "via {:?}", formatted);
        }
        assert_eq!(format_billions(2400.0), "2.4 trillion");
        assert_eq!(format_billions(240.0), "240 billion");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(240.0), "$240B");
        assert_eq!(format_compact(2400.0), "$2.4T");
        assert_eq!(format_compact(1_500_000.0), "$1.5Q");
    }
}
