//! Safe navigation into untrusted JSON
//!
//! Endpoint response shapes are configuration, not code, so value
//! extraction walks a dot/bracket path over a generic JSON value and
//! returns `None` on the first missing segment instead of erroring.

use serde_json::Value;

/// Navigate a `data.total_market_cap.usd` or `metric[marketCapitalization]`
/// style path. Bare numeric segments index into arrays.
pub fn navigate<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in split_path(path) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(['.', '[', ']']).filter(|s| !s.is_empty())
}
