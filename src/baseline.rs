//! Baseline document loading
//!
//! The baseline is the source-of-truth JSON document, fetched over HTTP
//! (cache-busted so intermediaries never serve yesterday's figures) or
//! read from a local path. A minimal embedded dataset covers the
//! total-failure case where neither cache nor baseline is usable.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::models::{Category, Metadata, Record, Snapshot};
use crate::reconcile::validate_baseline;

/// Load and validate the baseline document from a URL or file path.
pub async fn load(client: &reqwest::Client, source: &str) -> Result<Snapshot> {
    let snapshot = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(client, source).await?
    } else {
        read_local(source).await?
    };
    validate_baseline(&snapshot)?;
    Ok(snapshot)
}

/// A new data version or publication timestamp means the baseline moved
/// under us since the cached snapshot was captured.
pub fn version_changed(cached: &Metadata, baseline: &Metadata) -> bool {
    cached.data_version != baseline.data_version || cached.last_updated != baseline.last_updated
}

async fn fetch_remote(client: &reqwest::Client, url: &str) -> Result<Snapshot> {
    let response = client
        .get(url)
        .query(&[("t", Utc::now().timestamp_millis().to_string())])
        .send()
        .await
        .context("baseline request failed")?
        .error_for_status()
        .context("baseline status")?;

    response.json().await.context("baseline JSON parse failed")
}

async fn read_local(path: &str) -> Result<Snapshot> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read baseline at {}", path))?;
    serde_json::from_str(&text).context("baseline JSON parse failed")
}

/// Embedded last-resort dataset. Values are a coarse point-in-time
/// sample; the `-fallback` version suffix makes its provenance visible
/// in every readout.
pub fn fallback_snapshot() -> Snapshot {
    let categories = [
        ("individual-wealth", "Individual Wealth"),
        ("digital-assets", "Digital Assets"),
        ("national-economy", "National Economy"),
        ("stock-markets", "Stock Markets"),
        ("debt", "Debt"),
        ("real-assets", "Real Assets"),
        ("private-wealth", "Private Wealth"),
        ("financial-instruments", "Financial Instruments"),
    ]
    .into_iter()
    .map(|(id, name)| Category {
        id: id.to_string(),
        name: name.to_string(),
        color: None,
    })
    .collect();

    let items = vec![
        fallback_item(
            "elon-musk",
            "elon-musk-net-worth",
            "Elon Musk",
            "individual-wealth",
            240.0,
            false,
        ),
        fallback_item(
            "crypto-market-cap",
            "cryptocurrency-total-market-cap",
            "Cryptocurrency",
            "digital-assets",
            2400.0,
            true,
        ),
        fallback_item(
            "us-gdp",
            "united-states-gross-domestic-product",
            "U.S. GDP",
            "national-economy",
            27000.0,
            true,
        ),
        fallback_item(
            "global-equities",
            "global-equities-total-market-cap",
            "Global Equities",
            "stock-markets",
            110_000.0,
            false,
        ),
        fallback_item(
            "global-debt",
            "global-debt-total",
            "Global Debt",
            "debt",
            315_000.0,
            false,
        ),
        fallback_item(
            "global-real-estate",
            "global-real-estate-total-value",
            "Global Real Estate",
            "real-assets",
            380_000.0,
            false,
        ),
        fallback_item(
            "global-private-wealth",
            "global-private-wealth-total",
            "Global Private Wealth",
            "private-wealth",
            550_000.0,
            false,
        ),
        fallback_item(
            "derivatives-notional-value",
            "derivatives-total-notional-value",
            "Derivatives (Notional)",
            "financial-instruments",
            715_000.0,
            false,
        ),
    ];

    Snapshot {
        metadata: Metadata {
            last_updated: "2025-07-04T00:00:00Z".to_string(),
            data_version: "1.0-fallback".to_string(),
            currency: "USD".to_string(),
            base_unit: "billions".to_string(),
            block_representation: 100.0,
        },
        categories,
        items,
    }
}

fn fallback_item(
    id: &str,
    slug: &str,
    name: &str,
    category_id: &str,
    value_billions: f64,
    is_live_updatable: bool,
) -> Record {
    Record {
        id: id.to_string(),
        slug: slug.to_string(),
        name: name.to_string(),
        category_id: category_id.to_string(),
        value_billions: Some(value_billions),
        value_formatted: Some(crate::normalize::format_billions(value_billions)),
        is_live_updatable,
        api_config: None,
        color: None,
        last_updated: None,
        data_source: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_snapshot_is_valid() {
        let snapshot = fallback_snapshot();
        assert!(validate_baseline(&snapshot).is_ok());
        assert_eq!(snapshot.items.len(), 8);
        assert!(snapshot.metadata.data_version.ends_with("-fallback"));

        // Every categoryId resolves within the fallback set.
        for item in &snapshot.items {
            assert!(
                snapshot.category_by_id(&item.category_id).is_some(),
                "dangling category for {}",
                item.id
            );
        }
    }

    #[test]
    fn test_fallback_display_strings_are_derivable() {
        for item in fallback_snapshot().items {
            let value = item.value_billions.expect("fallback values are numeric");
            assert_eq!(
                item.value_formatted.as_deref(),
                Some(crate::normalize::format_billions(value).as_str())
            );
        }
    }

    #[test]
    fn test_version_changed() {
        let a = fallback_snapshot().metadata;
        let mut b = a.clone();
        assert!(!version_changed(&a, &b));

        b.data_version = "2.0".into();
        assert!(version_changed(&a, &b));

        let mut c = a.clone();
        c.last_updated = "2025-08-01T00:00:00Z".into();
        assert!(version_changed(&a, &c));
    }

    #[tokio::test]
    async fn test_read_local_missing_file_errors() {
        let client = reqwest::Client::new();
        let result = load(&client, "/definitely/not/here/data.json").await;
        assert!(result.is_err());
    }
}
