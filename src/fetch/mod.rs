//! Best-effort live value updates
//!
//! Records flagged live-updatable carry an endpoint + path + transform
//! descriptor. Every refresh is isolated: a transport error, timeout or
//! error-shaped payload leaves that record's value untouched and never
//! aborts the batch. Fetches fan out concurrently and the snapshot is
//! only written at the join point.

pub mod path;

use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{ApiConfig, Record, Snapshot};

/// Markers some providers embed in an HTTP 200 body to signal an error
/// or rate limit (Alpha Vantage's "Note"/"Error Message", generic
/// "error" keys). Truthy values only; `"error": null` is not an error.
const ERROR_MARKERS: &[&str] = &["Error Message", "Note", "error"];

#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    pub id: String,
    pub value_billions: f64,
}

pub struct LiveUpdateFetcher {
    client: Client,
    timeout: Duration,
    concurrency: usize,
}

impl LiveUpdateFetcher {
    pub fn new(timeout: Duration, concurrency: usize) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("WealthBlocks/1.0 (Data Pipeline)")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            timeout,
            concurrency: concurrency.clamp(1, 32),
        }
    }

    /// Fetch a fresh magnitude for one record. `None` means "leave the
    /// record unchanged": transport errors, bad statuses, error-shaped
    /// payloads, missing paths and non-numeric leaves all land here.
    pub async fn refresh(&self, record: &Record) -> Option<f64> {
        if !record.is_live_updatable {
            return None;
        }
        let config = record.api_config.as_ref()?;

        if config.auth_required && config.endpoint.contains("API_KEY") {
            warn!(id = %record.id, "API key required but not configured, skipping live update");
            return None;
        }

        match self.fetch_value(config).await {
            Ok(value) => {
                debug!(
                    id = %record.id,
                    value,
                    transform = config.transform.as_str(),
                    "live value fetched"
                );
                Some(value)
            }
            Err(e) => {
                warn!(id = %record.id, error = %e, "live update failed, keeping current value");
                None
            }
        }
    }

    async fn fetch_value(&self, config: &ApiConfig) -> Result<f64> {
        let response = self
            .client
            .get(&config.endpoint)
            .timeout(self.timeout)
            .send()
            .await
            .context("request failed")?
            .error_for_status()
            .context("bad status")?;

        let body: Value = response.json().await.context("body is not JSON")?;

        if let Some(marker) = error_marker(&body) {
            bail!("provider error payload ({marker})");
        }

        let leaf = path::navigate(&body, &config.data_path)
            .filter(|v| !v.is_null())
            .with_context(|| format!("no data at path {}", config.data_path))?;

        let raw = leaf_number(leaf)
            .with_context(|| format!("non-numeric value at path {}", config.data_path))?;

        Ok(config.transform.apply(raw).round())
    }

    /// Fan out refreshes for every eligible record. Each refresh carries
    /// its own timeout; a hung endpoint costs nothing but its own slot,
    /// and results arrive in no particular order.
    pub async fn refresh_all(&self, snapshot: &Snapshot) -> Vec<LiveUpdate> {
        let eligible: Vec<&Record> = snapshot
            .items
            .iter()
            .filter(|r| r.is_live_updatable && r.api_config.is_some())
            .collect();

        if eligible.is_empty() {
            return Vec::new();
        }
        debug!(count = eligible.len(), "fanning out live updates");

        let results: Vec<Option<LiveUpdate>> = stream::iter(eligible)
            .map(|record| async move {
                match tokio::time::timeout(self.timeout, self.refresh(record)).await {
                    Ok(Some(value_billions)) => Some(LiveUpdate {
                        id: record.id.clone(),
                        value_billions,
                    }),
                    Ok(None) => None,
                    Err(_) => {
                        warn!(id = %record.id, "live update timed out");
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }
}

/// Join point: write fetched values back onto the snapshot. Only each
/// record's own fields are touched; the display string and timestamp are
/// regenerated with the value so they can never go stale against it.
pub fn apply_updates(snapshot: &mut Snapshot, updates: &[LiveUpdate]) -> usize {
    let mut applied = 0;
    for update in updates {
        let Some(record) = snapshot.items.iter_mut().find(|r| r.id == update.id) else {
            continue;
        };
        if record.value_billions == Some(update.value_billions) {
            continue; // unchanged, keep the existing timestamp
        }
        info!(
            id = %record.id,
            from = ?record.value_billions,
            to = update.value_billions,
            "live value applied"
        );
        record.set_value(update.value_billions, Utc::now());
        applied += 1;
    }
    applied
}

fn error_marker(body: &Value) -> Option<&'static str> {
    let map = body.as_object()?;
    ERROR_MARKERS
        .iter()
        .copied()
        .find(|marker| map.get(*marker).is_some_and(|v| !is_falsy(v)))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

fn leaf_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        // Some providers return market caps as decimal strings.
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Metadata, Transform};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn live_record(id: &str, endpoint: &str, data_path: &str, transform: Transform) -> Record {
        Record {
            id: id.into(),
            slug: format!("{id}-slug"),
            name: id.to_uppercase(),
            category_id: "cat".into(),
            value_billions: Some(100.0),
            value_formatted: Some("100 billion".into()),
            is_live_updatable: true,
            api_config: Some(ApiConfig {
                endpoint: endpoint.into(),
                data_path: data_path.into(),
                transform,
                auth_required: false,
            }),
            color: None,
            last_updated: None,
            data_source: None,
        }
    }

    fn snapshot_of(items: Vec<Record>) -> Snapshot {
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
            items,
        }
    }

    /// Serve one canned HTTP/1.1 response on an ephemeral port.
    async fn serve_once(body: String) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    /// An address that refuses connections: bind, record, drop.
    async fn dead_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        format!("http://{addr}")
    }

    #[test]
    fn test_error_marker_detection() {
        assert_eq!(
            error_marker(&json!({"Note": "rate limited"})),
            Some("Note")
        );
        assert_eq!(
            error_marker(&json!({"Error Message": "bad symbol"})),
            Some("Error Message")
        );
        assert_eq!(error_marker(&json!({"error": "boom"})), Some("error"));
        // Falsy markers are not errors.
        assert_eq!(error_marker(&json!({"error": null, "data": 1})), None);
        assert_eq!(error_marker(&json!({"error": false})), None);
        assert_eq!(error_marker(&json!({"data": 1})), None);
    }

    #[test]
    fn test_leaf_number_accepts_decimal_strings() {
        assert_eq!(leaf_number(&json!("3500000000000")), Some(3.5e12));
        assert_eq!(leaf_number(&json!(42.5)), Some(42.5));
        assert_eq!(leaf_number(&json!({"nested": true})), None);
    }

    #[test]
    fn test_apply_updates_touches_only_named_records() {
        let mut snapshot = snapshot_of(vec![
            live_record("a", "http://unused", "x", Transform::None),
            live_record("b", "http://unused", "x", Transform::None),
        ]);

        let applied = apply_updates(
            &mut snapshot,
            &[
                LiveUpdate {
                    id: "a".into(),
                    value_billions: 2400.0,
                },
                LiveUpdate {
                    id: "missing".into(),
                    value_billions: 1.0,
                },
            ],
        );

        assert_eq!(applied, 1);
        assert_eq!(snapshot.items[0].value_billions, Some(2400.0));
        assert_eq!(
            snapshot.items[0].value_formatted.as_deref(),
            Some("2.4 trillion")
        );
        assert!(snapshot.items[0].last_updated.is_some());
        // Sibling untouched.
        assert_eq!(snapshot.items[1].value_billions, Some(100.0));
        assert!(snapshot.items[1].last_updated.is_none());
    }

    #[test]
    fn test_apply_updates_skips_unchanged_values() {
        let mut snapshot = snapshot_of(vec![live_record("a", "http://unused", "x", Transform::None)]);
        let applied = apply_updates(
            &mut snapshot,
            &[LiveUpdate {
                id: "a".into(),
                value_billions: 100.0,
            }],
        );
        assert_eq!(applied, 0);
        assert!(snapshot.items[0].last_updated.is_none());
    }

    #[tokio::test]
    async fn test_refresh_extracts_transforms_and_rounds() {
        let endpoint = serve_once(
            json!({"data": {"total_market_cap": {"usd": 2_437_000_000_000.0_f64}}}).to_string(),
        )
        .await;
        let record = live_record(
            "crypto",
            &endpoint,
            "data.total_market_cap.usd",
            Transform::DivideBy1e9,
        );

        let fetcher = LiveUpdateFetcher::new(Duration::from_secs(5), 4);
        assert_eq!(fetcher.refresh(&record).await, Some(2437.0));
    }

    #[tokio::test]
    async fn test_refresh_rejects_error_payload() {
        let endpoint = serve_once(json!({"Note": "API call volume exceeded"}).to_string()).await;
        let record = live_record("stock", &endpoint, "MarketCapitalization", Transform::None);

        let fetcher = LiveUpdateFetcher::new(Duration::from_secs(5), 4);
        assert_eq!(fetcher.refresh(&record).await, None);
    }

    #[tokio::test]
    async fn test_refresh_missing_path_is_absent() {
        let endpoint = serve_once(json!({"data": {}}).to_string()).await;
        let record = live_record(
            "crypto",
            &endpoint,
            "data.total_market_cap.usd",
            Transform::None,
        );

        let fetcher = LiveUpdateFetcher::new(Duration::from_secs(5), 4);
        assert_eq!(fetcher.refresh(&record).await, None);
    }

    #[tokio::test]
    async fn test_refresh_skips_unconfigured_api_key() {
        let mut record = live_record(
            "stock",
            "https://example.test/query?apikey=API_KEY",
            "MarketCapitalization",
            Transform::None,
        );
        if let Some(config) = record.api_config.as_mut() {
            config.auth_required = true;
        }

        let fetcher = LiveUpdateFetcher::new(Duration::from_secs(5), 4);
        assert_eq!(fetcher.refresh(&record).await, None);
    }

    #[tokio::test]
    async fn test_failing_fetch_never_blocks_siblings() {
        let good_endpoint =
            serve_once(json!({"marketCap": 1_250_000_000_000.0_f64}).to_string()).await;
        let bad_endpoint = dead_endpoint().await;

        let snapshot = snapshot_of(vec![
            live_record("broken", &bad_endpoint, "marketCap", Transform::None),
            live_record(
                "working",
                &good_endpoint,
                "marketCap",
                Transform::DivideBy1e9,
            ),
        ]);

        let fetcher = LiveUpdateFetcher::new(Duration::from_secs(5), 4);
        let updates = fetcher.refresh_all(&snapshot).await;

        assert_eq!(
            updates,
            vec![LiveUpdate {
                id: "working".into(),
                value_billions: 1250.0,
            }]
        );
    }
}
