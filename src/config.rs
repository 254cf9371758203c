//! Runtime configuration
//!
//! Loaded once from the environment at startup. Validation happens here
//! so downstream stages (the block quantizer in particular) can assume a
//! sane positive scale.

use anyhow::{bail, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Baseline document location: an http(s) URL or a local file path.
    pub baseline_source: String,
    pub cache_db_path: String,
    /// Billions of dollars represented by one display block.
    pub scale_per_block: f64,
    pub cache_max_age_hours: u64,
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    /// Allow the embedded last-resort dataset when both baseline and
    /// cache are unusable. Off by default: total failure is surfaced.
    pub allow_fallback_dataset: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let baseline_source =
            std::env::var("BASELINE_URL").unwrap_or_else(|_| "./data.json".to_string());

        let cache_db_path =
            std::env::var("CACHE_DB_PATH").unwrap_or_else(|_| "./wealthblocks.db".to_string());

        let scale_per_block = std::env::var("SCALE_PER_BLOCK")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(100.0);

        let cache_max_age_hours = std::env::var("CACHE_MAX_AGE_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(24);

        let fetch_timeout_secs = std::env::var("FETCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(8);

        let fetch_concurrency = std::env::var("FETCH_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, 32);

        let allow_fallback_dataset = std::env::var("ALLOW_FALLBACK_DATASET")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "on" | "ON"))
            .unwrap_or(false);

        let config = Self {
            baseline_source,
            cache_db_path,
            scale_per_block,
            cache_max_age_hours,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            fetch_concurrency,
            allow_fallback_dataset,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that must never reach the pipeline: a
    /// non-positive block scale, a zero freshness window, a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if !self.scale_per_block.is_finite() || self.scale_per_block <= 0.0 {
            bail!(
                "SCALE_PER_BLOCK must be a positive number of billions, got {}",
                self.scale_per_block
            );
        }
        if self.cache_max_age_hours == 0 {
            bail!("CACHE_MAX_AGE_HOURS must be at least 1");
        }
        if self.fetch_timeout.is_zero() {
            bail!("FETCH_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }
}
