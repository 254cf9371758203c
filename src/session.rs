//! Refresh session
//!
//! One refresh cycle, owned by an explicit session object: cached
//! snapshot in, baseline in, one authoritative snapshot out. Nothing is
//! ambient: everything the cycle touches arrives through the session,
//! and prior snapshots are discarded, not versioned.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::baseline;
use crate::cache::CacheStore;
use crate::color::colorize_snapshot;
use crate::config::Config;
use crate::fetch::{apply_updates, LiveUpdateFetcher};
use crate::models::Snapshot;
use crate::reconcile::reconcile;

/// Where the authoritative snapshot ultimately came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// Baseline reconciled with whatever cache was available.
    Baseline,
    /// Baseline unreachable; cycle degraded onto the cached snapshot.
    CacheOnly,
    /// Neither baseline nor cache usable; embedded dataset.
    Fallback,
}

#[derive(Debug)]
pub struct RefreshOutcome {
    pub snapshot: Snapshot,
    pub origin: SnapshotOrigin,
    pub live_updates_applied: usize,
    /// The baseline's data version or publication timestamp moved since
    /// the cached snapshot was captured.
    pub version_changed: bool,
}

pub struct RefreshSession {
    config: Config,
    cache: CacheStore,
    fetcher: LiveUpdateFetcher,
    http: reqwest::Client,
}

impl RefreshSession {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let cache = CacheStore::new(&config.cache_db_path, config.cache_max_age_hours)?;
        let fetcher = LiveUpdateFetcher::new(config.fetch_timeout, config.fetch_concurrency);
        let http = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            cache,
            fetcher,
            http,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Run one full refresh cycle and return the authoritative snapshot.
    ///
    /// Order is fixed: cache read, baseline load, reconcile, colorize,
    /// live-update fan-out, apply at the join point, persist. Errors
    /// follow the taxonomy: only "no baseline, no cache, no fallback"
    /// is fatal; everything else degrades with a logged warning.
    pub async fn run(&self) -> Result<RefreshOutcome> {
        let cached = self.cache.get();

        let (reconciled, origin, version_changed) =
            match baseline::load(&self.http, &self.config.baseline_source).await {
                Ok(baseline_snapshot) => {
                    let version_changed = cached
                        .as_ref()
                        .map(|c| baseline::version_changed(&c.metadata, &baseline_snapshot.metadata))
                        .unwrap_or(false);
                    (
                        reconcile(cached.as_ref(), &baseline_snapshot),
                        SnapshotOrigin::Baseline,
                        version_changed,
                    )
                }
                Err(e) => match cached {
                    Some(cached_snapshot) => {
                        warn!(error = %e, "baseline unavailable, continuing on cached snapshot");
                        (cached_snapshot, SnapshotOrigin::CacheOnly, false)
                    }
                    None if self.config.allow_fallback_dataset => {
                        warn!(error = %e, "baseline unavailable and no cache, using embedded fallback dataset");
                        (baseline::fallback_snapshot(), SnapshotOrigin::Fallback, false)
                    }
                    None => {
                        return Err(e.context("baseline unusable and no cached snapshot available"));
                    }
                },
            };

        // Pure enrichment step: colors are derived onto a new copy,
        // never merged in place during reconciliation.
        let mut snapshot = colorize_snapshot(&reconciled);

        let updates = self.fetcher.refresh_all(&snapshot).await;
        let live_updates_applied = apply_updates(&mut snapshot, &updates);
        if live_updates_applied > 0 {
            info!(count = live_updates_applied, "live updates applied");
        }

        // A failed persist degrades the next cycle, not this one.
        if let Err(e) = self.cache.put(&snapshot) {
            warn!(error = %e, "failed to persist snapshot cache");
        }

        if version_changed {
            info!(
                version = %snapshot.metadata.data_version,
                "baseline data version changed since last capture"
            );
        }

        Ok(RefreshOutcome {
            snapshot,
            origin,
            live_updates_applied,
            version_changed,
        })
    }

    /// Manual force refresh: drop the cache first, then run a cycle.
    pub async fn force_refresh(&self) -> Result<RefreshOutcome> {
        self.cache.clear();
        self.run().await
    }
}
