//! Snapshot cache persistence
//!
//! A single-key snapshot cache backed by SQLite. Freshness is enforced
//! at the read site: stale or corrupt entries are evicted during `get`
//! and reported as absent, so a refresh cycle never has to distinguish
//! "missing" from "unusable".

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::Snapshot;

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS snapshot_cache (
    cache_key TEXT PRIMARY KEY,
    cache_json TEXT NOT NULL,
    fetched_at INTEGER NOT NULL
) WITHOUT ROWID;
"#;

const CACHE_KEY: &str = "wealth-data-cache";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: Snapshot,
    /// Epoch millis at capture time.
    timestamp: i64,
    version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Absent,
    Fresh { age_minutes: i64 },
    Stale { age_minutes: i64 },
}

pub struct CacheStore {
    conn: Arc<Mutex<Connection>>,
    max_age_ms: i64,
}

impl CacheStore {
    pub fn new(db_path: &str, max_age_hours: u64) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // We handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open cache database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize cache schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            max_age_ms: max_age_hours as i64 * 3600 * 1000,
        })
    }

    /// Persist the authoritative snapshot, replacing any previous entry.
    pub fn put(&self, snapshot: &Snapshot) -> Result<()> {
        // Pre-serialize outside the lock
        let entry = CacheEntry {
            data: snapshot.clone(),
            timestamp: Utc::now().timestamp_millis(),
            version: snapshot.metadata.data_version.clone(),
        };
        let json = serde_json::to_string(&entry).context("Failed to serialize cache entry")?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO snapshot_cache (cache_key, cache_json, fetched_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(cache_key) DO UPDATE SET cache_json=excluded.cache_json, fetched_at=excluded.fetched_at",
            params![CACHE_KEY, &json, entry.timestamp],
        )?;

        debug!(version = %entry.version, "snapshot cached");
        Ok(())
    }

    /// Read the cached snapshot if present and fresh. Stale and corrupt
    /// entries are evicted here, so subsequent reads see a plain miss
    /// without re-checking age.
    pub fn get(&self) -> Option<Snapshot> {
        let (json, fetched_at) = self.read_raw()?;

        let age_ms = Utc::now().timestamp_millis() - fetched_at;
        if age_ms > self.max_age_ms {
            info!(age_minutes = age_ms / 60_000, "cached snapshot too old, evicting");
            self.evict();
            return None;
        }

        match serde_json::from_str::<CacheEntry>(&json) {
            Ok(entry) => {
                debug!(
                    version = %entry.version,
                    age_minutes = age_ms / 60_000,
                    "loaded cached snapshot"
                );
                Some(entry.data)
            }
            Err(e) => {
                warn!(error = %e, "corrupt cache entry, evicting");
                self.evict();
                None
            }
        }
    }

    /// Drop the cached snapshot on demand (force refresh).
    pub fn clear(&self) {
        self.evict();
    }

    /// Age readout for diagnostics; does not evict.
    pub fn status(&self) -> CacheStatus {
        match self.read_raw() {
            None => CacheStatus::Absent,
            Some((_, fetched_at)) => {
                let age_ms = Utc::now().timestamp_millis() - fetched_at;
                let age_minutes = age_ms / 60_000;
                if age_ms > self.max_age_ms {
                    CacheStatus::Stale { age_minutes }
                } else {
                    CacheStatus::Fresh { age_minutes }
                }
            }
        }
    }

    fn read_raw(&self) -> Option<(String, i64)> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT cache_json, fetched_at FROM snapshot_cache WHERE cache_key = ?1",
            [CACHE_KEY],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .ok()
    }

    fn evict(&self) {
        let conn = self.conn.lock();
        if let Err(e) = conn.execute(
            "DELETE FROM snapshot_cache WHERE cache_key = ?1",
            [CACHE_KEY],
        ) {
            warn!(error = %e, "failed to evict cache entry");
        }
    }

    #[cfg(test)]
    fn backdate(&self, fetched_at: i64) {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE snapshot_cache SET fetched_at = ?1 WHERE cache_key = ?2",
            params![fetched_at, CACHE_KEY],
        )
        .expect("backdate cache entry");
    }
}
