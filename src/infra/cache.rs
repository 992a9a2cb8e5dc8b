//! Persistent on-disk caching for the rate table with TTL + tariff-version
//! tracking. Tariffs move slowly; a version change invalidates early.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::domain::RateTable;

const CACHE_FILENAME: &str = "rate_table_cache.json";

/// Cache TTL: 24 hours. Tariff revisions land far less often than that.
pub const RATE_TABLE_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTableCache {
    /// Tariff version the upstream reported when this cache was created.
    pub tariff_version: String,
    /// Unix timestamp (seconds) when this cache was created.
    pub cached_at: u64,
    pub table: RateTable,
}

impl RateTableCache {
    /// Create a new cache with current timestamp.
    pub fn new(tariff_version: String, table: RateTable) -> Self {
        let cached_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self { tariff_version, cached_at, table }
    }

    /// Check if the cache has expired (older than TTL).
    pub fn is_expired(&self) -> bool {
        self.age() > RATE_TABLE_CACHE_TTL
    }

    pub fn age(&self) -> Duration {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Duration::from_secs(now.saturating_sub(self.cached_at))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let secs = self.age().as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }
}

fn cache_path() -> PathBuf {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let base = ProjectDirs::from("com", "ShipBook", "ShipBook")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let _ = fs::create_dir_all(&base);
        base.join(CACHE_FILENAME)
    })
    .clone()
}

/// Load the rate-table cache from disk, if present and not expired.
pub fn load_rate_table_cache() -> Option<RateTableCache> {
    load_from(&cache_path())
}

/// Save the rate-table cache to disk.
pub fn save_rate_table_cache(cache: &RateTableCache) -> Result<(), std::io::Error> {
    save_to(&cache_path(), cache)
}

fn load_from(path: &Path) -> Option<RateTableCache> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no rate-table cache on disk");
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<RateTableCache>(&content) {
            Ok(cache) => {
                if cache.is_expired() {
                    tracing::debug!(age = %cache.age_string(), "rate-table cache expired");
                    return None;
                }
                tracing::debug!(
                    version = %cache.tariff_version,
                    age = %cache.age_string(),
                    "loaded rate-table cache"
                );
                Some(cache)
            }
            Err(e) => {
                tracing::warn!("failed to parse rate-table cache: {e}");
                None
            }
        },
        Err(e) => {
            tracing::warn!("failed to read rate-table cache: {e}");
            None
        }
    }
}

fn save_to(path: &Path, cache: &RateTableCache) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string(cache)?;
    fs::write(path, content)?;
    tracing::debug!(
        version = %cache.tariff_version,
        path = %path.display(),
        "saved rate-table cache"
    );
    Ok(())
}
