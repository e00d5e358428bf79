use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Logical identity of a cached query, e.g. `["/auth/me"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: CachedData<Value>,
    stale: bool,
}

/// Shared cache for server-derived state.
///
/// One instance is created by the shell and handed out as `Arc<QueryCache>`.
/// Values are stored as JSON so queries of different types share one map.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, Entry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Read a cached value regardless of staleness.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<CachedData<T>>> {
        let entries = self.read();
        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };

        let data = serde_json::from_value(entry.value.data.clone())
            .with_context(|| format!("Failed to decode cached query: {}", key))?;

        Ok(Some(CachedData {
            data,
            cached_at: entry.value.cached_at,
        }))
    }

    /// Read a cached value only if it is present and fresh.
    pub fn get_fresh<T: DeserializeOwned>(&self, key: &QueryKey) -> Result<Option<CachedData<T>>> {
        if self.is_stale(key) {
            return Ok(None);
        }
        self.get(key)
    }

    /// Store a value, replacing any previous entry and clearing its stale mark.
    pub fn set<T: Serialize>(&self, key: QueryKey, data: &T) -> Result<()> {
        let value = serde_json::to_value(data)
            .with_context(|| format!("Failed to encode query for cache: {}", key))?;
        debug!(key = %key, "Caching query");
        self.write().insert(
            key,
            Entry {
                value: CachedData::new(value),
                stale: false,
            },
        );
        Ok(())
    }

    /// Mark an entry stale so its owner refetches on next access.
    /// Returns whether an entry existed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let mut entries = self.write();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                debug!(key = %key, "Invalidated query");
                true
            }
            None => false,
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.write();
        debug!(count = entries.len(), "Clearing query cache");
        entries.clear();
    }

    /// Missing entries count as stale.
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.read()
            .get(key)
            .map(|e| e.stale)
            .unwrap_or(true)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Keys with their staleness and age, sorted by key.
    pub fn summary(&self) -> Vec<(QueryKey, bool, String)> {
        let entries = self.read();
        let mut rows: Vec<_> = entries
            .iter()
            .map(|(k, e)| (k.clone(), e.stale, e.value.age_display()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

// ============================================================================
// Tests
// ============================================================================
