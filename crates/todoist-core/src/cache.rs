//! Local caches: the disk-backed directory cache and the in-memory
//! task-name map. Both are plain constructed objects so tests can point
//! them at throwaway state.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default staleness threshold for the directory cache.
pub const DIRECTORY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolve the cache directory (~/.todoist-mcp/).
pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".todoist-mcp")
}

/// Expiring JSON file cache. A file is fresh while its mtime is younger
/// than the TTL; unreadable or unparseable files count as misses, never as
/// errors.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    pub fn new(dir: PathBuf, ttl: Duration) -> Self {
        DiskCache { dir, ttl }
    }

    pub fn read_if_fresh<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.dir.join(file);
        let modified = fs::metadata(&path).ok()?.modified().ok()?;
        let age = modified.elapsed().ok()?;
        if age >= self.ttl {
            tracing::debug!(file, age_secs = age.as_secs(), "cache file stale");
            return None;
        }
        let raw = fs::read_to_string(&path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    /// Overwrite the cache file. Atomic (temp file + rename) so a reader
    /// never observes a half-written payload.
    pub fn write<T: Serialize>(&self, file: &str, value: &T) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = self.dir.join(format!(".{file}.tmp"));
        let path = self.dir.join(file);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)
    }
}

impl Default for DiskCache {
    fn default() -> Self {
        DiskCache::new(default_cache_dir(), DIRECTORY_TTL)
    }
}

/// Last-known task titles, keyed by task id. Process lifetime, no TTL, no
/// eviction. Written by every query that yields canonical tasks and read
/// before a rename-audit comment is generated. The mutex makes overlapping
/// tool calls last-writer-wins rather than undefined.
#[derive(Debug, Default)]
pub struct TaskNameCache {
    names: Mutex<HashMap<i64, String>>,
}

impl TaskNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicked writer must not take the whole cache down; a poisoned map
    // still honors last-writer-wins.
    fn names(&self) -> std::sync::MutexGuard<'_, HashMap<i64, String>> {
        self.names.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set(&self, id: i64, name: impl Into<String>) {
        self.names().insert(id, name.into());
    }

    /// Cached title, if any. The fetch-through on miss lives on the service
    /// because it needs the backend client.
    pub fn get(&self, id: i64) -> Option<String> {
        self.names().get(&id).cloned()
    }

    /// Deterministic reset; part of the public contract for test isolation.
    pub fn clear(&self) {
        self.names().clear();
    }
}
