use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use indicatif::{HumanBytes, HumanCount};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use zstd::stream::{Encoder, decode_all};

/// One persisted cache record for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub mtime: u64,
    pub size: u64,
    pub digest: String,
}

/// A thread-safe persistent store of file digests, keyed by absolute path.
///
/// Each entry records the file's modification time and size alongside its
/// digest; a lookup only hits when both still match, so a stale entry is
/// simply recomputed. The cache is purely advisory: any load error, parse
/// error, or mismatch degrades to a miss and never to a scan failure.
///
/// On disk the cache is a Zstandard-compressed JSON map. Saving writes to a
/// temporary file and renames it over the old one, so an interrupted save
/// leaves the previous cache intact.
pub struct HashCache {
    cache_file: PathBuf,
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HashCache {
    /// Default cache location: `clonescout-cache.json.zst` in the current
    /// working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from(format!("{}-cache.json.zst", env!("CARGO_PKG_NAME")))
    }

    /// Load the cache from `cache_file`, falling back to an empty cache if
    /// the file is missing, unreadable, or malformed.
    pub fn load(cache_file: PathBuf) -> Self {
        let mut entries = HashMap::new();

        match fs::read(&cache_file) {
            Ok(compressed) => {
                info!(
                    "Loading hash cache from '{}' ({})",
                    cache_file.display(),
                    HumanBytes(compressed.len() as u64)
                );
                match decode_all(&compressed[..])
                    .map_err(anyhow::Error::from)
                    .and_then(|bytes| {
                        serde_json::from_slice::<HashMap<String, CacheEntry>>(&bytes)
                            .map_err(anyhow::Error::from)
                    }) {
                    Ok(parsed) => {
                        info!("Hash cache has {} entries", HumanCount(parsed.len() as u64));
                        entries = parsed;
                    }
                    Err(err) => {
                        warn!("Ignoring unreadable hash cache: {err}");
                    }
                }
            }
            Err(_) => {
                info!("No hash cache file found, starting fresh");
            }
        }

        Self {
            cache_file,
            entries: Mutex::new(entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Create an empty cache that will be saved to `cache_file`.
    pub fn empty(cache_file: PathBuf) -> Self {
        Self {
            cache_file,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// Return the cached digest for `file_path` if the stored modification
    /// time and size both match the current values. Anything else is a miss.
    pub fn lookup(&self, file_path: &Path, mtime: u64, size: u64) -> Option<String> {
        let key = Self::key_for(file_path);
        if let Ok(entries) = self.entries.lock()
            && let Some(entry) = entries.get(&key)
            && entry.mtime == mtime
            && entry.size == size
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.digest.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or replace the entry for `file_path`. A single map insert
    /// under the lock, so concurrent writers never interleave fields of
    /// one entry.
    pub fn store(&self, file_path: &Path, mtime: u64, size: u64, digest: String) {
        let key = Self::key_for(file_path);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, CacheEntry { mtime, size, digest });
        }
    }

    /// Serialize the cache to compressed JSON and atomically replace the
    /// cache file. Uses multi-threaded compression when more than one core
    /// is available.
    pub fn save(&self) -> Result<()> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("hash cache lock poisoned"))?;
        let content = serde_json::to_vec(&*entries)?;

        let tmp_path = self.cache_file.with_extension("zst.tmp");
        let file = fs::File::create(&tmp_path)
            .with_context(|| format!("Failed to create '{}'", tmp_path.display()))?;
        let mut encoder = Encoder::new(file, 9)?;
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        if threads > 1
            && let Err(err) = encoder.multithread(threads as u32)
        {
            info!("Multi-threaded compression unavailable ({err}), using single thread");
        }
        encoder.write_all(&content)?;
        encoder.finish()?;

        fs::rename(&tmp_path, &self.cache_file)
            .with_context(|| format!("Failed to replace '{}'", self.cache_file.display()))?;

        let size = fs::metadata(&self.cache_file).map(|m| m.len()).unwrap_or(0);
        info!(
            "Saved hash cache to '{}' ({} entries, {})",
            self.cache_file.display(),
            HumanCount(entries.len() as u64),
            HumanBytes(size)
        );
        Ok(())
    }

    /// Delete the cache file and forget all in-memory entries.
    pub fn clear(&self) -> Result<()> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        match fs::remove_file(&self.cache_file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to remove '{}'", self.cache_file.display())),
        }
    }

    /// Snapshot of all records, sorted by path for stable output.
    pub fn entries(&self) -> Vec<(String, CacheEntry)> {
        let mut records: Vec<_> = self
            .entries
            .lock()
            .map(|entries| entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lookups satisfied from the cache since load.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that required hashing since load.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn key_for(file_path: &Path) -> String {
        file_path.to_string_lossy().into_owned()
    }
}
