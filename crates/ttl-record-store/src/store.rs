//! In-memory TTL record store with optional JSON snapshot persistence

use crate::error::Result;
use crate::types::RecordEntry;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A key/value store mapping string keys to relative file paths, where
/// every entry carries its own expiry. Reads treat expired entries as
/// absent and drop their backing state.
pub struct TtlRecordStore {
    entries: Arc<RwLock<HashMap<String, RecordEntry>>>,
    /// Snapshot file rewritten on every mutation when set
    snapshot_path: Option<PathBuf>,
}

impl TtlRecordStore {
    /// Create a store with no persistence
    pub fn in_memory() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            snapshot_path: None,
        }
    }

    /// Create a store that mirrors its contents to a JSON snapshot file
    pub fn with_persistence(snapshot_path: PathBuf) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            snapshot_path: Some(snapshot_path),
        }
    }

    /// Load entries from the snapshot file, dropping anything already
    /// expired. Missing snapshot is not an error.
    pub async fn load(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let data = match fs::read(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let mut loaded: HashMap<String, RecordEntry> = serde_json::from_slice(&data)?;
        let now = Utc::now();
        loaded.retain(|_, entry| !entry.is_expired(now));

        debug!(entries = loaded.len(), snapshot = ?path, "Loaded record snapshot");

        let mut entries = self.entries.write().await;
        *entries = loaded;
        Ok(())
    }

    /// Get the relative path recorded for a key, or `None` if the key is
    /// absent or expired. An expired entry is removed on the spot.
    pub async fn get(&self, key: &str) -> Option<String> {
        let entry = {
            let entries = self.entries.read().await;
            entries.get(key).cloned()
        };

        let entry = entry?;
        if entry.is_expired(Utc::now()) {
            debug!(key = %key, "Record expired, dropping");
            let snapshot = {
                let mut entries = self.entries.write().await;
                entries.remove(key);
                self.snapshot_path.as_ref().map(|_| entries.clone())
            };
            // Expiry cleanup must not turn a read into a failure
            if let Err(err) = self.save_snapshot(snapshot).await {
                warn!(key = %key, error = %err, "Failed to persist snapshot after expiry");
            }
            return None;
        }

        Some(entry.relative_path)
    }

    /// Record a key -> relative path mapping valid for `ttl_secs` seconds
    pub async fn set(&self, key: &str, relative_path: &str, ttl_secs: u64) -> Result<()> {
        // chrono's Duration panics past its millisecond range; anything
        // near the cap never expires in practice anyway
        const MAX_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;
        let ttl = Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64);
        let entry = RecordEntry {
            relative_path: relative_path.to_string(),
            expires_at: Utc::now() + ttl,
        };

        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.insert(key.to_string(), entry);
            self.snapshot_path.as_ref().map(|_| entries.clone())
        };

        debug!(key = %key, relative_path = %relative_path, ttl_secs, "Recorded entry");
        self.save_snapshot(snapshot).await
    }

    /// Remove a key. Absent keys are not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.remove(key);
            self.snapshot_path.as_ref().map(|_| entries.clone())
        };

        debug!(key = %key, "Removed entry");
        self.save_snapshot(snapshot).await
    }

    /// Drop every entry
    pub async fn flush(&self) -> Result<()> {
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.clear();
            self.snapshot_path.as_ref().map(|_| entries.clone())
        };

        debug!("Flushed record store");
        self.save_snapshot(snapshot).await
    }

    /// Number of entries currently held, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn save_snapshot(&self, snapshot: Option<HashMap<String, RecordEntry>>) -> Result<()> {
        let (Some(path), Some(entries)) = (&self.snapshot_path, snapshot) else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec(&entries)?;
        fs::write(path, json).await?;
        Ok(())
    }
}
