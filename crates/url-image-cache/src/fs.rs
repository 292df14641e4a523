//! Filesystem primitives for the cache
//!
//! Thin async wrappers over `tokio::fs` with the semantics the
//! orchestrator relies on: deletes are idempotent on absence, stats and
//! cleanup treat a missing directory as empty.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Aggregate statistics for a cache directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirInfo {
    pub file_count: u64,
    pub total_bytes: u64,
}

/// Whether a file or directory exists at `path`
pub async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}

/// Delete a file; a file that is already gone is not an error
pub async fn delete_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

/// Copy `src` to `dest`, creating `dest`'s parent directory if needed
pub async fn copy_file(src: &Path, dest: &Path) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::copy(src, dest).await?;
    Ok(())
}

/// Recursively remove everything inside `path`, keeping `path` itself.
/// A missing directory counts as already clean.
pub async fn clean_dir(path: &Path) -> io::Result<()> {
    let mut entries = match fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if metadata.is_dir() {
            fs::remove_dir_all(entry.path()).await?;
        } else {
            fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

/// Count files and total bytes under `path`, recursively. A missing
/// directory reports zero of both.
pub async fn dir_info(path: &Path) -> io::Result<DirInfo> {
    let mut info = DirInfo::default();
    let mut pending = vec![path.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        };

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_dir() {
                pending.push(entry.path());
            } else {
                info.file_count += 1;
                info.total_bytes += metadata.len();
            }
        }
    }

    Ok(info)
}

/// Default cache root: `IMAGE_CACHE_DIR` env override, else a local
/// `cache/images` directory
pub fn default_cache_dir() -> PathBuf {
    std::env::var("IMAGE_CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./cache/images"))
}
