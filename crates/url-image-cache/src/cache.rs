//! Cache orchestration
//!
//! Every public operation funnels through one `resolve` routine: consult
//! the record store, verify the backing file, and on any miss delete the
//! stale remnant and run a caller-supplied materialize step before a
//! fresh record is written. A record without a file, or a file without a
//! record, is a miss, never an error.

use crate::error::{CacheError, Result};
use crate::fs::{self, DirInfo};
use crate::options::{CacheConfig, CacheOptions};
use crate::paths;
use image_fetcher::ImageFetcher;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use ttl_record_store::TtlRecordStore;

/// Outcome of a materialize step
enum Materialized {
    /// A file was produced at the target path; record it
    File,
    /// Probe no-op: nothing produced, nothing recorded
    Skipped,
}

/// Explicit hit/miss outcome of `resolve`
struct Resolution {
    path: PathBuf,
    hit: bool,
}

/// URL-keyed image cache over a TTL record store and a download
/// collaborator. Defaults are fixed at construction; each call may layer
/// its own option overrides on a copy.
pub struct ImageCache {
    store: TtlRecordStore,
    fetcher: ImageFetcher,
    defaults: CacheConfig,
}

impl ImageCache {
    /// Cache with an in-memory record store
    pub fn new(defaults: CacheConfig) -> Self {
        Self::with_store(defaults, TtlRecordStore::in_memory())
    }

    /// Cache over a caller-provided record store (e.g. one with snapshot
    /// persistence)
    pub fn with_store(defaults: CacheConfig, store: TtlRecordStore) -> Self {
        Self {
            store,
            fetcher: ImageFetcher::new(),
            defaults,
        }
    }

    /// Whether a URL is eligible for caching: http(s) scheme only.
    /// Pure predicate, no I/O.
    pub fn is_cacheable(url: &str) -> bool {
        paths::is_cacheable_url(url)
    }

    /// Whether `url` is currently cached: record present, unexpired, and
    /// the backing file still on disk. A miss is a `false`, not an error,
    /// and nothing is materialized.
    pub async fn probe_cached(&self, url: &str, options: &CacheOptions) -> Result<bool> {
        let config = self.defaults.merge(options);
        let resolution = self
            .resolve(url, &config, |_path| async { Ok(Materialized::Skipped) })
            .await?;
        Ok(resolution.hit)
    }

    /// Return the cached file path for `url`, downloading it first if it
    /// is absent, expired, or its file vanished
    pub async fn fetch_and_cache(&self, url: &str, options: &CacheOptions) -> Result<PathBuf> {
        let config = self.defaults.merge(options);
        let headers = config.headers.clone();
        let allow_self_signed = config.allow_self_signed;
        let resolution = self
            .resolve(url, &config, |path| async move {
                self.fetcher
                    .download_to(url, &path, &headers, allow_self_signed)
                    .await
                    .map_err(|err| CacheError::Materialize(Box::new(err)))?;
                Ok(Materialized::File)
            })
            .await?;
        Ok(resolution.path)
    }

    /// Cache `url` from a local file instead of the network. Useful for
    /// pre-populating the cache with content already on hand.
    pub async fn seed_and_cache(
        &self,
        url: &str,
        local_path: &Path,
        options: &CacheOptions,
    ) -> Result<PathBuf> {
        let config = self.defaults.merge(options);
        let resolution = self
            .resolve(url, &config, |path| async move {
                fs::copy_file(local_path, &path)
                    .await
                    .map_err(|err| CacheError::Materialize(Box::new(err)))?;
                Ok(Materialized::File)
            })
            .await?;
        Ok(resolution.path)
    }

    /// Drop `url` from the cache: record first, then the file.
    /// A file that is already gone is fine.
    pub async fn evict(&self, url: &str, options: &CacheOptions) -> Result<()> {
        if !Self::is_cacheable(url) {
            return Err(CacheError::NotCacheable(url.to_string()));
        }
        let config = self.defaults.merge(options);

        let canonical = paths::canonical_url(url, &config.query_policy)?;
        self.store.remove(&canonical).await?;

        let relative = paths::relative_path(url, &config.query_policy)?;
        let path = config
            .cache_root
            .join(&relative.bucket)
            .join(&relative.file_name);
        fs::delete_file(&path).await?;

        info!(url = %url, "Evicted cached image");
        Ok(())
    }

    /// Flush every record and recursively empty the cache root
    pub async fn clear_all(&self, options: &CacheOptions) -> Result<()> {
        let config = self.defaults.merge(options);
        self.store.flush().await?;
        fs::clean_dir(&config.cache_root).await?;

        info!(cache_root = ?config.cache_root, "Cleared cache");
        Ok(())
    }

    /// File count and total bytes under the cache root
    pub async fn inspect(&self, options: &CacheOptions) -> Result<DirInfo> {
        let config = self.defaults.merge(options);
        Ok(fs::dir_info(&config.cache_root).await?)
    }

    /// The shared lookup/miss/reconcile routine.
    ///
    /// Hit: unexpired record whose file is still on disk. Everything else
    /// is a miss: any stale file at the derived path is deleted, the
    /// materialize step runs against that path, and a fresh record is
    /// written only when it actually produced a file.
    async fn resolve<M, Fut>(
        &self,
        url: &str,
        config: &CacheConfig,
        materialize: M,
    ) -> Result<Resolution>
    where
        M: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = Result<Materialized>>,
    {
        if !Self::is_cacheable(url) {
            return Err(CacheError::NotCacheable(url.to_string()));
        }

        let canonical = paths::canonical_url(url, &config.query_policy)?;

        if let Some(recorded) = self.store.get(&canonical).await {
            let path = config.cache_root.join(&recorded);
            if fs::exists(&path).await {
                debug!(url = %url, path = ?path, "Cache hit");
                return Ok(Resolution { path, hit: true });
            }
            // The file vanished out from under a live record; fold into
            // the miss branch
            warn!(url = %url, path = ?path, "Dangling record, treating as miss");
        }

        // Derive the location from the URL itself, not the store; the
        // store entry may be absent or stale
        let relative = paths::relative_path(url, &config.query_policy)?;
        let path = config
            .cache_root
            .join(&relative.bucket)
            .join(&relative.file_name);

        fs::delete_file(&path).await?;

        match materialize(path.clone()).await? {
            Materialized::File => {
                self.store
                    .set(&canonical, &relative.to_string(), config.ttl_secs)
                    .await?;
                debug!(url = %url, path = ?path, ttl_secs = config.ttl_secs, "Cached");
                Ok(Resolution { path, hit: false })
            }
            Materialized::Skipped => Ok(Resolution { path, hit: false }),
        }
    }
}
