//! Batch cache warm-up

use crate::cache::ImageCache;
use crate::options::CacheOptions;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Outcome of a preload batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreloadReport {
    pub cached: usize,
    pub failed: usize,
}

impl ImageCache {
    /// Warm the cache for a batch of URLs, fetching at most `concurrency`
    /// at a time. Individual failures are logged and counted; they never
    /// abort the rest of the batch.
    pub async fn preload(
        &self,
        urls: &[String],
        options: &CacheOptions,
        concurrency: usize,
    ) -> PreloadReport {
        let mut report = PreloadReport::default();

        let mut results = stream::iter(urls)
            .map(|url| async move { (url, self.fetch_and_cache(url, options).await) })
            .buffer_unordered(concurrency.max(1));

        while let Some((url, outcome)) = results.next().await {
            match outcome {
                Ok(path) => {
                    debug!(url = %url, path = ?path, "Preloaded image");
                    report.cached += 1;
                }
                Err(err) => {
                    warn!(url = %url, error = %err, "Preload failed");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
