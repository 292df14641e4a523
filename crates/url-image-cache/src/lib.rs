//! URL-keyed image cache
//!
//! Caches remote images on local storage under stable, content-derived
//! file paths, with freshness tracked by a TTL record store. Lookups
//! verify the backing file on every hit; dangling records and dangling
//! files are folded into the miss branch and re-materialized, never
//! surfaced as errors.

pub mod cache;
pub mod error;
pub mod fs;
pub mod options;
pub mod paths;
mod preload;

pub use cache::ImageCache;
pub use error::{CacheError, Result};
pub use fs::DirInfo;
pub use options::{CacheConfig, CacheOptions, QueryPolicy, DEFAULT_TTL_SECS};
pub use paths::RelativePath;
pub use preload::PreloadReport;
