//! Cache configuration and per-call options
//!
//! A process-wide `CacheConfig` holds every setting with an explicit
//! default and is never mutated after construction. Callers pass a
//! `CacheOptions` of overrides; merging copies the defaults and applies
//! each override field-by-field.

use crate::fs;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// Default record TTL: 14 days
pub const DEFAULT_TTL_SECS: u64 = 14 * 24 * 60 * 60;

/// Which query parameters participate in cache keys and canonical URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPolicy {
    /// Strip all query parameters
    Ignore,
    /// Keep all query parameters
    All,
    /// Keep only the named parameters
    Only(BTreeSet<String>),
}

impl QueryPolicy {
    /// Build an `Only` policy from parameter names
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryPolicy::Only(names.into_iter().map(Into::into).collect())
    }
}

impl Default for QueryPolicy {
    fn default() -> Self {
        QueryPolicy::Ignore
    }
}

/// Process-wide cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Headers sent with every download request
    pub headers: HashMap<String, String>,
    /// Record TTL in seconds
    pub ttl_secs: u64,
    /// Query parameter selection for keys and canonical URLs
    pub query_policy: QueryPolicy,
    /// Root directory cached files live under
    pub cache_root: PathBuf,
    /// Accept self-signed TLS certificates when downloading
    pub allow_self_signed: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            headers: HashMap::new(),
            ttl_secs: DEFAULT_TTL_SECS,
            query_policy: QueryPolicy::default(),
            cache_root: fs::default_cache_dir(),
            allow_self_signed: false,
        }
    }
}

impl CacheConfig {
    /// Copy these defaults with `options` layered on top. Unset options
    /// fall back to the default; the defaults themselves are untouched.
    pub fn merge(&self, options: &CacheOptions) -> CacheConfig {
        CacheConfig {
            headers: options.headers.clone().unwrap_or_else(|| self.headers.clone()),
            ttl_secs: options.ttl_secs.unwrap_or(self.ttl_secs),
            query_policy: options
                .query_policy
                .clone()
                .unwrap_or_else(|| self.query_policy.clone()),
            cache_root: options
                .cache_root
                .clone()
                .unwrap_or_else(|| self.cache_root.clone()),
            allow_self_signed: options.allow_self_signed.unwrap_or(self.allow_self_signed),
        }
    }
}

/// Per-call overrides; every unset field falls back to the defaults
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
    pub headers: Option<HashMap<String, String>>,
    pub ttl_secs: Option<u64>,
    pub query_policy: Option<QueryPolicy>,
    pub cache_root: Option<PathBuf>,
    pub allow_self_signed: Option<bool>,
}

impl CacheOptions {
    /// Options that only pin the cache root, the common test setup
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root: Some(cache_root),
            ..Self::default()
        }
    }
}
