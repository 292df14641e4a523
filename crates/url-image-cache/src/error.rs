//! Error types for the URL image cache

use std::fmt;

#[derive(Debug)]
pub enum CacheError {
    /// The input is not an http(s) URL; raised before any I/O
    NotCacheable(String),
    /// The download/copy step failed; no record was written
    Materialize(Box<dyn std::error::Error + Send + Sync>),
    /// Record store failure outside the materialize step
    Store(ttl_record_store::StoreError),
    /// Filesystem failure outside the materialize step
    Io(Box<std::io::Error>),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotCacheable(url) => write!(f, "Not a cacheable URL: {}", url),
            CacheError::Materialize(err) => write!(f, "Materialize error: {}", err),
            CacheError::Store(err) => write!(f, "Record store error: {}", err),
            CacheError::Io(err) => write!(f, "Filesystem error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Materialize(err) => Some(err.as_ref()),
            CacheError::Store(err) => Some(err),
            CacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<ttl_record_store::StoreError> for CacheError {
    fn from(err: ttl_record_store::StoreError) -> Self {
        CacheError::Store(err)
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_cacheable_display() {
        let err = CacheError::NotCacheable("ftp://x".to_string());
        assert_eq!(format!("{}", err), "Not a cacheable URL: ftp://x");
    }

    #[test]
    fn test_io_error_display() {
        let err = CacheError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(format!("{}", err).contains("denied"));
    }

    #[test]
    fn test_materialize_wraps_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "copy failed");
        let err = CacheError::Materialize(Box::new(inner));
        assert!(format!("{}", err).contains("copy failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_is_debug() {
        let err = CacheError::NotCacheable("x".to_string());
        assert!(format!("{:?}", err).contains("NotCacheable"));
    }
}
