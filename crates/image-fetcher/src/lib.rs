//! HTTP image fetching
//!
//! Downloads a URL's bytes to a destination path. Supports caller-supplied
//! request headers and an opt-in client that accepts self-signed TLS
//! certificates.

pub mod error;
pub mod fetcher;

pub use error::{FetchError, Result};
pub use fetcher::ImageFetcher;
