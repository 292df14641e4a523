//! URL canonicalization and cache path derivation
//!
//! Pure functions turning a URL into the record-store key (the canonical
//! URL) and the on-disk location (`<host-bucket>/<cache-key>`). The
//! derivation rules here are the on-disk compatibility contract: changing
//! them orphans every previously cached file.

use crate::error::{CacheError, Result};
use crate::options::QueryPolicy;
use sha1::{Digest, Sha1};
use std::fmt;
use url::Url;

/// Extensions kept as-is on cache keys; anything else becomes `jpg`
const CACHEABLE_EXTENSIONS: [&str; 7] = ["png", "jpeg", "jpg", "gif", "bmp", "tiff", "tif"];

const DEFAULT_EXTENSION: &str = "jpg";

/// Legacy formula-renderer URLs keep their historical key shape: the part
/// of the URL after this marker is hashed in two halves (see `cache_key`)
const FORMULA_MARKER: &str = "/cgi-bin/math.cgi";

/// The two path segments a cached file lives under, relative to the
/// cache root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePath {
    /// Host-derived directory segment
    pub bucket: String,
    /// Content-hash-derived file name, extension included
    pub file_name: String,
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.file_name)
    }
}

/// Whether a URL is eligible for caching at all: an http(s) scheme,
/// case-insensitive. No parsing, no I/O.
pub fn is_cacheable_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Reduce a URL to the form used as the record-store key: scheme, host,
/// path, and the query parameters selected by `policy`. The fragment is
/// always dropped. Idempotent.
pub fn canonical_url(url: &str, policy: &QueryPolicy) -> Result<String> {
    let mut parsed = parse(url)?;
    parsed.set_fragment(None);

    match policy {
        QueryPolicy::All => {}
        QueryPolicy::Ignore => parsed.set_query(None),
        QueryPolicy::Only(names) => {
            let retained: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(name, _)| names.contains(name.as_ref()))
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect();

            parsed.set_query(None);
            if !retained.is_empty() {
                let mut serializer = parsed.query_pairs_mut();
                for (name, value) in &retained {
                    serializer.append_pair(name, value);
                }
            }
        }
    }

    Ok(parsed.into())
}

/// Derive where a URL's cached file lives relative to the cache root
pub fn relative_path(url: &str, policy: &QueryPolicy) -> Result<RelativePath> {
    let parsed = parse(url)?;
    let host = parsed
        .host_str()
        .ok_or_else(|| CacheError::NotCacheable(url.to_string()))?;

    Ok(RelativePath {
        bucket: host_bucket(host),
        file_name: cache_key(url, &parsed, policy),
    })
}

fn parse(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|_| CacheError::NotCacheable(url.to_string()))
}

/// Directory segment for a host: lowercased, every character outside
/// `[a-z0-9_]` replaced by `_`, then a hash of the raw host appended so
/// punycode/case variants that sanitize alike still get distinct buckets.
fn host_bucket(host: &str) -> String {
    let sanitized: String = host
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}", sanitized, sha1_hex(host))
}

/// File name segment: `<hash>.<ext>` where the hash input covers the URL
/// path (extension normalized) and the selected query parameters.
fn cache_key(raw_url: &str, parsed: &Url, policy: &QueryPolicy) -> String {
    let pathname = parsed.path();
    let (directory, file_name) = match pathname.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", pathname),
    };
    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, resolve_extension(&ext.to_ascii_lowercase())),
        None => (file_name, DEFAULT_EXTENSION),
    };

    let hash_input = if pathname.contains(FORMULA_MARKER) {
        formula_hash_input(raw_url)
    } else {
        None
    };
    let hash_input = hash_input.unwrap_or_else(|| {
        format!(
            "{}/{}.{}{}",
            directory,
            stem,
            extension,
            query_for_cache_key(parsed, policy)
        )
    });

    format!("{}.{}", sha1_hex(&hash_input), extension)
}

fn resolve_extension(ext: &str) -> &'static str {
    CACHEABLE_EXTENSIONS
        .iter()
        .find(|known| ***known == *ext)
        .copied()
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Replacement hash input for formula URLs: the substring after the
/// marker is split at its midpoint and each half hashed separately, the
/// two hex digests concatenated. Kept bit-for-bit for compatibility with
/// keys already on disk.
fn formula_hash_input(raw_url: &str) -> Option<String> {
    let idx = raw_url.find(FORMULA_MARKER)?;
    let suffix = &raw_url[idx + FORMULA_MARKER.len()..];

    let mut mid = suffix.len() / 2;
    // Clamp to a char boundary for multibyte input
    while !suffix.is_char_boundary(mid) {
        mid -= 1;
    }
    let (head, tail) = suffix.split_at(mid);

    Some(format!("{}{}", sha1_hex(head), sha1_hex(tail)))
}

/// Selected query parameters serialized order-insensitively: pairs sorted
/// by parameter name, values joined with `,`
fn query_for_cache_key(parsed: &Url, policy: &QueryPolicy) -> String {
    let mut pairs: Vec<(String, String)> = match policy {
        QueryPolicy::Ignore => return String::new(),
        QueryPolicy::All => parsed
            .query_pairs()
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect(),
        QueryPolicy::Only(names) => parsed
            .query_pairs()
            .filter(|(name, _)| names.contains(name.as_ref()))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect(),
    };

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .into_iter()
        .map(|(_, value)| value)
        .collect::<Vec<_>>()
        .join(",")
}

fn sha1_hex(input: &str) -> String {
    hex::encode(Sha1::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cacheable_url() {
        assert!(is_cacheable_url("http://example.com/a.png"));
        assert!(is_cacheable_url("https://example.com/a.png"));
        assert!(is_cacheable_url("HTTPS://EXAMPLE.COM/A.PNG"));
        assert!(!is_cacheable_url("ftp://example.com/a.png"));
        assert!(!is_cacheable_url("file:///a.png"));
        assert!(!is_cacheable_url(""));
        assert!(!is_cacheable_url("example.com/a.png"));
    }

    #[test]
    fn test_canonical_url_strips_query_by_default() {
        let canonical = canonical_url("http://h/a/pic.jpg?w=1&h=2", &QueryPolicy::Ignore).unwrap();
        assert_eq!(canonical, "http://h/a/pic.jpg");
    }

    #[test]
    fn test_canonical_url_keeps_all_when_asked() {
        let canonical = canonical_url("http://h/a/pic.jpg?w=1&h=2", &QueryPolicy::All).unwrap();
        assert_eq!(canonical, "http://h/a/pic.jpg?w=1&h=2");
    }

    #[test]
    fn test_canonical_url_filters_selected_params() {
        let policy = QueryPolicy::only(["w"]);
        let canonical = canonical_url("http://h/a/pic.jpg?w=1&h=2", &policy).unwrap();
        assert_eq!(canonical, "http://h/a/pic.jpg?w=1");
    }

    #[test]
    fn test_canonical_url_drops_fragment() {
        let canonical = canonical_url("http://h/a/pic.jpg#frag", &QueryPolicy::All).unwrap();
        assert_eq!(canonical, "http://h/a/pic.jpg");
    }

    #[test]
    fn test_canonical_url_is_idempotent() {
        for policy in [QueryPolicy::Ignore, QueryPolicy::All, QueryPolicy::only(["b"])] {
            let once = canonical_url("http://h/p/img.png?a=1&b=2#x", &policy).unwrap();
            let twice = canonical_url(&once, &policy).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_urls_differing_in_excluded_params_canonicalize_identically() {
        let policy = QueryPolicy::only(["w"]);
        let a = canonical_url("http://h/pic.jpg?w=1&session=abc", &policy).unwrap();
        let b = canonical_url("http://h/pic.jpg?w=1&session=def", &policy).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_relative_path_matches_contract_example() {
        // http://example.com/a/b/pic.PNG -> bucket example_com_<sha1(host)>,
        // key <sha1("/a/b/pic.png")>.png
        let rel = relative_path("http://example.com/a/b/pic.PNG", &QueryPolicy::Ignore).unwrap();

        let expected_bucket = format!("example_com_{}", sha1_hex("example.com"));
        assert_eq!(rel.bucket, expected_bucket);

        let expected_key = format!("{}.png", sha1_hex("/a/b/pic.png"));
        assert_eq!(rel.file_name, expected_key);
    }

    #[test]
    fn test_host_bucket_sanitizes_and_disambiguates() {
        let a = relative_path("http://my-host.example.com/p.jpg", &QueryPolicy::Ignore).unwrap();
        assert!(a.bucket.starts_with("my_host_example_com_"));

        // Same sanitized prefix, different raw hosts -> different buckets
        let b = relative_path("http://my.host.example.com/p.jpg", &QueryPolicy::Ignore).unwrap();
        assert!(b.bucket.starts_with("my_host_example_com_"));
        assert_ne!(a.bucket, b.bucket);
    }

    #[test]
    fn test_unrecognized_extension_defaults_to_jpg() {
        let rel = relative_path("http://h/file.webp", &QueryPolicy::Ignore).unwrap();
        assert!(rel.file_name.ends_with(".jpg"));

        let rel = relative_path("http://h/file", &QueryPolicy::Ignore).unwrap();
        assert!(rel.file_name.ends_with(".jpg"));
    }

    #[test]
    fn test_allow_listed_extensions_survive() {
        for ext in ["png", "jpeg", "jpg", "gif", "bmp", "tiff", "tif"] {
            let url = format!("http://h/file.{}", ext);
            let rel = relative_path(&url, &QueryPolicy::Ignore).unwrap();
            assert!(rel.file_name.ends_with(&format!(".{}", ext)), "{}", ext);
        }
    }

    #[test]
    fn test_query_param_order_does_not_change_key() {
        let policy = QueryPolicy::only(["w", "h"]);
        let a = relative_path("http://h/pic.jpg?w=100&h=50", &policy).unwrap();
        let b = relative_path("http://h/pic.jpg?h=50&w=100", &policy).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_selected_query_values_change_key() {
        let policy = QueryPolicy::only(["w"]);
        let a = relative_path("http://h/pic.jpg?w=100", &policy).unwrap();
        let b = relative_path("http://h/pic.jpg?w=200", &policy).unwrap();
        assert_ne!(a.file_name, b.file_name);
    }

    #[test]
    fn test_excluded_query_params_do_not_change_key() {
        let a = relative_path("http://h/pic.jpg?session=1", &QueryPolicy::Ignore).unwrap();
        let b = relative_path("http://h/pic.jpg?session=2", &QueryPolicy::Ignore).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_derivation_is_stable() {
        let url = "http://example.com/img/photo.jpeg?v=3";
        let policy = QueryPolicy::All;
        assert_eq!(
            relative_path(url, &policy).unwrap(),
            relative_path(url, &policy).unwrap()
        );
    }

    #[test]
    fn test_formula_urls_get_distinct_keys_per_suffix() {
        let a = relative_path("http://h/cgi-bin/math.cgi?x=1", &QueryPolicy::Ignore).unwrap();
        let b = relative_path("http://h/cgi-bin/math.cgi?x=2", &QueryPolicy::Ignore).unwrap();
        // The hashed suffix differs even though the query policy excludes
        // parameters from generic keys
        assert_ne!(a.file_name, b.file_name);
    }

    #[test]
    fn test_formula_key_is_stable() {
        let url = "http://h/cgi-bin/math.cgi?expr=1%2B2";
        let a = relative_path(url, &QueryPolicy::Ignore).unwrap();
        let b = relative_path(url, &QueryPolicy::Ignore).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_formula_key_differs_from_generic_derivation() {
        let rel = relative_path("http://h/cgi-bin/math.cgi?x=1", &QueryPolicy::Ignore).unwrap();
        // The generic pipeline would hash "/cgi-bin/math.jpg"
        let generic = format!("{}.jpg", sha1_hex("/cgi-bin/math.jpg"));
        assert_ne!(rel.file_name, generic);
    }

    #[test]
    fn test_relative_path_display() {
        let rel = RelativePath {
            bucket: "example_com_abc".to_string(),
            file_name: "deadbeef.png".to_string(),
        };
        assert_eq!(format!("{}", rel), "example_com_abc/deadbeef.png");
    }

    #[test]
    fn test_unparseable_url_is_not_cacheable() {
        let err = relative_path("http://", &QueryPolicy::Ignore).unwrap_err();
        assert!(matches!(err, CacheError::NotCacheable(_)));
    }
}
