//! Downloading remote images to local files

use crate::error::{FetchError, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

/// HTTP client for downloading images
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    /// Create a new fetcher with a shared client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Download `url` and write its bytes to `dest`, creating the parent
    /// directory if needed. Non-2xx responses fail with a `Status` error.
    pub async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        headers: &HashMap<String, String>,
        allow_self_signed: bool,
    ) -> Result<()> {
        // Self-signed endpoints get a dedicated one-off client; the shared
        // client keeps full certificate verification
        let insecure;
        let client = if allow_self_signed {
            insecure = Client::builder()
                .danger_accept_invalid_certs(true)
                .build()?;
            &insecure
        } else {
            &self.client
        };

        let mut request = client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            warn!(status = %response.status(), url = %url, "Image download failed");
            return Err(FetchError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let data = response.bytes().await?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(dest, &data).await?;

        debug!(url = %url, dest = ?dest, size = data.len(), "Downloaded image");
        Ok(())
    }
}

impl Default for ImageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_download_invalid_url_fails() {
        let dir = tempdir().unwrap();
        let fetcher = ImageFetcher::new();

        let result = fetcher
            .download_to(
                "not a url",
                &dir.path().join("out.jpg"),
                &HashMap::new(),
                false,
            )
            .await;

        assert!(result.is_err());
        // Nothing should have been written
        assert!(!dir.path().join("out.jpg").exists());
    }

    #[tokio::test]
    async fn test_download_unreachable_host_fails() {
        let dir = tempdir().unwrap();
        let fetcher = ImageFetcher::new();

        // Port 1 on loopback is not listening
        let result = fetcher
            .download_to(
                "http://127.0.0.1:1/pic.jpg",
                &dir.path().join("pic.jpg"),
                &HashMap::new(),
                false,
            )
            .await;

        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
