//! Download engine: turns a resolved URL into a file on disk.
//!
//! The engine owns the retry policy and the streaming options. It skips
//! targets that already exist, creates missing parent directories, and falls
//! back to a secondary URL when the primary one is not found.
//!
//! # Example
//!
//! ```no_run
//! use buildfetch_core::download::{DownloadEngine, HttpClient, RetryPolicy, StreamOptions};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DownloadEngine::new(
//!     HttpClient::new(),
//!     RetryPolicy::default(),
//!     StreamOptions::default(),
//! );
//! let outcome = engine
//!     .download(
//!         "https://archive.mozilla.org/pub/firefox/releases/21.0/linux-x86_64/en-US/firefox-21.0.tar.bz2",
//!         None,
//!         Path::new("./firefox-21.0.en-US.linux64.tar.bz2"),
//!     )
//!     .await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use tracing::{info, instrument, warn};

use super::client::{HttpClient, StreamOptions};
use super::retry::RetryPolicy;
use crate::error::FetchError;

/// Result of a download request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The target already existed; nothing was transferred.
    AlreadyPresent,
    /// The file was transferred from `url`.
    Downloaded {
        /// URL the bytes actually came from.
        url: String,
        /// Number of bytes written.
        bytes: u64,
    },
}

/// Downloads a single resolved artifact with bounded retries.
#[derive(Debug, Clone)]
pub struct DownloadEngine {
    client: HttpClient,
    retry_policy: RetryPolicy,
    options: StreamOptions,
}

impl DownloadEngine {
    /// Creates an engine around an existing client.
    #[must_use]
    pub fn new(client: HttpClient, retry_policy: RetryPolicy, options: StreamOptions) -> Self {
        Self {
            client,
            retry_policy,
            options,
        }
    }

    /// Returns the retry policy applied to each URL.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    /// Downloads `url` to `target`.
    ///
    /// An existing `target` is left untouched. When every attempt on `url`
    /// ends in not-found and `fallback_url` is set, the fallback is tried
    /// with a fresh retry budget.
    ///
    /// # Errors
    ///
    /// Returns the last [`FetchError`] of the final URL tried.
    #[instrument(skip(self, fallback_url), fields(target = %target.display()))]
    pub async fn download(
        &self,
        url: &str,
        fallback_url: Option<&str>,
        target: &Path,
    ) -> Result<DownloadOutcome, FetchError> {
        if tokio::fs::try_exists(target)
            .await
            .map_err(|e| FetchError::io(target.to_path_buf(), e))?
        {
            info!(path = %target.display(), "file has already been downloaded");
            return Ok(DownloadOutcome::AlreadyPresent);
        }

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchError::io(parent.to_path_buf(), e))?;
        }

        match self.download_with_retry(url, target).await {
            Err(error) if error.is_not_found() => match fallback_url {
                Some(fallback) => {
                    warn!(
                        url = %url,
                        fallback = %fallback,
                        "build not found, trying fallback location"
                    );
                    self.download_with_retry(fallback, target).await
                }
                None => Err(error),
            },
            result => result,
        }
    }

    async fn download_with_retry(
        &self,
        url: &str,
        target: &Path,
    ) -> Result<DownloadOutcome, FetchError> {
        info!(url = %url, "downloading");
        let bytes = self
            .retry_policy
            .run("download", || {
                self.client.download_to_path(url, target, self.options)
            })
            .await?;
        Ok(DownloadOutcome::Downloaded {
            url: url.to_string(),
            bytes,
        })
    }
}
