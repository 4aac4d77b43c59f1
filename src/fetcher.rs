//! One-call facade: resolve a query, download it, optionally verify it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};
use url::Url;

use crate::checksum::{ChecksumManifest, verify_file};
use crate::download::constants::{CONNECT_TIMEOUT_SECS, NETWORK_TIMEOUT_SECS};
use crate::download::{
    Credentials, DownloadEngine, DownloadOutcome, HttpClient, RetryPolicy, StreamOptions,
};
use crate::error::FetchError;
use crate::query::BuildQuery;
use crate::resolver::{DEFAULT_BASE_URL, ResolvedBuild, Resolver};
use crate::revision::RevisionLookup;

/// Settings shared by resolution and download.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Archive root, e.g. `https://archive.mozilla.org/pub/`.
    pub base_url: Url,
    /// Directory to save into, or the target file when it has an extension.
    pub destination: PathBuf,
    pub credentials: Option<Credentials>,
    /// Applied separately to resolution and to the download.
    pub retry_policy: RetryPolicy,
    /// Wall-clock budget for the download body.
    pub timeout: Option<Duration>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub show_progress: bool,
    /// Manifest to verify the downloaded file against.
    pub checksum_url: Option<Url>,
}

impl FetchOptions {
    /// Defaults for the public archive, saving into the working directory.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the default base URL is a constant.
    pub fn for_default_archive() -> Result<Self, FetchError> {
        let base_url =
            Url::parse(DEFAULT_BASE_URL).map_err(|_| FetchError::invalid_url(DEFAULT_BASE_URL))?;
        Ok(Self {
            base_url,
            destination: PathBuf::from("."),
            credentials: None,
            retry_policy: RetryPolicy::default(),
            timeout: None,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: NETWORK_TIMEOUT_SECS,
            show_progress: false,
            checksum_url: None,
        })
    }
}

/// What a completed fetch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub build: ResolvedBuild,
    pub target: PathBuf,
    pub outcome: DownloadOutcome,
    /// Whether a checksum manifest was checked.
    pub verified: bool,
}

/// Resolver, download engine and destination for one query.
#[derive(Debug)]
pub struct BuildFetcher {
    resolver: Resolver,
    engine: DownloadEngine,
    client: HttpClient,
    destination: PathBuf,
    checksum_url: Option<Url>,
}

impl BuildFetcher {
    /// Creates a fetcher sharing one HTTP client between resolution and download.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for an unusable base URL.
    pub fn new(query: BuildQuery, options: FetchOptions) -> Result<Self, FetchError> {
        let client =
            HttpClient::new_with_timeouts(options.connect_timeout_secs, options.read_timeout_secs)
                .with_credentials(options.credentials);
        let resolver = Resolver::new(
            query,
            client.clone(),
            &options.base_url,
            options.retry_policy,
        )?;
        let engine = DownloadEngine::new(
            client.clone(),
            options.retry_policy,
            StreamOptions {
                timeout: options.timeout,
                show_progress: options.show_progress,
            },
        );
        Ok(Self {
            resolver,
            engine,
            client,
            destination: options.destination,
            checksum_url: options.checksum_url,
        })
    }

    /// Replaces the revision lookup used for try builds.
    #[must_use]
    pub fn with_revision_lookup(mut self, revision_lookup: Arc<dyn RevisionLookup>) -> Self {
        self.resolver = self.resolver.with_revision_lookup(revision_lookup);
        self
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolves the build without downloading it.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub async fn resolve(&self) -> Result<&ResolvedBuild, FetchError> {
        self.resolver.resolve().await
    }

    /// Local path the build is saved to.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub async fn target_path(&self) -> Result<PathBuf, FetchError> {
        let build = self.resolve().await?;
        Ok(target_path(&self.destination, &build.local_filename))
    }

    /// Resolves, downloads and, when a manifest is configured, verifies the build.
    ///
    /// # Errors
    ///
    /// Returns the first resolution, download or verification failure. On
    /// [`FetchError::ChecksumMismatch`] the downloaded file is removed.
    #[instrument(skip(self), fields(variant = %self.resolver.query().kind()))]
    pub async fn fetch(&self) -> Result<FetchReport, FetchError> {
        let build = self.resolve().await?.clone();
        let target = target_path(&self.destination, &build.local_filename);

        let outcome = self
            .engine
            .download(
                build.final_url.as_str(),
                build.unsigned_fallback_url.as_ref().map(Url::as_str),
                &target,
            )
            .await?;

        let verified = match &self.checksum_url {
            Some(checksum_url) => {
                if let Err(err) = self
                    .verify(checksum_url, &build.binary_filename, &target)
                    .await
                {
                    discard_unverified(&target, &err).await;
                    return Err(err);
                }
                true
            }
            None => false,
        };

        Ok(FetchReport {
            build,
            target,
            outcome,
            verified,
        })
    }

    async fn verify(
        &self,
        checksum_url: &Url,
        binary_filename: &str,
        target: &Path,
    ) -> Result<(), FetchError> {
        let manifest = ChecksumManifest::fetch(&self.client, checksum_url).await?;
        let expected = manifest.hash_for(binary_filename).ok_or_else(|| {
            FetchError::not_found(
                format!("No checksum listed for {binary_filename}"),
                checksum_url.as_str(),
            )
        })?;
        verify_file(target, expected).await?;
        info!(path = %target.display(), "download verified");
        Ok(())
    }
}

/// Removes a target whose contents failed verification so the next fetch
/// downloads it again instead of short-circuiting on the bad file.
async fn discard_unverified(target: &Path, err: &FetchError) {
    if !matches!(err, FetchError::ChecksumMismatch { .. }) {
        return;
    }
    match tokio::fs::remove_file(target).await {
        Ok(()) => warn!(path = %target.display(), "removed file that failed verification"),
        Err(remove_err) => warn!(
            path = %target.display(),
            error = %remove_err,
            "could not remove file that failed verification"
        ),
    }
}

/// `destination` itself when it names a file (has an extension), otherwise
/// `destination/local_filename`.
#[must_use]
pub fn target_path(destination: &Path, local_filename: &str) -> PathBuf {
    if destination.extension().is_some() {
        destination.to_path_buf()
    } else {
        destination.join(local_filename)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_path_with_directory_destination() {
        assert_eq!(
            target_path(Path::new("/tmp/builds"), "firefox-21.0.en-US.linux.tar.bz2"),
            PathBuf::from("/tmp/builds/firefox-21.0.en-US.linux.tar.bz2")
        );
    }

    #[test]
    fn test_target_path_with_file_destination() {
        assert_eq!(
            target_path(Path::new("/tmp/builds/custom.tar.bz2"), "ignored"),
            PathBuf::from("/tmp/builds/custom.tar.bz2")
        );
    }

    #[test]
    fn test_default_options_point_at_public_archive() {
        let options = FetchOptions::for_default_archive().unwrap();
        assert_eq!(options.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(options.retry_policy.max_attempts(), 0);
        assert!(options.checksum_url.is_none());
    }
}
