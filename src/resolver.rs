//! Resolution of a [`BuildQuery`] into the URL of one build artifact.
//!
//! # Architecture
//!
//! - [`Resolver`] - owns the query and its collaborators, resolves at most once
//! - [`ResolvedBuild`] - the immutable result
//! - [`crate::variant::VariantStrategy`] - per build type directory lookup
//!
//! The whole lookup runs inside the resolver's [`RetryPolicy`], so a build
//! that has not been published yet can be waited for.
//!
//! # Example
//!
//! ```no_run
//! use buildfetch_core::download::{HttpClient, RetryPolicy};
//! use buildfetch_core::query::{BuildQuery, Platform, QueryOptions, VariantKind};
//! use buildfetch_core::resolver::{DEFAULT_BASE_URL, Resolver};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let query = BuildQuery::new(QueryOptions {
//!     platform: Some(Platform::Linux64),
//!     kind: VariantKind::Release,
//!     version: Some("21.0".to_string()),
//!     ..QueryOptions::default()
//! })?;
//! let resolver = Resolver::new(
//!     query,
//!     HttpClient::new(),
//!     &Url::parse(DEFAULT_BASE_URL)?,
//!     RetryPolicy::default(),
//! )?;
//! println!("{}", resolver.resolve().await?.final_url);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{info, instrument, warn};
use url::Url;

use crate::download::{HttpClient, RetryPolicy};
use crate::error::FetchError;
use crate::query::BuildQuery;
use crate::revision::{ArchiveRevisionLookup, RevisionLookup};
use crate::variant::{ResolveContext, join_url, strategy_for};

/// Root of the public build archive.
pub const DEFAULT_BASE_URL: &str = "https://archive.mozilla.org/pub/";

/// Everything needed to download one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBuild {
    /// Directory the binary was found in.
    pub remote_directory_url: Url,
    /// Name of the binary as listed by the archive.
    pub binary_filename: String,
    /// Percent-encoded URL of the binary.
    pub final_url: Url,
    /// File name to save the binary under.
    pub local_filename: String,
    /// Same binary in the unsigned directory, for candidate builds.
    pub unsigned_fallback_url: Option<Url>,
}

/// Resolves one query, at most once.
///
/// The result is memoized in a [`OnceLock`]. Concurrent first calls may both
/// do the lookup; the first stored result wins.
pub struct Resolver {
    query: BuildQuery,
    client: HttpClient,
    application_url: Url,
    revision_lookup: Arc<dyn RevisionLookup>,
    retry_policy: RetryPolicy,
    resolved: OnceLock<ResolvedBuild>,
}

impl Resolver {
    /// Creates a resolver for `query` against the archive at `base_url`.
    ///
    /// Try builds are looked up with an [`ArchiveRevisionLookup`] unless
    /// [`with_revision_lookup`](Self::with_revision_lookup) replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when `base_url` cannot be a base.
    pub fn new(
        query: BuildQuery,
        client: HttpClient,
        base_url: &Url,
        retry_policy: RetryPolicy,
    ) -> Result<Self, FetchError> {
        let application_url = application_url(base_url, &query)?;
        let revision_lookup = Arc::new(ArchiveRevisionLookup::new(
            client.clone(),
            application_url.clone(),
        ));
        Ok(Self {
            query,
            client,
            application_url,
            revision_lookup,
            retry_policy,
            resolved: OnceLock::new(),
        })
    }

    /// Replaces the revision lookup used for try builds.
    #[must_use]
    pub fn with_revision_lookup(mut self, revision_lookup: Arc<dyn RevisionLookup>) -> Self {
        self.revision_lookup = revision_lookup;
        self
    }

    #[must_use]
    pub fn query(&self) -> &BuildQuery {
        &self.query
    }

    /// `<base>/<application dir>/`
    #[must_use]
    pub fn application_url(&self) -> &Url {
        &self.application_url
    }

    /// Resolves the query, reusing the first successful result.
    ///
    /// # Errors
    ///
    /// Returns the last lookup failure once the retry policy gives up; an
    /// exhausted HTTP 404 is reported as [`FetchError::NotFound`].
    #[instrument(skip(self), fields(variant = %self.query.kind()))]
    pub async fn resolve(&self) -> Result<&ResolvedBuild, FetchError> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved);
        }

        let resolved = self
            .retry_policy
            .run("resolve", || self.resolve_once())
            .await?;
        info!(url = %resolved.final_url, file = %resolved.local_filename, "resolved build");
        Ok(self.resolved.get_or_init(|| resolved))
    }

    async fn resolve_once(&self) -> Result<ResolvedBuild, FetchError> {
        let ctx = ResolveContext::new(
            &self.client,
            &self.application_url,
            self.revision_lookup.as_ref(),
        );
        let strategy = strategy_for(&self.query);
        let location = strategy.locate(&ctx).await?;

        if let Some(artifact) = &location.artifact {
            let binary = strategy.local_filename(&location, "");
            return Ok(ResolvedBuild {
                remote_directory_url: location.directory.clone(),
                binary_filename: binary.clone(),
                final_url: artifact.clone(),
                local_filename: binary,
                unsigned_fallback_url: None,
            });
        }

        let pattern = strategy.binary_pattern()?;
        let found = find_binary(&ctx, &location.directory, &pattern).await;
        let (directory, binary, fallback_directory) = match (found, &location.unsigned_directory)
        {
            (Ok(binary), unsigned) => (location.directory.clone(), binary, unsigned.clone()),
            (Err(error), Some(unsigned)) if is_missing(&error) => {
                warn!(
                    directory = %location.directory,
                    error = %error,
                    "signed build not available, trying unsigned"
                );
                let binary = find_binary(&ctx, unsigned, &pattern).await?;
                (unsigned.clone(), binary, None)
            }
            (Err(error), _) => return Err(error),
        };

        let final_url = join_url(&directory, &binary)?;
        let unsigned_fallback_url = fallback_directory
            .map(|unsigned| join_url(&unsigned, &binary))
            .transpose()?;
        let local_filename = strategy.local_filename(&location, &binary);

        Ok(ResolvedBuild {
            remote_directory_url: directory,
            binary_filename: binary,
            final_url,
            local_filename,
            unsigned_fallback_url,
        })
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("query", &self.query)
            .field("application_url", &self.application_url.as_str())
            .field("retry_policy", &self.retry_policy)
            .field("resolved", &self.resolved.get())
            .finish_non_exhaustive()
    }
}

fn application_url(base_url: &Url, query: &BuildQuery) -> Result<Url, FetchError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    join_url(&base, &format!("{}/", query.application().archive_directory()))
}

/// First listed entry of `directory` matching `pattern`.
async fn find_binary(
    ctx: &ResolveContext<'_>,
    directory: &Url,
    pattern: &Regex,
) -> Result<String, FetchError> {
    let listing = ctx.list(directory).await?;
    if listing.is_empty() {
        return Err(FetchError::not_found("No entries found", directory.as_str()));
    }
    listing
        .entries()
        .iter()
        .find(|entry| pattern.is_match(entry))
        .cloned()
        .ok_or_else(|| FetchError::not_found("Binary not found in folder", directory.as_str()))
}

fn is_missing(error: &FetchError) -> bool {
    error.is_not_found() || error.http_status_code() == Some(404)
}
