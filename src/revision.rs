//! Revision lookup for try builds.
//!
//! Try builds are stored under a folder named after the pusher and the pushed
//! revision. [`RevisionLookup`] maps a revision to those folder names; the
//! default [`ArchiveRevisionLookup`] finds them by listing `try-builds/`.

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::download::HttpClient;
use crate::listing::DirectoryListing;
use crate::query::Application;

/// Maps a revision to the archive folders holding its builds.
///
/// Implementations never fail: lookup problems are logged and reported as an
/// empty result, which callers turn into a not-found error.
#[async_trait]
pub trait RevisionLookup: Send + Sync {
    /// Returns build folder names for `revision`, in preference order.
    async fn query_builds_by_revision(
        &self,
        application: Application,
        branch: &str,
        revision: &str,
    ) -> Vec<String>;
}

/// Looks revisions up in the `try-builds/` listing of an application directory.
#[derive(Debug, Clone)]
pub struct ArchiveRevisionLookup {
    client: HttpClient,
    application_url: Url,
}

impl ArchiveRevisionLookup {
    /// Creates a lookup rooted at `application_url` (`<base>/<application dir>/`).
    #[must_use]
    pub fn new(client: HttpClient, application_url: Url) -> Self {
        Self {
            client,
            application_url,
        }
    }
}

#[async_trait]
impl RevisionLookup for ArchiveRevisionLookup {
    /// Folders in `try-builds/` are named after the revision alone, so the
    /// application and branch do not narrow the lookup.
    #[tracing::instrument(skip(self, _application, _branch), fields(lookup = "archive"))]
    async fn query_builds_by_revision(
        &self,
        _application: Application,
        _branch: &str,
        revision: &str,
    ) -> Vec<String> {
        let url = match self.application_url.join("try-builds/") {
            Ok(url) => url,
            Err(error) => {
                warn!(error = %error, "cannot build try-builds URL");
                return Vec::new();
            }
        };

        let listing = match DirectoryListing::fetch(&self.client, &url).await {
            Ok(listing) => listing,
            Err(error) => {
                warn!(url = %url, error = %error, "revision lookup failed");
                return Vec::new();
            }
        };

        let suffix = format!("-{}", revision.to_ascii_lowercase());
        let folders = listing
            .filter(|entry| entry.to_ascii_lowercase().ends_with(&suffix))
            .into_entries();
        debug!(count = folders.len(), "try build folders found");
        folders
    }
}

/// Fixed answers, for tests and offline use.
#[derive(Debug, Clone, Default)]
pub struct StaticRevisionLookup {
    folders: Vec<String>,
}

impl StaticRevisionLookup {
    #[must_use]
    pub fn new(folders: Vec<String>) -> Self {
        Self { folders }
    }
}

#[async_trait]
impl RevisionLookup for StaticRevisionLookup {
    async fn query_builds_by_revision(
        &self,
        _application: Application,
        _branch: &str,
        _revision: &str,
    ) -> Vec<String> {
        self.folders.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, ResponseTemplate};

    #[tokio::test]
    async fn test_archive_lookup_filters_by_revision_suffix() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .and(path("/pub/firefox/try-builds/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="alice@example.com-8fcac92cfcad/">alice@example.com-8fcac92cfcad/</a>
                   <a href="bob@example.com-0000aaaa1111/">bob@example.com-0000aaaa1111/</a>"#,
            ))
            .mount(&mock_server)
            .await;

        let lookup = ArchiveRevisionLookup::new(
            HttpClient::new(),
            Url::parse(&format!("{}/pub/firefox/", mock_server.uri())).unwrap(),
        );
        let folders = lookup
            .query_builds_by_revision(Application::Firefox, "try", "8FCAC92CFCAD")
            .await;
        assert_eq!(folders, ["alice@example.com-8fcac92cfcad"]);

        let other_branch = lookup
            .query_builds_by_revision(Application::Thunderbird, "comm-central", "8fcac92cfcad")
            .await;
        assert_eq!(other_branch, folders);
    }

    #[tokio::test]
    async fn test_archive_lookup_failure_is_empty_result() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let lookup = ArchiveRevisionLookup::new(
            HttpClient::new(),
            Url::parse(&format!("{}/pub/firefox/", mock_server.uri())).unwrap(),
        );
        assert!(
            lookup
                .query_builds_by_revision(Application::Firefox, "try", "abc")
                .await
                .is_empty()
        );
    }
}
