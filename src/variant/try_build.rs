//! Try-server builds under `try-builds/<pusher>-<revision>/try-<platform>/`.

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use super::{BuildLocation, ResolveContext, VariantStrategy, nightly_binary_pattern};
use crate::error::FetchError;
use crate::query::BuildQuery;
use crate::selector::select_build;

/// Strategy for try builds.
#[derive(Debug, Clone, Copy)]
pub struct TryStrategy<'a> {
    query: &'a BuildQuery,
    branch: &'a str,
    revision: &'a str,
    build_number: Option<u32>,
    debug: bool,
}

impl<'a> TryStrategy<'a> {
    #[must_use]
    pub fn new(
        query: &'a BuildQuery,
        branch: &'a str,
        revision: &'a str,
        build_number: Option<u32>,
        debug: bool,
    ) -> Self {
        Self {
            query,
            branch,
            revision,
            build_number,
            debug,
        }
    }
}

#[async_trait]
impl VariantStrategy for TryStrategy<'_> {
    fn name(&self) -> &'static str {
        "try"
    }

    async fn locate(&self, ctx: &ResolveContext<'_>) -> Result<BuildLocation, FetchError> {
        let try_url = ctx.join("try-builds/")?;
        let folders = ctx
            .revision_lookup()
            .query_builds_by_revision(self.query.application(), self.branch, self.revision)
            .await;
        if folders.is_empty() {
            return Err(FetchError::not_found(
                "No builds have been found",
                try_url.as_str(),
            ));
        }

        // One push produces one build per platform, so the first is the default.
        let folder = select_build(folders, Some(self.build_number.unwrap_or(1)), try_url.as_str())?
            .into_selected();
        info!(folder = %folder, revision = %self.revision, "selected try build");

        let debug = if self.debug { "-debug" } else { "" };
        let directory = ctx.join(&format!(
            "try-builds/{folder}/try-{}{debug}/",
            self.query.platform().try_fragment()
        ))?;

        Ok(BuildLocation {
            build_folder: Some(folder),
            ..BuildLocation::in_directory(directory)
        })
    }

    fn binary_pattern(&self) -> Result<Regex, FetchError> {
        nightly_binary_pattern(self.query)
    }

    fn local_filename(&self, _location: &BuildLocation, binary: &str) -> String {
        let debug = if self.debug { "-debug" } else { "" };
        format!("{}{debug}-{binary}", self.revision)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::download::HttpClient;
    use crate::query::{Platform, QueryOptions, VariantKind};
    use crate::revision::StaticRevisionLookup;
    use url::Url;

    fn try_query() -> BuildQuery {
        BuildQuery::new(QueryOptions {
            platform: Some(Platform::Mac),
            kind: VariantKind::Try,
            revision: Some("8fcac92cfcad".to_string()),
            ..QueryOptions::default()
        })
        .unwrap()
    }

    async fn locate(
        folders: Vec<String>,
        build_number: Option<u32>,
    ) -> Result<BuildLocation, FetchError> {
        let query = try_query();
        let strategy = TryStrategy::new(&query, "try", "8fcac92cfcad", build_number, true);
        let client = HttpClient::new();
        let base = Url::parse("https://archive.example/pub/firefox/").unwrap();
        let lookup = StaticRevisionLookup::new(folders);
        strategy
            .locate(&ResolveContext::new(&client, &base, &lookup))
            .await
    }

    #[tokio::test]
    async fn test_first_folder_is_default() {
        let location = locate(
            vec![
                "alice@example.com-8fcac92cfcad".to_string(),
                "bob@example.com-8fcac92cfcad".to_string(),
            ],
            None,
        )
        .await
        .unwrap();
        assert_eq!(
            location.directory.as_str(),
            "https://archive.example/pub/firefox/try-builds/alice@example.com-8fcac92cfcad/try-macosx64-debug/"
        );
    }

    #[tokio::test]
    async fn test_build_number_picks_folder() {
        let location = locate(
            vec!["a-8fcac92cfcad".to_string(), "b-8fcac92cfcad".to_string()],
            Some(2),
        )
        .await
        .unwrap();
        assert_eq!(location.build_folder.as_deref(), Some("b-8fcac92cfcad"));
    }

    #[tokio::test]
    async fn test_no_folders_is_not_found() {
        assert!(matches!(
            locate(Vec::new(), None).await,
            Err(FetchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_local_filename_prefixes_revision() {
        let query = try_query();
        let strategy = TryStrategy::new(&query, "try", "8fcac92cfcad", None, true);
        let location =
            BuildLocation::in_directory(Url::parse("https://archive.example/").unwrap());
        assert_eq!(
            strategy.local_filename(&location, "firefox-25.0a1.en-US.mac.dmg"),
            "8fcac92cfcad-debug-firefox-25.0a1.en-US.mac.dmg"
        );
    }
}
