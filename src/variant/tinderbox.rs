//! Tinderbox (per-push CI) builds under `tinderbox-builds/<branch>-<platform>/`.

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use super::timezone::pacific_date;
use super::{BuildLocation, ResolveContext, VariantStrategy, join_url, nightly_binary_pattern};
use crate::error::FetchError;
use crate::query::{BuildQuery, TinderboxSelector};
use crate::selector::select_build;

/// Strategy for tinderbox builds.
#[derive(Debug, Clone, Copy)]
pub struct TinderboxStrategy<'a> {
    query: &'a BuildQuery,
    branch: &'a str,
    selector: &'a TinderboxSelector,
    build_number: Option<u32>,
    debug: bool,
}

impl<'a> TinderboxStrategy<'a> {
    #[must_use]
    pub fn new(
        query: &'a BuildQuery,
        branch: &'a str,
        selector: &'a TinderboxSelector,
        build_number: Option<u32>,
        debug: bool,
    ) -> Self {
        Self {
            query,
            branch,
            selector,
            build_number,
            debug,
        }
    }

    fn branch_directory(&self) -> String {
        let l10n = if self.query.is_locale_build() { "-l10n" } else { "" };
        let debug = if self.debug { "-debug" } else { "" };
        format!(
            "tinderbox-builds/{}-{}{l10n}{debug}/",
            self.branch,
            self.query.platform().tinderbox_fragment()
        )
    }

    fn explicit_timestamp(&self) -> Option<&str> {
        match self.selector {
            TinderboxSelector::Timestamp(timestamp) => Some(timestamp),
            TinderboxSelector::Date(_) | TinderboxSelector::Latest => None,
        }
    }
}

#[async_trait]
impl VariantStrategy for TinderboxStrategy<'_> {
    fn name(&self) -> &'static str {
        "tinderbox"
    }

    async fn locate(&self, ctx: &ResolveContext<'_>) -> Result<BuildLocation, FetchError> {
        let branch_url = ctx.join(&self.branch_directory())?;
        let timestamp = self.explicit_timestamp().map(str::to_string);

        // Localized repacks are not split into timestamp folders.
        if self.query.is_locale_build() {
            return Ok(BuildLocation {
                timestamp,
                ..BuildLocation::in_directory(branch_url)
            });
        }

        let listing = ctx.list(&branch_url).await?.filter_regex(r"\d+$")?;
        let builds = match self.selector {
            TinderboxSelector::Timestamp(wanted) => {
                listing.filter(|entry| entry == wanted.as_str())
            }
            TinderboxSelector::Date(date) => listing.filter(|entry| {
                entry
                    .parse::<i64>()
                    .ok()
                    .and_then(pacific_date)
                    .is_some_and(|day| day == *date)
            }),
            TinderboxSelector::Latest => listing,
        };

        if builds.is_empty() {
            return Err(FetchError::not_found(
                "No builds have been found",
                branch_url.as_str(),
            ));
        }
        info!(builds = ?builds.entries(), "found tinderbox builds");

        let folder = select_build(builds.into_entries(), self.build_number, branch_url.as_str())?
            .into_selected();
        let directory = join_url(&branch_url, &format!("{folder}/"))?;

        Ok(BuildLocation {
            build_folder: Some(folder),
            timestamp,
            ..BuildLocation::in_directory(directory)
        })
    }

    fn binary_pattern(&self) -> Result<Regex, FetchError> {
        nightly_binary_pattern(self.query)
    }

    fn local_filename(&self, location: &BuildLocation, binary: &str) -> String {
        let prefix = location
            .timestamp
            .as_deref()
            .map(|timestamp| format!("{timestamp}-"))
            .unwrap_or_default();
        let debug = if self.debug { "-debug" } else { "" };
        format!("{prefix}{}{debug}-{binary}", self.branch)
    }
}
