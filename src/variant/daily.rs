//! Daily (nightly) builds under `nightly/<YYYY>/<MM>/<folder>/`.
//!
//! Folders are named `<YYYY>-<MM>-<DD>-<HH>-<MM>-<SS>-<branch>[-l10n]`. A
//! folder only counts as a build when its own listing holds a binary for the
//! requested platform and locale.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use tracing::{debug, info, instrument};
use url::Url;

use super::{BuildLocation, ResolveContext, VariantStrategy, join_url, nightly_binary_pattern};
use crate::error::FetchError;
use crate::listing::anchored_regex;
use crate::query::{BuildQuery, DailySelector, parse_build_id};
use crate::selector::select_build;

/// Strategy for daily builds.
#[derive(Debug, Clone, Copy)]
pub struct DailyStrategy<'a> {
    query: &'a BuildQuery,
    branch: &'a str,
    selector: DailySelector,
    build_number: Option<u32>,
}

impl<'a> DailyStrategy<'a> {
    #[must_use]
    pub fn new(
        query: &'a BuildQuery,
        branch: &'a str,
        selector: DailySelector,
        build_number: Option<u32>,
    ) -> Self {
        Self {
            query,
            branch,
            selector,
            build_number,
        }
    }

    /// Reads the build id of the branch's latest build from its status file.
    #[instrument(skip(self, ctx), fields(branch = %self.branch))]
    async fn latest_build_id(
        &self,
        ctx: &ResolveContext<'_>,
    ) -> Result<NaiveDateTime, FetchError> {
        let latest_url = ctx.join(&format!("nightly/latest-{}/", self.branch))?;
        let status_files = ctx.list(&latest_url).await?.filter_regex(&format!(
            r".*{}\.txt$",
            self.query.platform().nightly_fragment()
        ))?;

        let Some(status_file) = status_files.entries().last() else {
            return Err(FetchError::not_found(
                "Unable to retrieve the latest build id",
                latest_url.as_str(),
            ));
        };

        let status_url = join_url(&latest_url, status_file)?;
        let text = ctx.client().get_fresh_text(status_url.as_str()).await?;
        let build_id = text.lines().next().unwrap_or_default();
        debug!(build_id = %build_id.trim(), "latest build id");
        parse_build_id(build_id)
    }

    /// Path below a monthly folder that holds the binaries.
    fn build_path(&self, folder: &str) -> String {
        if self.query.application().is_multi_locale() && self.query.locale() != "multi" {
            format!("{folder}/{}/", self.query.locale())
        } else {
            format!("{folder}/")
        }
    }

    async fn has_binary(
        &self,
        ctx: &ResolveContext<'_>,
        monthly_url: &Url,
        folder: &str,
        pattern: &Regex,
    ) -> Result<bool, FetchError> {
        let url = join_url(monthly_url, &self.build_path(folder))?;
        match ctx.list(&url).await {
            Ok(listing) => Ok(listing.entries().iter().any(|entry| pattern.is_match(entry))),
            Err(error) if error.http_status_code() == Some(404) => {
                debug!(folder = %folder, "build folder cannot be listed");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }
}

#[async_trait]
impl VariantStrategy for DailyStrategy<'_> {
    fn name(&self) -> &'static str {
        "daily"
    }

    async fn locate(&self, ctx: &ResolveContext<'_>) -> Result<BuildLocation, FetchError> {
        let (date, time): (NaiveDate, Option<NaiveTime>) = match self.selector {
            DailySelector::BuildId(stamp) => (stamp.date(), Some(stamp.time())),
            DailySelector::Date(date) => (date, None),
            DailySelector::Latest => {
                let stamp = self.latest_build_id(ctx).await?;
                (stamp.date(), Some(stamp.time()))
            }
        };

        let monthly_url = ctx.join(&format!("nightly/{}/", date.format("%Y/%m")))?;
        let not_found = || {
            FetchError::not_found(
                format!("Folder for builds on {date} has not been found"),
                monthly_url.as_str(),
            )
        };

        let l10n = if self.query.is_locale_build() {
            "(-l10n)?"
        } else {
            ""
        };
        let folders = ctx.list(&monthly_url).await?.filter_regex(&format!(
            r"{}-(\d+-)+{}{l10n}$",
            date.format("%Y-%m-%d"),
            regex::escape(self.branch)
        ))?;

        let pattern = self.binary_pattern()?;
        let mut builds = Vec::new();
        for folder in folders.entries() {
            if self.has_binary(ctx, &monthly_url, folder, &pattern).await? {
                builds.push(folder.clone());
            }
        }

        if let Some(time) = time {
            let stamp = time.format("%H-%M-%S").to_string();
            builds.retain(|folder| folder.contains(&stamp));
        }

        if builds.is_empty() {
            return Err(not_found());
        }
        info!(builds = ?builds, "found daily builds");

        let folder =
            select_build(builds, self.build_number, monthly_url.as_str())?.into_selected();
        let directory = join_url(&monthly_url, &self.build_path(&folder))?;
        let timestamp =
            folder_timestamp(&folder).unwrap_or_else(|| date.format("%Y-%m-%d").to_string());

        Ok(BuildLocation {
            build_folder: Some(folder),
            timestamp: Some(timestamp),
            ..BuildLocation::in_directory(directory)
        })
    }

    fn binary_pattern(&self) -> Result<Regex, FetchError> {
        nightly_binary_pattern(self.query)
    }

    fn local_filename(&self, location: &BuildLocation, binary: &str) -> String {
        match &location.timestamp {
            Some(timestamp) => format!("{timestamp}-{}-{binary}", self.branch),
            None => format!("{}-{binary}", self.branch),
        }
    }
}

/// Leading `[\d-]+` token of a folder name, without its trailing dash.
fn folder_timestamp(folder: &str) -> Option<String> {
    let regex = anchored_regex(r"([\d\-]+)-\D.*").ok()?;
    regex
        .captures(folder)
        .and_then(|captures| captures.get(1))
        .map(|token| token.as_str().to_string())
}
