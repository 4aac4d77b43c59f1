//! Release candidates: `candidates/<version>-candidates/build<N>/...`.
//!
//! Candidate binaries may still be unsigned; their `unsigned/` sibling
//! directory is carried along so resolution and download can fall back to it.

use async_trait::async_trait;
use regex::Regex;
use tracing::info;

use super::{
    BuildLocation, ResolveContext, VariantStrategy, join_url, release_binary_pattern,
    release_filename,
};
use crate::error::FetchError;
use crate::query::BuildQuery;
use crate::selector::select_build;

/// Strategy for release candidates.
#[derive(Debug, Clone, Copy)]
pub struct CandidateStrategy<'a> {
    query: &'a BuildQuery,
    version: &'a str,
    build_number: Option<u32>,
    allow_unsigned: bool,
}

impl<'a> CandidateStrategy<'a> {
    #[must_use]
    pub fn new(
        query: &'a BuildQuery,
        version: &'a str,
        build_number: Option<u32>,
        allow_unsigned: bool,
    ) -> Self {
        Self {
            query,
            version,
            build_number,
            allow_unsigned,
        }
    }
}

#[async_trait]
impl VariantStrategy for CandidateStrategy<'_> {
    fn name(&self) -> &'static str {
        "candidate"
    }

    async fn locate(&self, ctx: &ResolveContext<'_>) -> Result<BuildLocation, FetchError> {
        let candidates_url = ctx.join(&format!("candidates/{}-candidates/", self.version))?;
        let builds = ctx.list(&candidates_url).await?.filter_regex(r"build\d+$")?;

        let build = match self.build_number {
            Some(number) => {
                let wanted = format!("build{number}");
                if !builds.entries().contains(&wanted) {
                    return Err(FetchError::not_found(
                        format!("Candidate {wanted} has not been found"),
                        candidates_url.as_str(),
                    ));
                }
                wanted
            }
            None => select_build(builds.into_entries(), None, candidates_url.as_str())?
                .into_selected(),
        };
        info!(build = %build, "selected candidate build");

        let platform = self.query.platform().release_fragment();
        let locale = self.query.locale();
        let directory = join_url(&candidates_url, &format!("{build}/{platform}/{locale}/"))?;
        let unsigned_directory = if self.allow_unsigned {
            Some(join_url(
                &candidates_url,
                &format!("{build}/unsigned/{platform}/{locale}/"),
            )?)
        } else {
            None
        };

        Ok(BuildLocation {
            build_folder: Some(build),
            unsigned_directory,
            ..BuildLocation::in_directory(directory)
        })
    }

    fn binary_pattern(&self) -> Result<Regex, FetchError> {
        release_binary_pattern(self.query, self.version)
    }

    fn local_filename(&self, location: &BuildLocation, _binary: &str) -> String {
        release_filename(self.query, self.version, location.build_folder.as_deref())
    }
}
