//! Release builds: `releases/<version>/<platform>/<locale>/`.

use async_trait::async_trait;
use regex::Regex;

use super::{
    BuildLocation, ResolveContext, VariantStrategy, release_binary_pattern, release_filename,
};
use crate::error::FetchError;
use crate::query::BuildQuery;

/// Strategy for shipped releases.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseStrategy<'a> {
    query: &'a BuildQuery,
    version: &'a str,
}

impl<'a> ReleaseStrategy<'a> {
    #[must_use]
    pub fn new(query: &'a BuildQuery, version: &'a str) -> Self {
        Self { query, version }
    }
}

#[async_trait]
impl VariantStrategy for ReleaseStrategy<'_> {
    fn name(&self) -> &'static str {
        "release"
    }

    async fn locate(&self, ctx: &ResolveContext<'_>) -> Result<BuildLocation, FetchError> {
        let directory = ctx.join(&format!(
            "releases/{}/{}/{}/",
            self.version,
            self.query.platform().release_fragment(),
            self.query.locale()
        ))?;
        Ok(BuildLocation::in_directory(directory))
    }

    fn binary_pattern(&self) -> Result<Regex, FetchError> {
        release_binary_pattern(self.query, self.version)
    }

    fn local_filename(&self, _location: &BuildLocation, _binary: &str) -> String {
        release_filename(self.query, self.version, None)
    }
}
