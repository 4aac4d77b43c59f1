//! Direct downloads of a literal URL.

use async_trait::async_trait;
use regex::Regex;
use url::Url;

use super::{BuildLocation, ResolveContext, VariantStrategy, join_url};
use crate::error::FetchError;

/// Strategy for a caller-supplied artifact URL. No listing is involved.
#[derive(Debug, Clone, Copy)]
pub struct DirectStrategy<'a> {
    url: &'a Url,
}

impl<'a> DirectStrategy<'a> {
    #[must_use]
    pub fn new(url: &'a Url) -> Self {
        Self { url }
    }
}

#[async_trait]
impl VariantStrategy for DirectStrategy<'_> {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn locate(&self, _ctx: &ResolveContext<'_>) -> Result<BuildLocation, FetchError> {
        Ok(BuildLocation {
            artifact: Some(self.url.clone()),
            ..BuildLocation::in_directory(join_url(self.url, "./")?)
        })
    }

    fn binary_pattern(&self) -> Result<Regex, FetchError> {
        Err(FetchError::NotImplemented {
            variant: "direct",
            capability: "binary pattern lookup",
        })
    }

    fn local_filename(&self, _location: &BuildLocation, _binary: &str) -> String {
        direct_filename(self.url)
    }
}

/// Last path segment of `url`, or its host when the path is empty.
pub(crate) fn direct_filename(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .or_else(|| url.host_str())
        .unwrap_or_default()
        .to_string()
}
