//! Per-build-type location strategies.
//!
//! Each [`BuildVariant`] has a strategy implementing [`VariantStrategy`]:
//! where its builds live on the archive, what the binary is called, and how
//! the downloaded file is named locally. Dispatch is a `match` in
//! [`strategy_for`]; the strategies borrow the query and hold no state.

mod candidate;
mod daily;
mod direct;
mod release;
mod timezone;
mod tinderbox;
mod try_build;

pub use candidate::CandidateStrategy;
pub use daily::DailyStrategy;
pub use direct::DirectStrategy;
pub use release::ReleaseStrategy;
pub use tinderbox::TinderboxStrategy;
pub use try_build::TryStrategy;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use url::Url;

use crate::download::HttpClient;
use crate::error::FetchError;
use crate::listing::DirectoryListing;
use crate::query::{BuildQuery, BuildVariant};
use crate::revision::RevisionLookup;

/// Collaborators a strategy may use while locating a build.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    client: &'a HttpClient,
    application_url: &'a Url,
    revision_lookup: &'a dyn RevisionLookup,
}

impl<'a> ResolveContext<'a> {
    /// `application_url` is `<base>/<application dir>/`, with a trailing slash.
    #[must_use]
    pub fn new(
        client: &'a HttpClient,
        application_url: &'a Url,
        revision_lookup: &'a dyn RevisionLookup,
    ) -> Self {
        Self {
            client,
            application_url,
            revision_lookup,
        }
    }

    #[must_use]
    pub fn client(&self) -> &'a HttpClient {
        self.client
    }

    #[must_use]
    pub fn application_url(&self) -> &'a Url {
        self.application_url
    }

    #[must_use]
    pub fn revision_lookup(&self) -> &'a dyn RevisionLookup {
        self.revision_lookup
    }

    /// Joins `path` onto the application URL, percent-encoding as needed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] when the result is not a valid URL.
    pub fn join(&self, path: &str) -> Result<Url, FetchError> {
        join_url(self.application_url, path)
    }

    /// Fetches the listing at `url`.
    ///
    /// # Errors
    ///
    /// See [`DirectoryListing::fetch`].
    pub async fn list(&self, url: &Url) -> Result<DirectoryListing, FetchError> {
        DirectoryListing::fetch(self.client, url).await
    }
}

impl std::fmt::Debug for ResolveContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolveContext")
            .field("application_url", &self.application_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Where a build lives, before its binary has been picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLocation {
    /// Directory whose listing holds the binary.
    pub directory: Url,
    /// Folder chosen from a listing, when the build type selects one.
    pub build_folder: Option<String>,
    /// Timestamp prefix for the local file name.
    pub timestamp: Option<String>,
    /// Unsigned sibling of `directory` (candidate builds only).
    pub unsigned_directory: Option<Url>,
    /// Exact artifact URL when no binary lookup is needed.
    pub artifact: Option<Url>,
}

impl BuildLocation {
    /// Location of a directory with no selected folder.
    #[must_use]
    pub fn in_directory(directory: Url) -> Self {
        Self {
            directory,
            build_folder: None,
            timestamp: None,
            unsigned_directory: None,
            artifact: None,
        }
    }
}

/// Locates builds of one type.
#[async_trait]
pub trait VariantStrategy: Send + Sync {
    /// Build type name for logs and errors.
    fn name(&self) -> &'static str;

    /// Finds the directory holding the requested build.
    async fn locate(&self, ctx: &ResolveContext<'_>) -> Result<BuildLocation, FetchError>;

    /// Regex a directory entry must match to be the requested binary.
    fn binary_pattern(&self) -> Result<Regex, FetchError>;

    /// Local file name for `binary` found at `location`. Pure.
    fn local_filename(&self, location: &BuildLocation, binary: &str) -> String;
}

/// Returns the strategy for the query's build type.
#[must_use]
pub fn strategy_for(query: &BuildQuery) -> Box<dyn VariantStrategy + '_> {
    match query.variant() {
        BuildVariant::Release { version } => Box::new(ReleaseStrategy::new(query, version)),
        BuildVariant::Candidate {
            version,
            build_number,
            allow_unsigned,
        } => Box::new(CandidateStrategy::new(
            query,
            version,
            *build_number,
            *allow_unsigned,
        )),
        BuildVariant::Daily {
            branch,
            selector,
            build_number,
        } => Box::new(DailyStrategy::new(query, branch, *selector, *build_number)),
        BuildVariant::Tinderbox {
            branch,
            selector,
            build_number,
            debug,
        } => Box::new(TinderboxStrategy::new(
            query,
            branch,
            selector,
            *build_number,
            *debug,
        )),
        BuildVariant::Try {
            branch,
            revision,
            build_number,
            debug,
        } => Box::new(TryStrategy::new(
            query,
            branch,
            revision,
            *build_number,
            *debug,
        )),
        BuildVariant::Direct { url } => Box::new(DirectStrategy::new(url)),
    }
}

pub(crate) fn join_url(base: &Url, path: &str) -> Result<Url, FetchError> {
    base.join(path)
        .map_err(|_| FetchError::invalid_url(format!("{base}{path}")))
}

pub(crate) fn case_insensitive(pattern: &str) -> Result<Regex, FetchError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| FetchError::invalid_input("pattern", e.to_string()))
}

/// Binary pattern shared by nightly-style builds (daily, tinderbox, try).
pub(crate) fn nightly_binary_pattern(query: &BuildQuery) -> Result<Regex, FetchError> {
    let platform = query.platform();
    let extension = regex::escape(query.extension());
    let suffix = if platform.is_windows() {
        let stub = if query.stub_installer() { "-stub" } else { "" };
        format!(r"(\.installer{stub})?\.{extension}$")
    } else {
        format!(r".*\.{extension}$")
    };
    case_insensitive(&format!(
        r"^{}-.*\.{}\.{}{suffix}",
        regex::escape(query.application().name()),
        regex::escape(query.locale()),
        platform.nightly_fragment(),
    ))
}

/// Binary pattern shared by release and candidate builds.
pub(crate) fn release_binary_pattern(
    query: &BuildQuery,
    version: &str,
) -> Result<Regex, FetchError> {
    let platform = query.platform();
    let application = regex::escape(query.application().name());
    let version = regex::escape(version);
    let extension = regex::escape(query.extension());
    let pattern = if platform.is_windows() {
        let (stub, stub_new) = if query.stub_installer() {
            ("Stub ", r"\sInstaller")
        } else {
            ("", "")
        };
        // Without the stub installer there is no bare `<app>.<ext>` alternative.
        if stub_new.is_empty() {
            format!(r"^{application}(?:\sSetup\s|-){stub}{version}\.{extension}$")
        } else {
            format!(r"^{application}({stub_new}|(?:\sSetup\s|-){stub}{version})\.{extension}$")
        }
    } else if platform.is_mac() {
        format!(r"^{application}(?:\s|-){version}\.{extension}$")
    } else {
        format!(r"^{application}-{version}\.{extension}$")
    };
    case_insensitive(&pattern)
}

/// `<app>-<version>[-<build>].<locale>.<platform>[-stub].<ext>`
pub(crate) fn release_filename(query: &BuildQuery, version: &str, build: Option<&str>) -> String {
    let build = build.map(|b| format!("-{b}")).unwrap_or_default();
    let stub = if query.stub_installer() { "-stub" } else { "" };
    format!(
        "{}-{version}{build}.{}.{}{stub}.{}",
        query.application().name(),
        query.locale(),
        query.platform(),
        query.extension(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::query::{Platform, QueryOptions, VariantKind};

    fn query(platform: Platform, kind: VariantKind, stub: bool) -> BuildQuery {
        BuildQuery::new(QueryOptions {
            platform: Some(platform),
            kind,
            version: Some("21.0".to_string()),
            revision: Some("8fcac92cfcad".to_string()),
            stub_installer: stub,
            ..QueryOptions::default()
        })
        .unwrap()
    }

    fn release_pattern(platform: Platform, stub_installer: bool) -> Regex {
        release_binary_pattern(&query(platform, VariantKind::Release, stub_installer), "21.0")
            .unwrap()
    }

    #[test]
    fn test_release_pattern_per_platform_family() {
        let linux = release_pattern(Platform::Linux, false);
        assert!(linux.is_match("firefox-21.0.tar.bz2"));
        assert!(!linux.is_match("firefox-21.0.tar.bz2.asc"));

        let mac = release_pattern(Platform::Mac, false);
        assert!(mac.is_match("Firefox 21.0.dmg"));

        let win = release_pattern(Platform::Win32, false);
        assert!(win.is_match("Firefox Setup 21.0.exe"));
        assert!(!win.is_match("Firefox Setup Stub 21.0.exe"));
    }

    #[test]
    fn test_release_pattern_stub_installer() {
        let win = release_pattern(Platform::Win32, true);
        assert!(win.is_match("Firefox Setup Stub 21.0.exe"));
        assert!(win.is_match("Firefox Installer.exe"));
        assert!(!win.is_match("Firefox Setup 21.0.exe"));
    }

    #[test]
    fn test_nightly_pattern_matches_windows_installer() {
        let pattern =
            nightly_binary_pattern(&query(Platform::Win64, VariantKind::Daily, false)).unwrap();
        assert!(pattern.is_match("firefox-25.0a1.en-US.win64-x86_64.installer.exe"));
        assert!(pattern.is_match("firefox-25.0a1.en-US.win64.installer.exe"));
        assert!(!pattern.is_match("firefox-25.0a1.en-US.win64.installer-stub.exe"));
        assert!(!pattern.is_match("firefox-25.0a1.en-US.win64.zip"));
    }

    #[test]
    fn test_nightly_pattern_matches_linux_archive() {
        let pattern =
            nightly_binary_pattern(&query(Platform::Linux64, VariantKind::Daily, false)).unwrap();
        assert!(pattern.is_match("firefox-25.0a1.en-US.linux-x86_64.tar.bz2"));
        assert!(!pattern.is_match("firefox-25.0a1.en-US.linux-i686.tar.bz2"));
        assert!(!pattern.is_match("firefox-25.0a1.en-US.linux-x86_64.txt"));
    }

    #[test]
    fn test_release_filename_with_build_and_stub() {
        let q = query(Platform::Win32, VariantKind::Candidate, true);
        assert_eq!(
            release_filename(&q, "21.0", Some("build3")),
            "firefox-21.0-build3.en-US.win32-stub.exe"
        );
        let q = query(Platform::Linux, VariantKind::Release, false);
        assert_eq!(release_filename(&q, "21.0", None), "firefox-21.0.en-US.linux.tar.bz2");
    }

    #[test]
    fn test_join_url_percent_encodes() {
        let base = Url::parse("https://archive.example/pub/firefox/").unwrap();
        let joined = join_url(&base, "releases/21.0/mac/en-US/Firefox 21.0.dmg").unwrap();
        assert_eq!(
            joined.as_str(),
            "https://archive.example/pub/firefox/releases/21.0/mac/en-US/Firefox%2021.0.dmg"
        );
    }
}
