//! Build queries: what the caller wants, validated once and never mutated.
//!
//! [`QueryOptions`] is the loose, option-heavy input (one field per CLI flag).
//! [`BuildQuery::new`] validates it into an immutable [`BuildQuery`] whose
//! [`BuildVariant`] carries exactly the fields its build type needs.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use url::Url;

use crate::error::FetchError;

/// Default branch for daily and tinderbox builds.
pub const DEFAULT_BRANCH: &str = "mozilla-central";

/// Branch queried for try builds.
pub const TRY_BRANCH: &str = "try";

const BUILD_ID_FORMAT: &str = "%Y%m%d%H%M%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Applications published on the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Application {
    Firefox,
    Thunderbird,
    Fennec,
    B2g,
}

impl Application {
    /// Name used in binary file names and on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Firefox => "firefox",
            Self::Thunderbird => "thunderbird",
            Self::Fennec => "fennec",
            Self::B2g => "b2g",
        }
    }

    /// Top-level archive directory holding this application's builds.
    #[must_use]
    pub fn archive_directory(self) -> &'static str {
        match self {
            Self::Fennec => "mobile",
            other => other.name(),
        }
    }

    /// Applications whose builds bundle every locale by default.
    #[must_use]
    pub fn is_multi_locale(self) -> bool {
        matches!(self, Self::Fennec | Self::B2g)
    }

    /// Locale used when none is requested.
    #[must_use]
    pub fn default_locale(self) -> &'static str {
        if self.is_multi_locale() {
            "multi"
        } else {
            "en-US"
        }
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Application {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firefox" => Ok(Self::Firefox),
            "thunderbird" => Ok(Self::Thunderbird),
            "fennec" => Ok(Self::Fennec),
            "b2g" => Ok(Self::B2g),
            other => Err(FetchError::invalid_input(
                "application",
                format!("'{other}' is not one of firefox, thunderbird, fennec, b2g"),
            )),
        }
    }
}

/// Target platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Linux64,
    Mac,
    Mac64,
    Win32,
    Win64,
}

impl Platform {
    /// Every supported platform.
    pub const ALL: [Self; 6] = [
        Self::Linux,
        Self::Linux64,
        Self::Mac,
        Self::Mac64,
        Self::Win32,
        Self::Win64,
    ];

    /// Name used on the command line and in local file names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Linux64 => "linux64",
            Self::Mac => "mac",
            Self::Mac64 => "mac64",
            Self::Win32 => "win32",
            Self::Win64 => "win64",
        }
    }

    /// File extension of the installer or archive published for this platform.
    #[must_use]
    pub fn default_extension(self) -> &'static str {
        match self {
            Self::Linux | Self::Linux64 => "tar.bz2",
            Self::Mac | Self::Mac64 => "dmg",
            Self::Win32 | Self::Win64 => "exe",
        }
    }

    #[must_use]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Win32 | Self::Win64)
    }

    #[must_use]
    pub fn is_mac(self) -> bool {
        matches!(self, Self::Mac | Self::Mac64)
    }

    /// Directory name under `releases/` and `candidates/`.
    #[must_use]
    pub fn release_fragment(self) -> &'static str {
        match self {
            Self::Linux => "linux-i686",
            Self::Linux64 => "linux-x86_64",
            Self::Mac | Self::Mac64 => "mac",
            Self::Win32 => "win32",
            Self::Win64 => "win64",
        }
    }

    /// Regex fragment matching the platform part of nightly file names.
    #[must_use]
    pub fn nightly_fragment(self) -> &'static str {
        match self {
            Self::Linux => "linux-i686",
            Self::Linux64 => "linux-x86_64",
            Self::Mac => "mac",
            Self::Mac64 => "mac(64)?",
            Self::Win32 => "win32",
            Self::Win64 => "win64(-x86_64)?",
        }
    }

    /// Platform part of tinderbox build directory names.
    #[must_use]
    pub fn tinderbox_fragment(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Linux64 => "linux64",
            Self::Mac => "macosx",
            Self::Mac64 => "macosx64",
            Self::Win32 => "win32",
            Self::Win64 => "win64",
        }
    }

    /// Platform part of try build directory names.
    #[must_use]
    pub fn try_fragment(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Linux64 => "linux64",
            Self::Mac | Self::Mac64 => "macosx64",
            Self::Win32 => "win32",
            Self::Win64 => "win64",
        }
    }

    /// Platform of the running host, if it is one the archive publishes.
    #[must_use]
    pub fn detect() -> Option<Self> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn from_os_arch(os: &str, arch: &str) -> Option<Self> {
        let is_64_bit = matches!(arch, "x86_64" | "aarch64");
        match os {
            "linux" if is_64_bit => Some(Self::Linux64),
            "linux" => Some(Self::Linux),
            "macos" => Some(Self::Mac),
            "windows" if is_64_bit => Some(Self::Win64),
            "windows" => Some(Self::Win32),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|platform| platform.as_str() == wanted)
            .ok_or_else(|| {
                FetchError::invalid_input(
                    "platform",
                    format!("'{wanted}' is not one of linux, linux64, mac, mac64, win32, win64"),
                )
            })
    }
}

/// Build acquisition modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariantKind {
    #[default]
    Release,
    Candidate,
    Daily,
    Tinderbox,
    Try,
    Direct,
}

impl VariantKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Candidate => "candidate",
            Self::Daily => "daily",
            Self::Tinderbox => "tinderbox",
            Self::Try => "try",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VariantKind {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "release" => Ok(Self::Release),
            "candidate" => Ok(Self::Candidate),
            "daily" => Ok(Self::Daily),
            "tinderbox" => Ok(Self::Tinderbox),
            "try" => Ok(Self::Try),
            "direct" => Ok(Self::Direct),
            other => Err(FetchError::invalid_input(
                "type",
                format!(
                    "'{other}' is not one of release, candidate, daily, tinderbox, try, direct"
                ),
            )),
        }
    }
}

/// How a daily build is pinned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailySelector {
    /// Exact build id: date and time of the build.
    BuildId(NaiveDateTime),
    /// Any build of that day.
    Date(NaiveDate),
    /// Whatever the branch's latest status file points at.
    Latest,
}

/// How a tinderbox build is pinned down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TinderboxSelector {
    /// Exact timestamp folder name.
    Timestamp(String),
    /// Any build of that day, in Pacific time.
    Date(NaiveDate),
    /// Newest listed build.
    Latest,
}

/// Variant-specific part of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildVariant {
    Release {
        version: String,
    },
    Candidate {
        version: String,
        build_number: Option<u32>,
        allow_unsigned: bool,
    },
    Daily {
        branch: String,
        selector: DailySelector,
        build_number: Option<u32>,
    },
    Tinderbox {
        branch: String,
        selector: TinderboxSelector,
        build_number: Option<u32>,
        debug: bool,
    },
    Try {
        branch: String,
        revision: String,
        build_number: Option<u32>,
        debug: bool,
    },
    Direct {
        url: Url,
    },
}

impl BuildVariant {
    #[must_use]
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::Release { .. } => VariantKind::Release,
            Self::Candidate { .. } => VariantKind::Candidate,
            Self::Daily { .. } => VariantKind::Daily,
            Self::Tinderbox { .. } => VariantKind::Tinderbox,
            Self::Try { .. } => VariantKind::Try,
            Self::Direct { .. } => VariantKind::Direct,
        }
    }
}

/// Loose query input, one field per command-line flag.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub application: Option<Application>,
    pub platform: Option<Platform>,
    pub locale: Option<String>,
    pub kind: VariantKind,
    pub version: Option<String>,
    pub date: Option<String>,
    pub build_id: Option<String>,
    pub build_number: Option<u32>,
    pub branch: Option<String>,
    pub revision: Option<String>,
    pub extension: Option<String>,
    pub stub_installer: bool,
    pub debug_build: bool,
    pub no_unsigned: bool,
    /// Literal artifact URL; forces a direct download.
    pub url: Option<String>,
}

/// A validated, immutable description of the build to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildQuery {
    application: Application,
    platform: Platform,
    locale: String,
    extension: String,
    stub_installer: bool,
    variant: BuildVariant,
}

impl BuildQuery {
    /// Validates `options` into a query.
    ///
    /// # Errors
    ///
    /// - [`FetchError::NotSupported`] for application/build type combinations
    ///   the archive does not publish
    /// - [`FetchError::MissingField`] when the build type needs a version or revision
    /// - [`FetchError::InvalidInput`] for malformed dates, build ids and URLs,
    ///   or when the platform cannot be detected
    pub fn new(options: QueryOptions) -> Result<Self, FetchError> {
        let application = options.application.unwrap_or(Application::Firefox);
        let kind = if options.url.is_some() {
            VariantKind::Direct
        } else {
            options.kind
        };
        check_supported(application, kind)?;

        let platform = match options.platform {
            Some(platform) => platform,
            None => Platform::detect().ok_or_else(|| {
                FetchError::invalid_input(
                    "platform",
                    "the host platform could not be detected; pass it explicitly",
                )
            })?,
        };

        let locale = options
            .locale
            .as_deref()
            .filter(|locale| !locale.trim().is_empty())
            .map_or_else(|| application.default_locale().to_string(), str::to_string);

        let extension = match options
            .extension
            .as_deref()
            .filter(|ext| !ext.trim().is_empty())
        {
            Some(ext) => ext.trim_start_matches('.').to_string(),
            None if application.is_multi_locale() && platform.is_windows() => "zip".to_string(),
            None => platform.default_extension().to_string(),
        };

        let stub_installer = options.stub_installer && platform.is_windows();
        let variant = build_variant(kind, options)?;

        Ok(Self {
            application,
            platform,
            locale,
            extension,
            stub_installer,
            variant,
        })
    }

    #[must_use]
    pub fn application(&self) -> Application {
        self.application
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether the stub installer is requested (Windows only).
    #[must_use]
    pub fn stub_installer(&self) -> bool {
        self.stub_installer
    }

    #[must_use]
    pub fn variant(&self) -> &BuildVariant {
        &self.variant
    }

    #[must_use]
    pub fn kind(&self) -> VariantKind {
        self.variant.kind()
    }

    /// Localized builds other than the default/multi locale.
    #[must_use]
    pub fn is_locale_build(&self) -> bool {
        self.locale != "en-US" && self.locale != "multi"
    }
}

fn check_supported(application: Application, kind: VariantKind) -> Result<(), FetchError> {
    let unsupported = match application {
        Application::B2g => matches!(kind, VariantKind::Release | VariantKind::Candidate),
        Application::Fennec => !matches!(kind, VariantKind::Daily | VariantKind::Direct),
        Application::Firefox | Application::Thunderbird => false,
    };
    if unsupported {
        return Err(FetchError::not_supported(format!(
            "{kind} build is not yet supported for {application}"
        )));
    }
    Ok(())
}

fn build_variant(kind: VariantKind, options: QueryOptions) -> Result<BuildVariant, FetchError> {
    let branch = options
        .branch
        .clone()
        .filter(|branch| !branch.trim().is_empty());

    match kind {
        VariantKind::Release => Ok(BuildVariant::Release {
            version: require(options.version, "version", kind)?,
        }),
        VariantKind::Candidate => Ok(BuildVariant::Candidate {
            version: require(options.version, "version", kind)?,
            build_number: options.build_number,
            allow_unsigned: !options.no_unsigned,
        }),
        VariantKind::Daily => {
            let selector = match (options.build_id.as_deref(), options.date.as_deref()) {
                (Some(build_id), _) => DailySelector::BuildId(parse_build_id(build_id)?),
                (None, Some(date)) => DailySelector::Date(parse_date(date)?),
                (None, None) => DailySelector::Latest,
            };
            Ok(BuildVariant::Daily {
                branch: branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                selector,
                build_number: options.build_number,
            })
        }
        VariantKind::Tinderbox => {
            let selector = match options.date.as_deref().map(str::trim) {
                Some(value) if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) => {
                    TinderboxSelector::Timestamp(value.to_string())
                }
                Some(value) => TinderboxSelector::Date(parse_date(value)?),
                None => TinderboxSelector::Latest,
            };
            Ok(BuildVariant::Tinderbox {
                branch: branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
                selector,
                build_number: options.build_number,
                debug: options.debug_build,
            })
        }
        VariantKind::Try => Ok(BuildVariant::Try {
            branch: branch.unwrap_or_else(|| TRY_BRANCH.to_string()),
            revision: require(options.revision, "revision", kind)?,
            build_number: options.build_number,
            debug: options.debug_build,
        }),
        VariantKind::Direct => {
            let raw = require(options.url, "url", kind)?;
            let url = Url::parse(raw.trim()).map_err(|_| FetchError::invalid_url(raw.clone()))?;
            Ok(BuildVariant::Direct { url })
        }
    }
}

fn require(
    value: Option<String>,
    field: &'static str,
    kind: VariantKind,
) -> Result<String, FetchError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(FetchError::MissingField {
            field,
            variant: kind.name(),
        })
}

/// Parses a `YYYYMMDDHHMMSS` build id.
///
/// # Errors
///
/// Returns [`FetchError::InvalidInput`] when the value does not match the format.
pub fn parse_build_id(value: &str) -> Result<NaiveDateTime, FetchError> {
    let trimmed = value.trim();
    if trimmed.len() != 14 {
        return Err(FetchError::invalid_input(
            "build-id",
            format!("'{trimmed}' is not a valid build id (expected YYYYMMDDHHMMSS)"),
        ));
    }
    NaiveDateTime::parse_from_str(trimmed, BUILD_ID_FORMAT).map_err(|_| {
        FetchError::invalid_input(
            "build-id",
            format!("'{trimmed}' is not a valid build id (expected YYYYMMDDHHMMSS)"),
        )
    })
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`FetchError::InvalidInput`] when the value does not match the format.
pub fn parse_date(value: &str) -> Result<NaiveDate, FetchError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| {
        FetchError::invalid_input(
            "date",
            format!("'{trimmed}' is not a valid date (expected YYYY-MM-DD)"),
        )
    })
}
