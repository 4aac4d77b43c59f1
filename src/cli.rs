//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use buildfetch_core::{Application, Platform, VariantKind};

/// Download release, nightly, tinderbox and try builds from the build archive.
///
/// The build is located through the archive's directory listings and saved
/// under a descriptive file name in the destination directory.
#[derive(Parser, Debug)]
#[command(name = "buildfetch")]
#[command(author, about, disable_version_flag = true)]
pub struct Args {
    /// Application to download (firefox, thunderbird, fennec, b2g)
    #[arg(short, long, default_value = "firefox")]
    pub application: Application,

    /// Platform of the build (linux, linux64, mac, mac64, win32, win64); detected when omitted
    #[arg(short, long)]
    pub platform: Option<Platform>,

    /// Locale of the build (default: en-US, or multi for fennec and b2g)
    #[arg(short, long)]
    pub locale: Option<String>,

    /// Build type (release, candidate, daily, tinderbox, try)
    #[arg(short = 't', long = "type", default_value = "release")]
    pub kind: VariantKind,

    /// Version of the release or candidate build
    #[arg(short = 'v', long)]
    pub version: Option<String>,

    /// Date of the build (YYYY-MM-DD), or a Unix timestamp for tinderbox builds
    #[arg(long)]
    pub date: Option<String>,

    /// Build id of a daily build (YYYYMMDDHHMMSS)
    #[arg(long)]
    pub build_id: Option<String>,

    /// 1-based number of the build when several match
    #[arg(long)]
    pub build_number: Option<u32>,

    /// Branch of daily and tinderbox builds
    #[arg(long)]
    pub branch: Option<String>,

    /// Revision of a try build
    #[arg(long, visible_alias = "changeset")]
    pub revision: Option<String>,

    /// File extension of the build (default depends on the platform)
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Download the stub installer (Windows only)
    #[arg(long)]
    pub stub: bool,

    /// Download a debug build (tinderbox and try)
    #[arg(long)]
    pub debug_build: bool,

    /// Never fall back to unsigned candidate builds
    #[arg(long)]
    pub no_unsigned: bool,

    /// Directory or file name to save the build to
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// User name for basic authentication
    #[arg(long)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(long, requires = "username")]
    pub password: Option<String>,

    /// Download budget in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub timeout: Option<Duration>,

    /// Number of attempts for resolution and for the download
    #[arg(long)]
    pub retry_attempts: Option<u32>,

    /// Delay between attempts in seconds
    #[arg(long, value_parser = parse_seconds)]
    pub retry_delay: Option<Duration>,

    /// Download this URL directly instead of locating a build
    #[arg(long)]
    pub url: Option<String>,

    /// Root of the build archive
    #[arg(long)]
    pub base_url: Option<String>,

    /// Checksum manifest to verify the download against
    #[arg(long)]
    pub checksum_url: Option<String>,

    /// Only print the URL of the build
    #[arg(long)]
    pub print_url: bool,

    /// Increase output verbosity (--verbose for debug, twice for trace)
    #[arg(long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(secs).map_err(|_| format!("'{raw}' is not a valid duration"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["buildfetch"]).unwrap();
        assert_eq!(args.application, Application::Firefox);
        assert_eq!(args.kind, VariantKind::Release);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.platform.is_none());
        assert!(args.retry_attempts.is_none());
    }

    #[test]
    fn test_cli_short_version_is_build_version() {
        let args = Args::try_parse_from(["buildfetch", "-v", "21.0"]).unwrap();
        assert_eq!(args.version.as_deref(), Some("21.0"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["buildfetch", "--verbose", "--verbose"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_typed_values() {
        let args = Args::try_parse_from([
            "buildfetch",
            "-a",
            "thunderbird",
            "-p",
            "win64",
            "-t",
            "daily",
            "--build-number",
            "2",
            "--timeout",
            "1.5",
        ])
        .unwrap();
        assert_eq!(args.application, Application::Thunderbird);
        assert_eq!(args.platform, Some(Platform::Win64));
        assert_eq!(args.kind, VariantKind::Daily);
        assert_eq!(args.build_number, Some(2));
        assert_eq!(args.timeout, Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_cli_changeset_alias() {
        let args = Args::try_parse_from(["buildfetch", "-t", "try", "--changeset", "abc"]).unwrap();
        assert_eq!(args.revision.as_deref(), Some("abc"));
    }

    #[test]
    fn test_cli_rejects_unknown_platform() {
        let err = Args::try_parse_from(["buildfetch", "-p", "solaris"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_password_requires_username() {
        let err = Args::try_parse_from(["buildfetch", "--password", "x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_rejects_negative_seconds() {
        assert!(Args::try_parse_from(["buildfetch", "--retry-delay", "-1"]).is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["buildfetch", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
