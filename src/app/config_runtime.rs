use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use buildfetch_core::download::constants::{CONNECT_TIMEOUT_SECS, NETWORK_TIMEOUT_SECS};
use buildfetch_core::download::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY};
use buildfetch_core::{DEFAULT_BASE_URL, RetryPolicy};
use url::Url;

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Effective settings after layering defaults, the config file and CLI flags.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) base_url: Url,
    pub(crate) destination: PathBuf,
    pub(crate) retry_policy: RetryPolicy,
    pub(crate) timeout: Option<Duration>,
    pub(crate) connect_timeout_secs: u64,
    pub(crate) read_timeout_secs: u64,
    pub(crate) progress: Option<bool>,
}

/// Fills every setting the command line left unset from `file_config`, then
/// from built-in defaults.
pub(crate) fn apply_config_defaults(
    args: &Args,
    file_config: Option<&FileConfig>,
) -> Result<RunSettings> {
    let file_config = file_config.cloned().unwrap_or_default();

    let base_url_raw = args
        .base_url
        .clone()
        .or(file_config.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = Url::parse(&base_url_raw)
        .with_context(|| format!("Invalid base URL '{base_url_raw}'"))?;

    let retry_attempts = args
        .retry_attempts
        .or(file_config.retry_attempts)
        .unwrap_or(DEFAULT_RETRY_ATTEMPTS);
    if retry_attempts > 100 {
        bail!("Invalid effective retry_attempts value: {retry_attempts}. Expected range: 0..=100");
    }
    let retry_delay = args
        .retry_delay
        .or(file_config.retry_delay_secs.map(Duration::from_secs))
        .unwrap_or(DEFAULT_RETRY_DELAY);

    let timeout = args
        .timeout
        .or(file_config.timeout_secs.map(Duration::from_secs));
    if timeout.is_some_and(|limit| limit.is_zero()) {
        bail!("Invalid effective timeout value: 0. Expected a positive number of seconds");
    }

    Ok(RunSettings {
        base_url,
        destination: args
            .destination
            .clone()
            .or(file_config.destination)
            .unwrap_or_else(|| PathBuf::from(".")),
        retry_policy: RetryPolicy::new(retry_attempts, retry_delay),
        timeout,
        connect_timeout_secs: file_config
            .connect_timeout_secs
            .unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: file_config.read_timeout_secs.unwrap_or(NETWORK_TIMEOUT_SECS),
        progress: file_config.progress,
    })
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
