use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use buildfetch_core::{
    BuildFetcher, BuildQuery, Credentials, DownloadOutcome, FetchOptions, QueryOptions,
};
use tracing::{debug, info};
use url::Url;

use crate::app::{config_runtime, terminal};
use crate::app_config;
use crate::cli::Args;

/// Resolves the requested build and either prints its URL or downloads it.
pub(crate) async fn run_buildfetch(args: Args) -> Result<()> {
    terminal::init_tracing(config_runtime::resolve_default_log_level(&args));
    debug!(?args, "CLI arguments parsed");

    let loaded = app_config::load_default_file_config()?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        debug!(path = %path.display(), "loaded config file");
    }
    let settings = config_runtime::apply_config_defaults(&args, loaded.config.as_ref())?;

    let query = BuildQuery::new(query_options(&args))?;
    info!(
        application = %query.application(),
        platform = %query.platform(),
        kind = %query.kind(),
        "buildfetch starting"
    );

    let checksum_url = args
        .checksum_url
        .as_deref()
        .map(|raw| Url::parse(raw).with_context(|| format!("Invalid checksum URL '{raw}'")))
        .transpose()?;

    let options = FetchOptions {
        base_url: settings.base_url,
        destination: settings.destination,
        credentials: args
            .username
            .clone()
            .map(|username| Credentials::new(username, args.password.clone())),
        retry_policy: settings.retry_policy,
        timeout: settings.timeout,
        connect_timeout_secs: settings.connect_timeout_secs,
        read_timeout_secs: settings.read_timeout_secs,
        show_progress: terminal::should_show_progress(
            io::stderr().is_terminal(),
            args.quiet,
            terminal::is_dumb_terminal(),
            settings.progress,
        ),
        checksum_url,
    };
    let fetcher = BuildFetcher::new(query, options)?;

    if args.print_url {
        let build = fetcher.resolve().await?;
        println!("{}", build.final_url);
        return Ok(());
    }

    let report = fetcher.fetch().await?;
    match &report.outcome {
        DownloadOutcome::AlreadyPresent => {
            info!(path = %report.target.display(), "build already present");
        }
        DownloadOutcome::Downloaded { url, bytes } => {
            info!(url = %url, bytes, verified = report.verified, "download complete");
        }
    }
    println!("{}", report.target.display());
    Ok(())
}

fn query_options(args: &Args) -> QueryOptions {
    QueryOptions {
        application: Some(args.application),
        platform: args.platform,
        locale: args.locale.clone(),
        kind: args.kind,
        version: args.version.clone(),
        date: args.date.clone(),
        build_id: args.build_id.clone(),
        build_number: args.build_number,
        branch: args.branch.clone(),
        revision: args.revision.clone(),
        extension: args.extension.clone(),
        stub_installer: args.stub,
        debug_build: args.debug_build,
        no_unsigned: args.no_unsigned,
        url: args.url.clone(),
    }
}
