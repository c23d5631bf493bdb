pub mod cli;
pub mod commands;
pub mod config;
pub mod feedback;
pub mod render;
pub mod transport;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        page = %cli.page,
        "starting readlog CLI"
    );

    let config_path = config::resolve_config_path(
        cli.config.as_deref(),
        std::env::var_os(config::CONFIG_ENV),
        dirs::config_dir(),
    );
    debug!(config = ?config_path, "resolved config path");

    let cfg = config::load(config_path.as_deref(), cli.config_overrides())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(commands::dispatch(&cfg, &cli))?;

    info!("done");
    Ok(())
}
