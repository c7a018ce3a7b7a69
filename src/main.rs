mod catalog;
mod cli;
mod config;
mod error;
mod launch_options;
mod logging;
mod profiles;
mod schema;
mod settings;
mod software;
mod validation;

use anyhow::Result;
use clap::Parser;

use crate::config::AppConfig;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    config.ensure_directories()?;

    let log_file = if cli.no_log_file {
        None
    } else if let Some(path) = &cli.log_file {
        Some(path.clone())
    } else if config.logging.log_to_file {
        Some(config.paths.log_file.clone())
    } else {
        None
    };
    logging::init_logging(&config.logging.level, cli.debug, log_file.as_deref())?;

    cli.execute(&config)
}
