mod cli;
mod commands;
mod logging;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use reviewqa::config::{Config, ConfigError, DEFAULT_LOG_FILE};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref());
    logging::init(&log_file_for(&config))?;
    let config = config.inspect_err(|e| tracing::error!("Failed to load config: {e}"))?;

    let mut stdout = std::io::stdout();
    let result = run(cli.command, &config, &mut stdout).await;
    if let Err(ref e) = result {
        tracing::error!(error = format!("{e:?}"), "command failed");
    }
    result
}

/// The configured log file, or the default one when the config did not load.
fn log_file_for(config: &Result<Config, ConfigError>) -> PathBuf {
    match config {
        Ok(config) => config.log_file.clone(),
        Err(_) => PathBuf::from(DEFAULT_LOG_FILE),
    }
}

async fn run(command: Command, config: &Config, out: &mut dyn Write) -> anyhow::Result<()> {
    match command {
        Command::Index { patterns, rebuild } => {
            commands::index::run_index(config, patterns, rebuild, out).await
        }
        Command::Ask { question } => commands::ask::run_ask(config, &question, out).await,
        Command::Chat { patterns, rebuild } => {
            commands::chat::run_chat(config, patterns, rebuild, out).await
        }
        Command::Logs => {
            write!(out, "{}", logging::read_log(&config.log_file)?)?;
            Ok(())
        }
        Command::Import {
            csv,
            database_url,
            preprocessed_out,
        } => commands::import::run_import(&csv, &database_url, &preprocessed_out, out).await,
    }
}
