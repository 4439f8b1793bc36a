//! contacts CLI
//!
//! Command-line interface for a directory of vCard contacts.

use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use contacts_core::{Config, Query, Store, StoreError};

mod cli;
mod commands;
mod editor;
mod output;

use cli::{Cli, Commands, ConfigCommands};
use output::{Output, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config_path.as_deref();
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(cli.verbose, &config);
    debug!("Using address book {}", config.addressbook.display());

    // Commands that don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, output)
            }
        };
    }

    let mut store = Store::open_with_config(&config);

    match cli.command {
        // Listing everything is the default
        None => commands::contact::list(&mut store, Query::all(), false, output),
        Some(Commands::Add(args)) => commands::contact::add(&mut store, &config, args, output),
        Some(Commands::List { selector, sup }) => {
            commands::contact::list(&mut store, selector.to_query(), sup, output)
        }
        Some(Commands::Show { selector }) => {
            commands::contact::show(&mut store, selector.to_query(), output)
        }
        Some(Commands::Edit { selector }) => {
            commands::contact::edit(&mut store, &config, selector.to_query(), output)
        }
        Some(Commands::Del { selector }) => {
            commands::contact::delete(&mut store, selector.to_query(), output)
        }
        Some(Commands::Categories) => commands::category::list(&mut store, output),
        Some(Commands::Status) => commands::status::show(&mut store, config_path, output),
        Some(Commands::Config { .. }) => unreachable!(), // Handled above
    }
}

/// Print the error chain and a hint when the error has one
fn report_error(error: &anyhow::Error) {
    eprintln!("Error: {:#}", error);

    let hint = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StoreError>())
        .and_then(StoreError::recovery_suggestion);
    if let Some(hint) = hint {
        eprintln!("Hint: {}", hint);
    }
}

/// Initialize logging
///
/// Logging is off unless `--verbose` is given or CONTACTS_LOG names a level.
/// Logs go to the configured log file, or stderr.
fn init_logging(verbose: bool, config: &Config) {
    let log_level = match std::env::var("CONTACTS_LOG") {
        Ok(level) if !level.trim().is_empty() => level,
        _ if verbose => "debug".to_string(),
        _ => return,
    };

    let env_filter = EnvFilter::new(format!(
        "contacts_core={},contacts_cli={}",
        log_level, log_level
    ));

    // Ignore errors if a subscriber is already installed
    match &config.log_file {
        Some(log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
