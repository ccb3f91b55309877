use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use et_cli::commands::{check_path, classify, run, show_config, summary};
use et_cli::{Cli, Commands, Config};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // stdout carries command output, so logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let load_config = || -> Result<Config> {
        let config =
            Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
        tracing::debug!(?config, "loaded configuration");
        Ok(config)
    };

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(Commands::Run) => {
            run::run(load_config()?, cli.config.as_deref())?;
        }
        Some(Commands::Classify {
            text,
            range_length,
            clipboard,
        }) => {
            // Pure computation; no config needed
            classify::run(&mut stdout, text, *range_length, clipboard)?;
        }
        Some(Commands::Summary { date, json }) => {
            summary::run(&mut stdout, &load_config()?, date.as_deref(), *json)?;
        }
        Some(Commands::CheckPath { path }) => {
            if !check_path::run(&mut stdout, path)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(Commands::Config) => {
            show_config::run(&mut stdout, &load_config()?)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(ExitCode::SUCCESS)
}
