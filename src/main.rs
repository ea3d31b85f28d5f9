// Siphon - MongoDB single-field collector
// Copyright (c) 2025 Siphon Contributors
// Licensed under the MIT License

use siphon::cli::{Cli, Commands};
use siphon::config::{load_config, LoggingConfig, SiphonConfig};
use siphon::logging::init_logging;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    // Optional; a missing .env is ignored
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Loaded once; logging settings come from it when it loads and the
    // command itself reports a broken config
    let loaded = match &cli.command {
        Commands::Init(_) => None,
        _ => Some(load_config(&cli.config)),
    };
    let (config_level, logging_config) = match &loaded {
        Some(Ok(config)) => (
            config.application.log_level.clone(),
            config.logging.clone(),
        ),
        _ => ("info".to_string(), LoggingConfig::default()),
    };
    let log_level = cli.log_level.clone().unwrap_or(config_level);

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(e.exit_code());
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Siphon - MongoDB single-field collector"
    );

    let exit_code = match execute_command(&cli, loaded).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(
    cli: &Cli,
    loaded: Option<siphon::domain::Result<SiphonConfig>>,
) -> anyhow::Result<i32> {
    let loaded = || loaded.unwrap_or_else(|| load_config(&cli.config));
    match &cli.command {
        Commands::Run(args) => args.execute(&cli.config, loaded()).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config, loaded()).await,
        Commands::Init(args) => args.execute().await,
    }
}
