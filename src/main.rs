// Healthmark - Health-markers data-quality ETL
// Copyright (c) 2025 Healthmark Contributors
// Licensed under the MIT License

use healthmark::cli::commands::EXIT_FATAL;
use healthmark::cli::{Cli, Commands};
use healthmark::config::{load_config, LoggingConfig};
use healthmark::logging::init_logging;
use clap::Parser;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // File logging follows the config when it loads; commands report load
    // errors themselves
    let file_config = match &cli.command {
        Commands::Init(_) => None,
        _ => load_config(&cli.config).ok(),
    };
    let logging_config = file_config
        .as_ref()
        .map_or_else(LoggingConfig::console_only, |c| c.logging.clone());
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| file_config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    let logging_guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Healthmark - Health-markers data-quality ETL"
    );

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                        }
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl+C only");
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                        return;
                    }
                    tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                return;
            }
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
        }

        println!("\n⚠️  Shutdown signal received, finishing current step...");
        let _ = shutdown_tx.send(true);
    });

    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    // process::exit skips destructors, flush the file writer first
    drop(logging_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Run(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Ingest(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
