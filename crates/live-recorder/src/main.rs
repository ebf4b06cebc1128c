//! Live-Recorder: record the default microphone to WAV from the console.

mod app;
mod app_command;
mod cli;
mod config;
mod error;
mod logging;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    cli::Cli,
    error::{AppError, Result as AppResult},
};

use crate::config::Config;

use clap::Parser;
use tracing::error;

/// Application entry point.
fn main() {
    let cli = Cli::parse();

    // Logging is not up yet; config errors go straight to stderr.
    let loaded = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = match loaded {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    cli.apply(&mut config);

    let log_guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            drop(log_guard);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let app = App::new(&config, cli.output.clone())?;
        app.run().await
    });

    if let Err(e) = result {
        error!(error = %e, "Live-Recorder failed");
        drop(log_guard);
        std::process::exit(1);
    }
}
