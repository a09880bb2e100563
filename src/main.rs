//! Krea - AI image generation, editing and upscaling CLI.

mod adapters;
mod asset;
mod cassette;
mod cli;
mod client;
mod config;
mod context;
mod error;
mod history;
mod interactive;
mod model;
mod output;
mod params;
mod poller;
mod ports;
mod presets;
mod request;
mod runner;

use std::path::Path;
use std::process;

use clap::Parser;
use tracing::Level;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::KreaError;
use crate::runner::Runner;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), KreaError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(KreaError::ConfigFile)?;
    tracing::debug!(path = %config_path.display(), "loaded config");

    let request = request::resolve(&cli, &config.defaults)?;
    tracing::debug!(mode = ?request.mode(), ?request, "resolved request");

    // Create context based on mode (live / recording / replaying)
    let replay_path = std::env::var("KREA_REPLAY").ok().filter(|p| !p.is_empty());
    let is_recording = std::env::var("KREA_REC").is_ok_and(|v| v == "true" || v == "1");

    let (ctx, recording_session) = if let Some(ref cassette_path) = replay_path {
        tracing::info!("replaying from {cassette_path}");
        (ServiceContext::replaying(Path::new(cassette_path), &config)?, None)
    } else if is_recording {
        tracing::info!("recording mode enabled");
        let (ctx, session) = ServiceContext::recording(&config)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(&config)?, None)
    };

    let output_dir = config.output_dir();
    let result = Runner::new(&ctx, &output_dir).execute(&request).await;
    drop(ctx);

    if let Some(session) = recording_session {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => tracing::warn!("failed to save cassette: {e}"),
        }
    }

    let entries = result?;
    if !cli.no_open && config.open_folder() {
        if let Some(folder) = entries.last().and_then(|e| e.local_path.parent()) {
            output::reveal_folder(folder);
        }
    }
    Ok(())
}
