mod api;
mod app;
mod commands;
mod config;
mod event;
mod logging;
mod store;
mod sync;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "restdeck")]
#[command(about = "A terminal UI for browsing and editing a REST collection")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./restdeck.yaml, then $XDG_CONFIG_HOME/restdeck/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Resource to open on startup
  #[arg(short, long)]
  resource: Option<String>,

  /// Override the API base URL
  #[arg(short, long)]
  base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration, then apply command line overrides
  let config =
    config::Config::load(args.config.as_deref())?.with_overrides(args.resource, args.base_url)?;

  let _guard = logging::init(&config.log)?;
  info!(base_url = %config.api.base_url, "config loaded");

  // Initialize and run the app
  let mut app = app::App::new(config)?;
  if let Err(e) = app.run().await {
    error!(error = %e, "app exited with error");
    return Err(e);
  }

  info!("exiting");
  Ok(())
}
