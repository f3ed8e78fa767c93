//! Camera Selector - Entry Point
//!
//! Runs the positioning engine against the simulated room and drives it from
//! an operator console on stdin.

use anyhow::{Context, Result};
use camera_selector::{
    console::{ConsoleCommand, HELP},
    core::{
        config::Config,
        events::{self, AppEvent},
    },
    Collaborators, PositioningEngine, SimulatedRoom, TrackingCapabilities,
};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "camera-selector", about = "Camera selector positioning engine with a simulated room")]
struct Cli {
    /// Config file to load instead of the platform default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    dump_default_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.dump_default_config {
        print!("{}", Config::default_config_str());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    info!(
        "Starting camera selector ({} presets, tracking: {:?})",
        config.simulator.presets.len(),
        config.simulator.tracking
    );

    let room = Arc::new(SimulatedRoom::from_config(&config.simulator));
    let capabilities = TrackingCapabilities::from_features(&config.simulator.tracking);
    let control_id = config.control.widget_id.clone();

    let (sender, event_rx) = events::channel();
    let mut engine = PositioningEngine::new(config, Collaborators::from_room(Arc::clone(&room)));
    engine
        .start(capabilities, sender.clone())
        .await
        .context("Failed to start positioning engine")?;

    // Ctrl-C stops the event loop
    {
        let sender = sender.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Ctrl-C received"),
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            }
            let _ = sender.send(AppEvent::Shutdown);
        });
    }

    println!("{}", HELP);
    let lines = spawn_stdin_reader();

    tokio::select! {
        _ = engine.run(event_rx) => {}
        _ = run_console(&engine, &room, &control_id, lines) => {
            let _ = sender.send(AppEvent::Shutdown);
        }
    }

    info!("Camera selector stopped");
    Ok(())
}

/// Read stdin on a plain thread so a pending read never holds up runtime shutdown
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
        debug!("Console input closed");
    });
    rx
}

async fn run_console(
    engine: &PositioningEngine,
    room: &SimulatedRoom,
    control_id: &str,
    mut lines: mpsc::UnboundedReceiver<String>,
) {
    while let Some(line) = lines.recv().await {
        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Status => println!("{}", engine.snapshot().to_json()),
            other => {
                other.inject(room, control_id);
            }
        }
    }
}
