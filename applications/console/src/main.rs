//! Jukebox Console - play a queue of media into one output from the terminal

use clap::{Parser, Subcommand};
use jukebox_console::{
    CatalogResolver, Command, Console, ConsoleConfig, ConsoleObserver, Outcome, SimulatedSession,
    StreamLengths,
};
use jukebox_core::Requester;
use jukebox_playback::PlaybackEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jukebox-console")]
#[command(about = "Queue-driven media player for the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive player
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Load and validate the configuration, then exit
    CheckConfig {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let config = ConsoleConfig::load(config.as_deref())?;
            init_tracing(&config.logging.level);
            config.validate()?;
            run(config).await?;
        }
        Commands::CheckConfig { config } => {
            let config = ConsoleConfig::load(config.as_deref())?;
            config.validate()?;
            println!(
                "Configuration OK: {} catalog entries, {} destinations, tick {} ms",
                config.catalog.len(),
                config.destinations.len(),
                config.engine.tick_ms
            );
        }
    }

    Ok(())
}

/// Logs go to stderr so they never interleave with the status on stdout
fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(config: ConsoleConfig) -> anyhow::Result<()> {
    let lengths = StreamLengths::new();
    let resolver = CatalogResolver::new(config.catalog.clone(), lengths.clone())
        .with_download_dir(config.downloads.dir.clone());
    let session = SimulatedSession::new(lengths);

    let engine = PlaybackEngine::new(config.engine.clone(), Arc::new(resolver), Arc::new(session));
    engine.register_observer(Arc::new(ConsoleObserver::stdout("console")));

    let mut console = Console::new(
        engine.clone(),
        config.destinations(),
        Requester::new("console", "console"),
    )?;

    tracing::info!("Starting Jukebox console");
    tracing::info!("Catalog entries: {}", config.catalog.len());
    println!("You are in {}. Type help for a list of commands.", console.here().name);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let outcome = match line.parse::<Command>() {
            Ok(command) => console.execute(command).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(Outcome::Reply(text)) => println!("{text}"),
            Ok(Outcome::Quit) => break,
            Err(e) => println!("{e}"),
        }
    }

    tracing::info!("Shutting down");
    engine.request_clear();
    engine.wait_idle().await;
    Ok(())
}
