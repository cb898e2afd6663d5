//! HEXFRONT CLI - Command-line front-end for the board simulation
//!
//! Commands:
//! - play: Drive a board through a script of touches and choices
//! - range: Show the cells within a distance band around a cell
//! - skirmish: Generate a random skirmish scenario

mod play;
mod range_cmd;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use hexfront_core::Scenario;

#[derive(Parser)]
#[command(name = "hexfront")]
#[command(about = "HEXFRONT hex-grid tactical board simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script against a board
    Play(play::PlayArgs),
    /// Show a distance band on an empty grid
    Range(range_cmd::RangeArgs),
    /// Generate a random skirmish scenario
    Skirmish {
        /// Pieces per side
        #[arg(long, default_value = "3")]
        pieces: usize,
        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Scenario name
        #[arg(long, default_value = "skirmish")]
        name: String,
        /// Write the scenario here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play::run(args),
        Commands::Range(args) => range_cmd::run(args),
        Commands::Skirmish { pieces, seed, name, output } => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let scenario = Scenario::random_skirmish(&mut rng, &name, pieces);

            match output {
                Some(path) => {
                    scenario
                        .save(&path)
                        .with_context(|| format!("Failed to write scenario to {}", path.display()))?;
                    tracing::info!("Saved scenario '{}' to {}", scenario.name, path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&scenario)?),
            }
            Ok(())
        }
    }
}
