//! Roundtable CLI — the main entry point.
//!
//! Commands:
//! - `personas` — List the persona roster and seating order
//! - `assemble` — Build the prompt for the next turn from a transcript
//!
//! The CLI never performs inference: `assemble` prints the exact wire
//! string that would be handed to the engine, which makes it a prompt
//! inspector for calibrating window sizes and persona instructions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "roundtable",
    about = "Roundtable — persona prompt assembly for Llama-3-family models",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "roundtable.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the persona roster and seating order
    Personas,

    /// Assemble the prompt for the next turn
    Assemble {
        /// Transcript JSON file replayed into the conversation log
        #[arg(short, long)]
        transcript: PathBuf,

        /// Files whose contents are injected as retrieved background chunks
        #[arg(short, long)]
        rag: Vec<PathBuf>,

        /// Assemble for this persona instead of the table's current seat
        #[arg(short, long)]
        persona: Option<String>,

        /// Assemble this many rounds, advancing the table between rounds
        #[arg(long, default_value_t = 1)]
        rounds: usize,

        /// Print per-section token accounting after each prompt
        #[arg(long)]
        stats: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Personas => commands::personas::run(&cli.config)?,
        Commands::Assemble {
            transcript,
            rag,
            persona,
            rounds,
            stats,
        } => commands::assemble::run(&cli.config, &transcript, &rag, persona.as_deref(), rounds, stats)?,
    }

    Ok(())
}
