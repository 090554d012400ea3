//! CLI frontend for the Taleweaver story engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tw_mechanics::RollMode;

#[derive(Parser)]
#[command(
    name = "tw",
    about = "Taleweaver: turn-based solo adventures in the terminal",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an adventure
    Play {
        /// RNG seed for dice and events
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Name of your character
        #[arg(short, long, default_value = "Wanderer")]
        name: String,

        /// One-line character concept
        #[arg(short, long)]
        concept: Option<String>,

        /// Turns before the story closes
        #[arg(long, default_value = "50")]
        max_turns: u32,

        /// Resume a saved session
        #[arg(long)]
        load: Option<PathBuf>,

        /// Save the session here on exit
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Roll dice, e.g. `2d6+1` or `d20+3 --advantage`
    Roll {
        /// Dice notation
        notation: String,

        /// Roll the d20 twice and keep the higher
        #[arg(long, conflicts_with = "disadvantage")]
        advantage: bool,

        /// Roll the d20 twice and keep the lower
        #[arg(long)]
        disadvantage: bool,

        /// RNG seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// List the enemies an adventure can throw at you
    Bestiary,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Play {
            seed,
            name,
            concept,
            max_turns,
            load,
            save,
        } => commands::play::run(commands::play::PlayOptions {
            seed,
            name,
            concept,
            max_turns,
            load,
            save,
        }),
        Commands::Roll {
            notation,
            advantage,
            disadvantage,
            seed,
        } => {
            let mode = match (advantage, disadvantage) {
                (true, _) => RollMode::Advantage,
                (_, true) => RollMode::Disadvantage,
                _ => RollMode::Normal,
            };
            commands::roll::run(&notation, mode, seed)
        }
        Commands::Bestiary => commands::bestiary::run(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
