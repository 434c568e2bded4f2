//! PermitSync CLI
//!
//! Command-line tools around the permit sync layer.
//!
//! # Commands
//!
//! - `generate` - Emit deterministic sample permits as JSON
//! - `validate` - Run the validation gate over a JSON payload file
//! - `simulate` - Play a sync session against the in-process reference server

mod commands;

use clap::{Parser, Subcommand};
use permit_sync_protocol::PERMITS_PATH;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Permit sync command-line tools.
#[derive(Parser)]
#[command(name = "permitsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit deterministic sample permits
    Generate {
        /// Number of permits
        #[arg(short, long, default_value = "300")]
        count: usize,

        /// Random seed
        #[arg(short, long, default_value = "123")]
        seed: u64,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap the list as {"permits": [...]}
        #[arg(short, long)]
        wrap: bool,
    },

    /// Audit a JSON payload with the validation gate
    Validate {
        /// Payload file
        file: PathBuf,

        /// Read the list from this field of a top-level object
        #[arg(short, long)]
        key: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Play a sync session against the in-process reference server
    Simulate {
        /// Number of permits to seed
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Random seed for the seeded permits
        #[arg(short, long, default_value = "123")]
        seed: u64,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate {
            count,
            seed,
            output,
            wrap,
        } => {
            commands::generate::run(count, seed, output.as_deref(), wrap)?;
        }
        Commands::Validate { file, key, format } => {
            commands::validate::run(&file, key.as_deref(), &format)?;
        }
        Commands::Simulate { count, seed } => {
            commands::simulate::run(count, seed)?;
        }
        Commands::Version => {
            println!("PermitSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Collection path: {PERMITS_PATH}");
        }
    }

    Ok(())
}
