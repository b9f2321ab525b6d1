//! # quartify CLI
//!
//! Command-line interface for exporting Obsidian vaults to Quarto sources.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quartify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a quartify.yml configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate <ROOT>/exportFiles with Quarto-ready markdown
    Export {
        /// Vault root directory
        root: PathBuf,

        /// Print the run report as JSON (progress goes to stderr)
        #[arg(long)]
        json: bool,
    },

    /// Print the sidebar contents for _quarto.yml
    Sidebar {
        /// Directory to describe (vault root or export directory)
        root: PathBuf,

        /// Indentation of top-level entries
        #[arg(long)]
        indent: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for sidebar text and JSON
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Export { root, json } => {
            commands::export_vault(cli.config.as_deref(), &root, json)
        }
        Commands::Sidebar { root, indent } => {
            commands::print_sidebar(cli.config.as_deref(), &root, indent)
        }
    }
}
