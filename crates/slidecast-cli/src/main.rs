//! Slidecast CLI - Headless Carousel Video Tool
//!
//! Features:
//! - Video-ID extraction from slide markup sources
//! - Provider listing
//! - Scripted replay of carousel navigation and SDK callback races

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod script;

/// Slidecast CLI - carousel video toolkit
#[derive(Parser)]
#[command(name = "slidecast-cli")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Carousel video lifecycle toolkit", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the provider and video ID from a URL or attribute value
    Extract {
        /// URL, bare ID or file path
        source: String,

        /// Provider (youtube, vimeo, html); detected from the URL if omitted
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// List supported providers and their markup attributes
    Providers,

    /// Replay a JSON script of carousel and SDK events
    Simulate {
        /// Path to the script
        script: PathBuf,

        /// Video options file, overrides the script's `config`
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract { source, provider } => {
            commands::extract(&source, provider.as_deref(), &cli.format)?;
        }
        Commands::Providers => {
            commands::providers(&cli.format)?;
        }
        Commands::Simulate { script, config } => {
            commands::simulate(&script, config.as_deref(), &cli.format).await?;
        }
    }

    Ok(())
}
