//! Arttag CLI - zero-shot art taxonomy tagging for images.
//!
//! Arttag compares an image's CLIP embedding with pre-computed embeddings of a
//! fixed art taxonomy (medium, subject, style, aesthetic features) and reports
//! the labels that clear the confidence threshold in each category.
//!
//! # Usage
//!
//! ```bash
//! # Download the CLIP encoders
//! arttag models download
//!
//! # Tag a few images locally
//! arttag analyze painting.jpg sketch.png --format jsonl
//!
//! # Serve POST /analyze over HTTP
//! arttag serve --port 8000
//!
//! # View configuration
//! arttag config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// Arttag - zero-shot art taxonomy tagging for images.
#[derive(Parser, Debug)]
#[command(name = "arttag")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Tag one or more images against the art taxonomy
    Analyze(cli::analyze::AnalyzeArgs),

    /// Run the HTTP analysis service
    Serve(cli::serve::ServeArgs),

    /// Manage CLIP models (download, list, etc.)
    Models(cli::models::ModelsArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match arttag_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `arttag config path`."
            );
            arttag_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Arttag v{}", arttag_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, config).await,
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Models(args) => cli::models::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
