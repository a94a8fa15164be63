use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wisest::commands::{run_ingest, run_query, serve};
use wisest::config::{Config, Secrets, show_config};

#[derive(Parser)]
#[command(name = "wisest")]
#[command(about = "Portfolio backend: decision advisor, affirmations and a RAG chatbot")]
#[command(version)]
struct Cli {
    /// Configuration directory (defaults to ~/.wisest)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the effective configuration to config.toml, or print it with --show
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Start the HTTP API
    Serve,
    /// Chunk, embed and store documents that are not stored yet
    Ingest {
        /// Clear the vector store before ingesting
        #[arg(long)]
        reset: bool,
        /// Read documents from a local directory instead of GitHub
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Answer a single question from the stored documents
    Query {
        /// The question to answer
        #[arg(long)]
        query: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => Config::default_dir()?,
    };
    let config = Config::load(&config_dir)?;
    let secrets = Secrets::from_env();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config, &secrets);
            } else {
                config.save()?;
                println!("Configuration written to {}", config.config_file_path().display());
            }
        }
        Commands::Serve => {
            serve(&config, &secrets).await?;
        }
        Commands::Ingest { reset, dir } => {
            run_ingest(&config, &secrets, reset, dir).await?;
        }
        Commands::Query { query } => {
            run_query(&config, &secrets, &query).await?;
        }
    }

    Ok(())
}
