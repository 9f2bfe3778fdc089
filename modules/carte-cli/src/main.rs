use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use carte_common::Config;

mod cmd;

#[derive(Parser)]
#[command(name = "carte")]
#[command(about = "Build a filterable map page from place and provenance datasets")]
#[command(version)]
struct Cli {
    /// Dataset directory or base URL (overrides CARTE_DATA)
    #[arg(long, global = true)]
    data: Option<String>,

    /// Geocode cache file (overrides CARTE_CACHE)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Delay after each uncached geocoding request, in milliseconds
    #[arg(long, global = true)]
    throttle_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Geocode, place and write index.html + markers.geojson
    Build {
        /// Output directory (overrides CARTE_OUT)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Build once, then serve the page over HTTP
    Serve {
        /// Listen address (overrides CARTE_ADDR)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Resolve a single address through the cache and geocoder
    Geocode {
        /// Free text, e.g. "1 Place Vendôme" or "Rodez (12)"
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("carte=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(data) = cli.data {
        config.data = data;
    }
    if let Some(cache) = cli.cache {
        config.cache_path = cache;
    }
    if let Some(ms) = cli.throttle_ms {
        config.throttle = Duration::from_millis(ms);
    }

    match cli.command {
        Commands::Build { out } => {
            if let Some(out) = out {
                config.out_dir = out;
            }
            config.log_redacted();
            cmd::build::run(&config).await
        }
        Commands::Serve { addr } => {
            if let Some(addr) = addr {
                config.addr = addr;
            }
            config.log_redacted();
            cmd::serve::run(&config).await
        }
        Commands::Geocode { text } => cmd::geocode::run(&config, &text).await,
    }
}
