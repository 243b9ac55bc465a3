mod config;
mod daemon;
mod pipeline;

use clap::{Parser, Subcommand};
use graft_script::ScriptFetcher;

#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Graft the Jupiter trading widget onto token pages in a live browser")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Detect {
        #[arg(help = "Page URL to run token detection on")]
        url: String,
    },
    Fetch {
        #[arg(short = 'f', long, default_value = "graft.toml", help = "Path to config file")]
        config: String,
    },
    Daemon {
        #[arg(short = 'f', long, default_value = "graft.toml", help = "Path to config file")]
        config: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "graft=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect { url } => run_detect(url),
        Commands::Fetch { config: config_path } => match config::GraftConfig::from_file(&config_path) {
            Ok(cfg) => run_fetch(cfg).await,
            Err(e) => Err(format!("failed to load config {}: {}", config_path, e).into()),
        },
        Commands::Daemon { config: config_path } => match config::GraftConfig::from_file(&config_path) {
            Ok(cfg) => daemon::run_daemon(cfg).await,
            Err(e) => Err(format!("failed to load config {}: {}", config_path, e).into()),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run_detect(url: String) -> Result<(), Box<dyn std::error::Error>> {
    let detection = graft_detect::detect(&url);

    match (&detection.raw_address, detection.is_valid) {
        (Some(address), true) => println!("token address: {}", address),
        (Some(candidate), false) => {
            println!("candidate rejected (not a base-58 address): {}", candidate)
        }
        (None, _) => println!("no token address in url"),
    }

    Ok(())
}

async fn run_fetch(config: config::GraftConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.cache.is_none() {
        return Err("prefetching needs a [cache] path in the config".into());
    }

    let store = daemon::open_store(&config)?;
    let fetcher = ScriptFetcher::new(config.fetcher_config(), store);

    match fetcher.download().await {
        Some(body) => {
            println!("fetched {} bytes into the script cache", body.len());
            Ok(())
        }
        None => Err("script download failed after all attempts".into()),
    }
}
