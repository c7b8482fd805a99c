//! csvfiler Server Binary
//!
//! Loads configuration, opens the engine over the storage directory
//! and serves the HTTP API.

use std::path::Path;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use csvfiler::{api, Config, Engine};

/// csvfiler Server
#[derive(Parser, Debug)]
#[command(name = "csvfiler-server")]
#[command(about = "Deduplicated id-set storage over comma-separated text files")]
#[command(version)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long, default_value = "configuration.yaml")]
    config: String,

    /// Storage directory (overrides the config file)
    #[arg(short, long)]
    storage_dir: Option<String>,

    /// Number of hash buckets (overrides the config file)
    #[arg(short = 'b', long)]
    hash_buckets: Option<usize>,

    /// Listen address host:port (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,csvfiler=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    let mut config = if Path::new(&args.config).exists() {
        match Config::from_file(Path::new(&args.config)) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("failed to read configuration file: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        tracing::warn!("config file {} not found, using defaults", args.config);
        Config::default()
    };

    if let Some(dir) = args.storage_dir {
        config.storage_dir = dir.into();
    }
    if let Some(buckets) = args.hash_buckets {
        config.hash_buckets = buckets;
    }
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    tracing::info!("csvfiler-server v{}", csvfiler::VERSION);
    tracing::info!("storage directory: {}", config.storage_dir.display());
    tracing::info!("listen address: {}", config.listen_addr);

    // Open engine (loads all files; any parse failure aborts startup)
    let engine = match Engine::open(config.clone()) {
        Ok(e) => web::Data::new(e),
        Err(e) => {
            tracing::error!("failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("engine initialized, {} files loaded", engine.file_count());

    let listen_addr = config.listen_addr.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(engine.clone())
            .configure(api::configure)
    })
    .bind(listen_addr)?
    .run()
    .await
}
