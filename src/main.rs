//! Air Quality Monitoring Service - Main Daemon
//!
//! A server-side daemon that:
//! 1. Polls the IQAir API for the fixed location once a minute
//! 2. Stores each reading in PostgreSQL
//! 3. Serves live and historical air quality over HTTP
//!
//! Usage:
//!   cargo run --release                          # airmon.toml + DATABASE_URL
//!   cargo run --release -- --port 8080           # Override the endpoint port
//!   cargo run --release -- --memory              # No database, readings kept in memory
//!
//! Environment:
//!   DATABASE_URL  - PostgreSQL connection string
//!   IQAIR_API_KEY - IQAir API key (overrides airmon.toml)
//!   RUST_LOG      - log filter (default: info)

use airmon_service::config::{Config, DEFAULT_CONFIG_PATH};
use airmon_service::daemon::{self, Collector};
use airmon_service::db::PgReadingStore;
use airmon_service::endpoint;
use airmon_service::ingest::iqair::{IqAirClient, PollutionSource};
use airmon_service::logging;
use airmon_service::scheduler::Scheduler;
use airmon_service::service::AirQualityService;
use airmon_service::store::{MemoryReadingStore, ReadingStore};
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "airmon_service", version, about = "Fixed-location air quality monitor")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// HTTP port (overrides [endpoint] port)
    #[arg(long)]
    port: Option<u16>,

    /// Keep readings in memory instead of PostgreSQL
    #[arg(long)]
    memory: bool,

    /// Serve queries only; do not poll the upstream API
    #[arg(long)]
    no_scheduler: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("\n❌ {}\n", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = Config::load(&args.config)?;
    let location = config.location.location();

    let source: Arc<dyn PollutionSource> = Arc::new(IqAirClient::new(
        config.iqair.base_url.clone(),
        config.api_key()?,
        location,
    )?);

    // The collector and the endpoint each get their own store handle
    let (collector_store, query_store) = open_stores(args.memory)?;

    tracing::info!(
        location = %config.location.name,
        latitude = location.latitude,
        longitude = location.longitude,
        "tracking fixed location"
    );

    if args.no_scheduler {
        tracing::info!("scheduler disabled");
    } else {
        let scheduler = Scheduler::new(
            config.scheduler.name.clone(),
            Duration::from_secs(config.scheduler.interval_seconds),
        );
        daemon::start_collection(&scheduler, Collector::new(Arc::clone(&source), collector_store))?;
    }

    let service = AirQualityService::new(source, query_store, config.location.name.clone());
    let port = args.port.unwrap_or(config.endpoint.port);
    endpoint::start_endpoint_server(&config.endpoint.bind, port, service)?;

    Ok(())
}

fn open_stores(memory: bool) -> Result<(Box<dyn ReadingStore>, Box<dyn ReadingStore>), Box<dyn Error>> {
    if memory {
        tracing::warn!("using in-memory store; readings are lost on exit");
        let store = MemoryReadingStore::new();
        return Ok((Box::new(store.clone()), Box::new(store)));
    }

    let collector_store = PgReadingStore::connect()?;
    let query_store = PgReadingStore::connect()?;
    tracing::info!("connected to PostgreSQL");
    Ok((Box::new(collector_store), Box::new(query_store)))
}
