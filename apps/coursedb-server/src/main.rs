//! REST API server for courses and students.
//!
//! Wires configuration, snapshot recovery, the course router and the hyper
//! server together, and shuts down on Ctrl+C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use coursedb_api::{router::Router, server::Server};
use coursedb_core::config::DbConfig;
use coursedb_core::factory::StudentFactory;
use coursedb_core::persistence::PersistenceManager;
use coursedb_core::Database;
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the course server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Directory for the store snapshot; omit to run purely in memory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Do not save a snapshot after each mutation
    #[arg(long)]
    no_persist_on_write: bool,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Create this many students with generated names at startup
    #[arg(long, default_value_t = 0)]
    seed_students: usize,
}

impl Args {
    fn db_config(&self) -> DbConfig {
        DbConfig {
            request_timeout_ms: self.request_timeout_ms,
            data_dir: self.data_dir.clone(),
            persist_on_write: !self.no_persist_on_write,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(args.db_config());
    let persistence = PersistenceManager::from_config(&config);

    let db = match &persistence {
        Some(persistence) => persistence
            .load()
            .with_context(|| format!("Failed to load snapshot from {:?}", config.data_dir))?,
        None => {
            tracing::warn!("No data directory configured, store is in-memory only");
            Database::new()
        }
    };

    if args.seed_students > 0 {
        let students = StudentFactory::new()
            .make(&db, args.seed_students)
            .context("Failed to seed students")?;
        let ids: Vec<u64> = students.iter().map(|s| s.id).collect();
        tracing::info!("Seeded {} students with ids {:?}", ids.len(), ids);
        if let Some(persistence) = &persistence {
            persistence.save(&db).context("Failed to save seeded students")?;
        }
    }

    let router = Router::new(Arc::new(db), config.clone(), persistence);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let server = Server::new(addr, router);

    tracing::info!(
        host = %args.host,
        port = args.port,
        data_dir = ?config.data_dir,
        request_timeout_ms = config.request_timeout_ms,
        "Starting course server"
    );

    server
        .serve_with_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl_c: {}", e);
            }
        })
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}
