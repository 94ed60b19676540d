//! Connector Ranker CLI — HTTP ranking API server.
//!
//! Usage:
//!   connector-ranker serve [--db path] [--bind addr]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use connector_ranker::api_http::{build_router, AppState};
use connector_ranker::{HashEmbedder, OpenStore, RankingEngine, Settings, SqliteStore};
use tracing::info;

#[derive(Parser)]
#[command(name = "connector-ranker", version, about = "Personal-network connector ranking engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP ranking API
    Serve {
        /// Path to the SQLite graph store file (defaults to GRAPH_STORE_URI, or an in-memory store)
        #[arg(long)]
        db: Option<PathBuf>,
        /// Address to bind the HTTP server to (defaults to BIND_ADDR, or 0.0.0.0:8080)
        #[arg(long)]
        bind: Option<String>,
    },
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { db, bind } => {
            let runtime = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
            if let Err(err) = runtime.block_on(serve(db, bind)) {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    }
}

async fn serve(db: Option<PathBuf>, bind: Option<String>) -> Result<(), connector_ranker::CoreError> {
    let settings = load_settings(db, bind)?;

    let store: Arc<dyn connector_ranker::GraphStore> = if settings.graph_store.uri == ":memory:" {
        Arc::new(SqliteStore::open_in_memory()?)
    } else {
        Arc::new(SqliteStore::open(&settings.graph_store.uri)?)
    };
    let vectors: Arc<dyn connector_ranker::VectorStore> = Arc::new(connector_ranker::InMemoryVectorStore::new());
    let embedder: Arc<dyn connector_ranker::Embedder> = Arc::new(HashEmbedder::default());

    let engine = Arc::new(RankingEngine::new(store, vectors, embedder));
    let state = AppState::new(engine);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .map_err(|e| connector_ranker::CoreError::StoreUnavailable(e.to_string()))?;
    info!(addr = %settings.bind_addr, "connector-ranker listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| connector_ranker::CoreError::Transient(e.to_string()))?;
    Ok(())
}

/// `--db`/`--bind` override `Settings::from_env`'s `GRAPH_STORE_URI`/`BIND_ADDR`;
/// a bare `serve` with neither falls back to an in-memory store, since a
/// required env var would otherwise make local development a two-step dance.
fn load_settings(db: Option<PathBuf>, bind: Option<String>) -> Result<Settings, connector_ranker::CoreError> {
    let mut settings = match Settings::from_env() {
        Ok(s) => s,
        Err(connector_ranker::CoreError::ConfigMissing(_)) => {
            std::env::set_var("GRAPH_STORE_URI", ":memory:");
            Settings::from_env()?
        }
        Err(err) => return Err(err),
    };

    if let Some(path) = db {
        settings.graph_store.uri = path.to_string_lossy().into_owned();
    }
    if let Some(addr) = bind {
        settings.bind_addr = addr;
    }
    Ok(settings)
}
