mod config;
mod errors;
mod export;
mod layout;
mod models;
mod render;
mod resume;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StoreKind};
use crate::layout::default_page_config;
use crate::resume::controller::FormController;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{FileStore, MemoryStore, RedisStore, ResumeRepository, SnapshotStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume service v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the snapshot store
    let store = open_store(&config)?;
    info!("Snapshot store ready ({:?}, key '{}')", config.store, store.key());

    // Open the editing session from whatever was saved last
    let controller = FormController::open(ResumeRepository::new(store));

    let page_config = default_page_config();
    info!(
        "Layout page config: {}x{}pt, {}pt margins",
        page_config.page_width_pt, page_config.page_height_pt, page_config.margin_pt
    );

    let state = AppState::new(controller, page_config);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::new(config.bind_addr, config.port);
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<dyn SnapshotStore>> {
    let store: Arc<dyn SnapshotStore> = match config.store {
        StoreKind::File => {
            let store = FileStore::new(&config.store_path, config.store_key.clone());
            info!("Resume snapshot file: {}", store.path().display());
            Arc::new(store)
        }
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Redis => {
            let url = config.redis_url.as_deref().unwrap_or_default();
            Arc::new(RedisStore::open(url, config.store_key.clone())?)
        }
    };
    Ok(store)
}
