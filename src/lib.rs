use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod protocol;
pub mod routes;
pub mod state;

use config::load_config;
use db::event_record::PgEventStore;
use routes::create_router;
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = load_config()?;

    info!("Connecting to event store...");
    let store = PgEventStore::connect(&config.database_url).await?;
    store.ensure_schema().await?;

    let state = AppState::new(Arc::new(store));
    let app = create_router(state);

    let listener = TcpListener::bind(&config.server_address).await?;
    info!("Collector listening on {}", config.server_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
