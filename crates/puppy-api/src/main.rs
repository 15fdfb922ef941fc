mod config;
mod error;
mod routes;

use std::sync::Arc;

use config::AppConfig;
use puppy_core::db::{ConnectionManager, EventStore};
use routes::{app_router, AppState};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("puppy_api=info".parse()?)
                .add_directive("puppy_core=info".parse()?),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("Starting puppy-api with config: {:?}", config);

    // The server starts whether or not the database is reachable; the
    // supervisor keeps trying in the background.
    let manager = ConnectionManager::new(config.database_config());
    manager.connect().await;
    let supervisor = manager.spawn_supervisor();

    let state = AppState::new(Arc::new(EventStore::new(manager)));
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("puppy-api listening on {}", config.bind_addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    supervisor.abort();
    tracing::info!("puppy-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Could not install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
