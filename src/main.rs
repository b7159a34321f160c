use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hotshot::{auth, broadcast, config::ServerConfig, routes, state::export, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotshot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HotShot...");

    let config = ServerConfig::from_env();
    let auth_config = Arc::new(auth::AuthConfig::from_env());
    let state = Arc::new(AppState::new());

    if let Some(ref path) = config.snapshot_path {
        match state.load_snapshot(path).await {
            Ok(true) => tracing::info!("Restored state from {}", path.display()),
            Ok(false) => tracing::info!("No snapshot at {}, starting empty", path.display()),
            Err(e) => {
                tracing::error!("Failed to restore snapshot {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
        export::spawn_snapshot_writer(state.clone(), path.clone(), config.snapshot_interval);
    }

    // Spawn background task for pushing live results to host and admin screens
    broadcast::spawn_results_broadcaster(state.clone());

    let app = routes::build_router(state.clone(), auth_config, &config.static_dir);

    tracing::info!("Listening on http://{}", config.bind);

    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", config.bind, e);
            std::process::exit(1);
        }
    };

    let shutdown_state = state.clone();
    let snapshot_path = config.snapshot_path.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
            if let Some(path) = snapshot_path {
                if let Err(e) = shutdown_state.save_snapshot(&path).await {
                    tracing::error!("Final snapshot failed: {}", e);
                }
            }
        })
        .await;

    if let Err(e) = served {
        tracing::error!("Server error: {}", e);
    }
}
