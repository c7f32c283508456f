mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use spots_api::authorizer::Authorizer;
use spots_api::passwords::Passwords;
use spots_api::{AppState, AppStateInner, router};
use spots_db::{Database, seed};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scenic_spots=debug,spots_api=debug,spots_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e:#}");
            eprintln!("       Set it in your .env file and restart.");
            std::process::exit(1);
        }
    };

    let db = Arc::new(Database::open(&config.db_path)?);

    if config.populate {
        let store = db.clone();
        let dir = config.seed_dir.clone();
        tokio::task::spawn_blocking(move || seed::populate(store.as_ref(), &dir)).await??;
    }

    let state: AppState = Arc::new(AppStateInner {
        store: db,
        authorizer: Authorizer::new(&config.jwt_secret, config.token_ttl),
        passwords: Passwords::default(),
        request_timeout: config.request_timeout,
        started_at: Instant::now(),
    });

    let app = router::build(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Scenic spots server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
