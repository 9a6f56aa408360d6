use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blogfront::config::Config;
use blogfront::{AppState, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv_loaded = dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with_target(false)
        .compact()
        .init();

    if !dotenv_loaded {
        info!(".env not found, using process environment");
    }

    let config = Config::from_env().context("invalid configuration")?;
    let app_state = AppState::new(config).context("failed to initialise application state")?;

    info!(
        backend = %app_state.backend.base_url(),
        admin = app_state.credentials.username(),
        signed_sessions = app_state.session.is_signed(),
        "configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(&app_state.config.host)
        .await
        .with_context(|| format!("failed to bind to {}", app_state.config.host))?;

    info!(addr = %app_state.config.host, "Up and running!");

    let app = routes::app(Arc::new(app_state));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
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

    info!("shutdown signal received");
}
