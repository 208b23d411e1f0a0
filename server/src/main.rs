mod app;
mod config;
mod routes;
mod services;
mod state;
mod store;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;
use crate::store::TableStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let campaign = config::campaign_config();
    let data_dir = config::data_dir();
    tracing::info!(
        data_dir = %data_dir.display(),
        maps = campaign.maps.len(),
        recent_highlight_count = campaign.recent_highlight_count,
        "Loading campaign tables..."
    );

    let state = AppState::new(
        campaign,
        TableStore::new(data_dir),
        config::sse_broadcast_buffer(),
    );

    match services::map_refresher::refresh(&state).await {
        Ok(outcome) => tracing::info!(seq = outcome.seq, "Initial maps rendered"),
        Err(e) => tracing::warn!(
            error = %e,
            "initial table load failed; maps stay unavailable until the tables parse"
        ),
    }

    tokio::spawn(services::map_refresher::run(
        state.clone(),
        config::table_reload_interval(),
    ));

    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("Frontlines map server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
