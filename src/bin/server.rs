use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use metamorph::{analyzer::Analyzer, config::Config, eth::EthClient};
use serde_json::json;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct AppState {
    analyzer: Analyzer<EthClient>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let eth = EthClient::new(config.url()?)?;
    let state = Arc::new(AppState {
        analyzer: Analyzer::new(eth).with_signatures(config.signatures),
    });

    let app = Router::new()
        .route("/ismetamorphic/:address", get(handle_analyze))
        .with_state(state);

    let bind_addr = config.bind_addr;
    info!(%bind_addr, "Starting metamorphic contract detector");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutting down");
}

async fn handle_analyze(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Response {
    match state.analyzer.analyze(&address).await {
        Ok(analysis) => (StatusCode::OK, Json(analysis)).into_response(),
        Err(err) if err.is_invalid_address() => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Invalid Ethereum Address"})),
        )
            .into_response(),
        Err(err) => {
            error!(%address, error = %err, "Analysis failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({"detail": err.to_string()})),
            )
                .into_response()
        }
    }
}
