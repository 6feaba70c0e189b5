use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use validator_lib::{NumberLookup, ProviderResponse, ProxyError, ValidateQuery, proxy};

use crate::config::ServerConfig;

pub type SharedLookup = Arc<dyn NumberLookup + Send + Sync>;

pub fn router(upstream: SharedLookup) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/validate", get(validate_handler))
        .layer(cors)
        .with_state(upstream)
}

pub async fn start_server(config: ServerConfig, upstream: SharedLookup) -> anyhow::Result<()> {
    info!("Forwarding lookups to {}", config.provider_url);

    let app = router(upstream);

    let address = format!("0.0.0.0:{}", config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

/// `GET /api/validate?number=..&apiKey=..`
pub async fn validate_handler(
    State(upstream): State<SharedLookup>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = ValidateQuery::from_pairs(pairs);

    // The lookup client is blocking, keep it off the async workers
    let result = tokio::task::spawn_blocking(move || proxy::validate(&query, upstream.as_ref()))
        .await
        .unwrap_or_else(|e| Err(ProxyError::UpstreamFailure(e.to_string())));

    reply(result)
}

fn reply(result: Result<ProviderResponse, ProxyError>) -> Response {
    match result {
        Ok(payload) => (StatusCode::OK, Json(payload.into_inner())).into_response(),
        Err(e) => {
            if let ProxyError::UpstreamFailure(cause) = &e {
                warn!("Upstream lookup failed: {cause}");
            }
            let status =
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(e.body())).into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
