//! HTTP endpoint exposing the station gauges for scraping

use crate::app::services::average_publisher::PrometheusGauges;
use crate::error::{AggregatorError, Result};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

pub fn router(gauges: Arc<PrometheusGauges>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .route("/healthz", get(health))
        .with_state(gauges)
}

async fn metrics(State(gauges): State<Arc<PrometheusGauges>>) -> Response {
    match gauges.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Running metrics server
pub struct MetricsServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<std::io::Result<()>>,
}

impl MetricsServer {
    /// Bind `addr` and start serving in the background
    ///
    /// A bind failure is a fatal startup condition.
    pub async fn start(addr: SocketAddr, gauges: Arc<PrometheusGauges>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AggregatorError::transport_unavailable(addr.to_string(), e.to_string()))?;
        let local_addr = listener.local_addr()?;

        let shutdown = CancellationToken::new();
        let app = router(gauges);
        let stopped = shutdown.clone();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stopped.cancelled().await })
                .await
        });

        info!("Metrics server listening on http://{}/metrics", local_addr);
        Ok(Self {
            local_addr,
            shutdown,
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the server task
    pub async fn stop(self) -> Result<()> {
        self.shutdown.cancel();
        match self.handle.await {
            Ok(result) => result.map_err(AggregatorError::from),
            Err(e) => Err(AggregatorError::transport_unavailable(
                self.local_addr.to_string(),
                format!("metrics server task failed: {}", e),
            )),
        }
    }
}
