//! HTTP exposition of the metrics registry.
//!
//! The router has a single route, `GET /metrics`. Scrapes only read the
//! registry, so any number may run alongside an update cycle.

pub mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ExporterError, Result};
use crate::metrics::DishMetrics;

/// Path the metrics are served on.
pub const METRICS_PATH: &str = "/metrics";

/// Create the axum application serving `metrics`.
pub fn create_app(metrics: Arc<DishMetrics>) -> Router {
    Router::new()
        .route(METRICS_PATH, get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(metrics)
}

/// Serve the metrics endpoint on `listener` until `shutdown` resolves.
pub async fn serve_metrics(
    listener: TcpListener,
    metrics: Arc<DishMetrics>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Serving metrics on http://{}{}", addr, METRICS_PATH);
    }

    axum::serve(listener, create_app(metrics))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ExporterError::web_server_error(format!("Server error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_route_serves_text_format() {
        let metrics = Arc::new(DishMetrics::new().unwrap());
        metrics.requests.inc();
        metrics.gps_sats.set(12.0);

        let response = create_app(metrics)
            .oneshot(Request::get(METRICS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            prometheus::TEXT_FORMAT
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("starlink_exporter_requests 1"));
        assert!(text.contains("starlink_dishy_gps_sats 12"));
    }

    #[tokio::test]
    async fn test_other_routes_are_not_found() {
        let metrics = Arc::new(DishMetrics::new().unwrap());

        let response = create_app(metrics)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
