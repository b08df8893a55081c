//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::WebError;
use crate::server::handlers::{
    health_handler, marquee_handler, report_handler, support_handler, test_handler,
};
use crate::server::state::ServerState;

/// Build the router. Every endpoint also answers on its legacy `.php` path.
pub fn router(options: &ServerOptions, state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Mobile marquee
        .route("/bdj4marquee", get(marquee_handler).post(marquee_handler))
        .route("/bdj4marquee.php", get(marquee_handler).post(marquee_handler))
        // Support uploads
        .route("/bdj4support", get(support_handler).post(support_handler))
        .route("/bdj4support.php", get(support_handler).post(support_handler))
        // Connectivity test
        .route("/bdj4test", get(test_handler).post(test_handler))
        .route("/bdj4test.php", get(test_handler).post(test_handler))
        // Install report
        .route("/bdj4report", get(report_handler))
        .route("/bdj4report.php", get(report_handler))
        // State and middleware
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(options.request_timeout))
                .layer(DefaultBodyLimit::max(options.max_body_bytes)),
        )
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), WebError>>, WebError> {
    let app = router(options, state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| WebError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| WebError::ServerError(e.to_string()))
    });

    Ok(handle)
}
