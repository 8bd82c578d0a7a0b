//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the single playlists route
//! - Wire up middleware (request ID, HTTP trace logging, timeout, CORS)
//! - Serve on a bound listener until shutdown is signalled

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::enrichment::Aggregator;
use crate::http::{cors, handlers};
use crate::observability::Tracing;
use crate::playlists::PlaylistStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: PlaylistStore,
    pub aggregator: Aggregator,
    pub tracing: Tracing,
}

/// HTTP server for the playlists endpoint.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and state.
    pub fn new(config: &AppConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &AppConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/", get(handlers::list_playlists).options(handlers::preflight))
            .with_state(state);

        let router = router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                ))),
        );

        // Outermost, so timeout responses carry the headers too.
        if config.is_debug() {
            tracing::info!("Debug environment, adding permissive CORS headers");
            cors::permissive(router)
        } else {
            router
        }
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
