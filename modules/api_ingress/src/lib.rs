//! HTTP host: owns the outer router (health, static fallback, middleware)
//! and the serve loop. Feature modules contribute their routes through a
//! plain `Router` before [`ApiIngress::finalize`] is called.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::{ApiIngressConfig, DEFAULT_BODY_LIMIT_BYTES, DEFAULT_TIMEOUT_SEC};

pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Router with the host's own endpoints; modules register onto it.
    pub fn base_router(&self) -> Router {
        Router::new().route("/health", get(web::health_check))
    }

    /// Attach the static fallback and the middleware stack.
    pub fn finalize(&self, mut router: Router) -> Router {
        if let Some(dir) = &self.config.static_dir {
            if dir.is_dir() {
                tracing::info!("Serving static files from {}", dir.display());
                router = router.fallback_service(ServeDir::new(dir));
            } else {
                tracing::warn!(
                    "Static directory {} does not exist; fallback disabled",
                    dir.display()
                );
            }
        }

        // Outermost to innermost:
        // SetRequestId -> PropagateRequestId -> Trace -> push_req_id_to_extensions -> Timeout -> CORS -> BodyLimit
        // `layer` wraps everything added so far, so the innermost goes first.
        let x_request_id = request_id::header();

        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));
        if self.config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        router = router
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeout_sec)))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    /// Bind `bind_addr` and serve until `cancel` fires.
    pub async fn serve(&self, router: Router, cancel: CancellationToken) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.config.bind_addr))?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        serve_on(listener, router, cancel).await
    }
}

/// Serve on an already bound listener; returns once in-flight requests drain
/// after cancellation.
pub async fn serve_on(listener: TcpListener, router: Router, cancel: CancellationToken) -> Result<()> {
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    let shutdown = async move {
        cancel.cancelled().await;
        tracing::info!("HTTP server shutting down gracefully (cancellation)");
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
