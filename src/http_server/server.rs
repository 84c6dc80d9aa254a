//! # HTTP Server
//!
//! Combines the schema and observability routers behind one listener.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::observability::{log_event, log_event_with_fields, Event, MetricsRegistry};
use crate::schema::SchemaLoader;

use super::config::HttpServerConfig;
use super::observability_routes::observability_routes;
use super::schema_routes::{schema_routes, SchemaState};

/// HTTP server exposing the schema registry
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over a populated registry
    pub fn new(config: HttpServerConfig, loader: SchemaLoader) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        metrics.add_schemas_loaded(loader.schema_count() as u64);

        let router = Self::build_router(&config, loader, metrics);
        Self { config, router }
    }

    fn build_router(
        config: &HttpServerConfig,
        loader: SchemaLoader,
        metrics: Arc<MetricsRegistry>,
    ) -> Router {
        let schema_state = Arc::new(SchemaState::new(loader, Arc::clone(&metrics)));

        let cors = if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        Router::new()
            .merge(observability_routes(metrics))
            .nest("/schemas", schema_routes(schema_state))
            .layer(cors)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server and serve until ctrl-c
    pub async fn start(self) -> io::Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{}", e)))?;

        let listener = TcpListener::bind(addr).await?;
        let addr_text = addr.to_string();
        log_event_with_fields(Event::Serving, &[("addr", addr_text.as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;

        log_event(Event::ShutdownComplete);
        Ok(())
    }
}
