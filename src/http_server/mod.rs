//! HTTP surface for groundcast
//!
//! - `GET /health`, `GET /metrics`
//! - `GET /schemas`
//! - `POST /schemas/:id/:version/validate[?type=T]`
//! - `POST /schemas/:id/:version/serialize[?type=T]`

mod config;
mod observability_routes;
mod schema_routes;
mod server;

pub use config::HttpServerConfig;
pub use schema_routes::{status_for, SchemaState};
pub use server::HttpServer;
