//! Schema HTTP Routes
//!
//! Endpoints for listing schemas and running payloads through them.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::schema::{Direction, SchemaError, SchemaErrorCode, SchemaLoader, SchemaTransformer};

// ==================
// Shared State
// ==================

/// Registry and counters shared across handlers
pub struct SchemaState {
    pub loader: SchemaLoader,
    pub metrics: Arc<MetricsRegistry>,
}

impl SchemaState {
    pub fn new(loader: SchemaLoader, metrics: Arc<MetricsRegistry>) -> Self {
        Self { loader, metrics }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct SchemaSummary {
    pub schema_id: String,
    pub schema_version: String,
    pub root: Option<String>,
    pub types: usize,
}

#[derive(Debug, Serialize)]
pub struct SchemasListResponse {
    pub schemas: Vec<SchemaSummary>,
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransformQuery {
    /// Type to walk from; defaults to the schema root
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
}

// ==================
// Routes
// ==================

/// Create schema routes
pub fn schema_routes(state: Arc<SchemaState>) -> Router {
    Router::new()
        .route("/", get(list_schemas))
        .route("/:id/:version/validate", post(validate_payload))
        .route("/:id/:version/serialize", post(serialize_payload))
        .with_state(state)
}

async fn list_schemas(State(state): State<Arc<SchemaState>>) -> Json<SchemasListResponse> {
    let schemas: Vec<SchemaSummary> = state
        .loader
        .all_schemas()
        .into_iter()
        .map(|s| SchemaSummary {
            schema_id: s.schema_id.clone(),
            schema_version: s.schema_version.clone(),
            root: s.root.clone(),
            types: s.types.len(),
        })
        .collect();

    let total = schemas.len();
    Json(SchemasListResponse { schemas, total })
}

async fn validate_payload(
    State(state): State<Arc<SchemaState>>,
    Path((id, version)): Path<(String, String)>,
    Query(query): Query<TransformQuery>,
    body: Bytes,
) -> Response {
    run(&state, Direction::Decode, &id, &version, query.type_name.as_deref(), &body)
}

async fn serialize_payload(
    State(state): State<Arc<SchemaState>>,
    Path((id, version)): Path<(String, String)>,
    Query(query): Query<TransformQuery>,
    body: Bytes,
) -> Response {
    run(&state, Direction::Encode, &id, &version, query.type_name.as_deref(), &body)
}

fn run(
    state: &SchemaState,
    direction: Direction,
    id: &str,
    version: &str,
    type_name: Option<&str>,
    body: &[u8],
) -> Response {
    let transformer = SchemaTransformer::new(&state.loader);
    let result = serde_json::from_slice::<Value>(body)
        .map_err(SchemaError::invalid_json)
        .and_then(|document| match direction {
            Direction::Decode => {
                transformer.validate_document(id, Some(version), type_name, &document)
            }
            Direction::Encode => {
                transformer.serialize_document(id, Some(version), type_name, &document)
            }
        });

    let ok = result.is_ok();
    let (event, rejected) = match direction {
        Direction::Decode => {
            state.metrics.increment_validations(ok);
            (Event::ValidationComplete, Event::ValidationRejected)
        }
        Direction::Encode => {
            state.metrics.increment_serializations(ok);
            (Event::SerializationComplete, Event::SerializationRejected)
        }
    };

    match result {
        Ok(data) => {
            log_event_with_fields(event, &[("schema", id), ("version", version)]);
            (StatusCode::OK, Json(json!({ "status": "ok", "data": data }))).into_response()
        }
        Err(err) => {
            log_event_with_fields(
                rejected,
                &[("schema", id), ("version", version), ("code", err.code().code())],
            );
            error_response(&err)
        }
    }
}

/// Maps a schema error code to an HTTP status
pub fn status_for(code: SchemaErrorCode) -> StatusCode {
    match code {
        SchemaErrorCode::SchemaValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        SchemaErrorCode::InvalidJson => StatusCode::BAD_REQUEST,
        SchemaErrorCode::UnknownSchema
        | SchemaErrorCode::UnknownSchemaVersion
        | SchemaErrorCode::UnknownType => StatusCode::NOT_FOUND,
        SchemaErrorCode::SchemaImmutable => StatusCode::CONFLICT,
        SchemaErrorCode::MalformedSchema | SchemaErrorCode::SchemaIoFailed => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &SchemaError) -> Response {
    let mut body = json!({
        "status": "error",
        "code": err.code().code(),
        "message": err.message(),
    });
    if let Some(details) = err.details() {
        body["details"] = json!(details);
    }

    (status_for(err.code()), Json(body)).into_response()
}
