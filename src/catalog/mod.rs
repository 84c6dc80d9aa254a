//! Built-in ground.news payload schemas
//!
//! Each payload family is a data-only schema file under `schemas/`,
//! embedded at build time and parsed once per process.

use std::sync::OnceLock;

use serde_json::Value;

use crate::schema::{parse_schema, Schema, SchemaError, SchemaLoader, SchemaResult, Transformer};

/// Version under which the embedded schemas are registered
pub const BUILTIN_VERSION: &str = "v1";

/// Payload families served by the ground.news public API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Event summary with bias and factuality breakdowns
    Summary,
    /// Full event record
    Event,
    /// Articles covering a story
    SourcesForWeb,
}

impl Builtin {
    pub const ALL: [Builtin; 3] = [Builtin::Summary, Builtin::Event, Builtin::SourcesForWeb];

    /// Schema identifier
    pub fn id(&self) -> &'static str {
        match self {
            Builtin::Summary => "summary",
            Builtin::Event => "event",
            Builtin::SourcesForWeb => "sources_for_web",
        }
    }

    /// Top-level type of the payload
    pub fn root(&self) -> &'static str {
        match self {
            Builtin::Summary => "Summary",
            Builtin::Event => "Event",
            Builtin::SourcesForWeb => "SourcesForWeb",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Builtin::Summary => include_str!("../../schemas/summary.json"),
            Builtin::Event => include_str!("../../schemas/event.json"),
            Builtin::SourcesForWeb => include_str!("../../schemas/sources_for_web.json"),
        }
    }

    fn cell(&self) -> &'static OnceLock<Result<Schema, String>> {
        static SUMMARY: OnceLock<Result<Schema, String>> = OnceLock::new();
        static EVENT: OnceLock<Result<Schema, String>> = OnceLock::new();
        static SOURCES_FOR_WEB: OnceLock<Result<Schema, String>> = OnceLock::new();

        match self {
            Builtin::Summary => &SUMMARY,
            Builtin::Event => &EVENT,
            Builtin::SourcesForWeb => &SOURCES_FOR_WEB,
        }
    }

    /// The parsed schema, shared for the process lifetime.
    pub fn schema(&self) -> SchemaResult<&'static Schema> {
        let parsed = self.cell().get_or_init(|| {
            let schema = parse_schema(self.source(), self.id()).map_err(|e| e.message().to_string())?;
            schema.validate_structure()?;
            Ok(schema)
        });

        parsed
            .as_ref()
            .map_err(|reason| SchemaError::malformed_schema(self.id(), reason.clone()))
    }

    /// Decodes JSON text and validates it against the root type.
    pub fn cast(&self, json: &str) -> SchemaResult<Value> {
        let raw: Value = serde_json::from_str(json).map_err(SchemaError::invalid_json)?;
        Transformer::new(self.schema()?).validate(&raw, self.root())
    }

    /// Maps an internal value back to wire names and pretty-prints it.
    pub fn uncast(&self, value: &Value) -> SchemaResult<String> {
        let external = Transformer::new(self.schema()?).serialize(value, self.root())?;
        serde_json::to_string_pretty(&external).map_err(SchemaError::invalid_json)
    }
}

/// Registers every built-in schema with the loader.
pub fn register_builtins(loader: &mut SchemaLoader) -> SchemaResult<()> {
    for builtin in Builtin::ALL {
        loader.register(builtin.schema()?.clone())?;
    }
    Ok(())
}

pub fn to_summary(json: &str) -> SchemaResult<Value> {
    Builtin::Summary.cast(json)
}

pub fn summary_to_json(value: &Value) -> SchemaResult<String> {
    Builtin::Summary.uncast(value)
}

pub fn to_event(json: &str) -> SchemaResult<Value> {
    Builtin::Event.cast(json)
}

pub fn event_to_json(value: &Value) -> SchemaResult<String> {
    Builtin::Event.uncast(value)
}

pub fn to_sources_for_web(json: &str) -> SchemaResult<Value> {
    Builtin::SourcesForWeb.cast(json)
}

pub fn sources_for_web_to_json(value: &Value) -> SchemaResult<String> {
    Builtin::SourcesForWeb.uncast(value)
}
