//! Schema error types
//!
//! Error codes:
//! - GC_SCHEMA_VALIDATION_FAILED: payload does not match its descriptor
//! - GC_UNKNOWN_SCHEMA / GC_UNKNOWN_SCHEMA_VERSION / GC_UNKNOWN_TYPE
//! - GC_MALFORMED_SCHEMA: schema definition violates its own invariants
//! - GC_SCHEMA_IMMUTABLE: (id, version) already registered
//! - GC_INVALID_JSON: payload text could not be decoded
//! - GC_SCHEMA_IO_FAILED: schema directory could not be read or written

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Payload violates its type descriptor
    SchemaValidationFailed,
    /// Schema ID not found
    UnknownSchema,
    /// Schema version not found
    UnknownSchemaVersion,
    /// Type name not defined in the schema
    UnknownType,
    /// Schema definition is structurally invalid
    MalformedSchema,
    /// Attempt to replace an existing schema
    SchemaImmutable,
    /// Payload text is not JSON
    InvalidJson,
    /// Schema file could not be read or written
    SchemaIoFailed,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SchemaValidationFailed => "GC_SCHEMA_VALIDATION_FAILED",
            SchemaErrorCode::UnknownSchema => "GC_UNKNOWN_SCHEMA",
            SchemaErrorCode::UnknownSchemaVersion => "GC_UNKNOWN_SCHEMA_VERSION",
            SchemaErrorCode::UnknownType => "GC_UNKNOWN_TYPE",
            SchemaErrorCode::MalformedSchema => "GC_MALFORMED_SCHEMA",
            SchemaErrorCode::SchemaImmutable => "GC_SCHEMA_IMMUTABLE",
            SchemaErrorCode::InvalidJson => "GC_INVALID_JSON",
            SchemaErrorCode::SchemaIoFailed => "GC_SCHEMA_IO_FAILED",
        }
    }

    /// Returns true for errors caused by the payload rather than the schema set
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SchemaErrorCode::SchemaValidationFailed | SchemaErrorCode::InvalidJson
        )
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// First structural mismatch found while walking a payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Enclosing type name, when the value sits inside a named object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Object key holding the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Location from the root (e.g. "summary.sources[2].date"); empty at the root
    pub path: String,
    /// Expected type description
    pub expected: String,
    /// Offending value; `None` when the key was missing
    pub actual: Option<Value>,
}

impl ValidationError {
    /// Renders the offending value the way it would appear in JSON
    pub fn actual_text(&self) -> String {
        match &self.actual {
            Some(value) => value.to_string(),
            None => "undefined".to_string(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid value")?;
        if let Some(key) = &self.key {
            write!(f, " for key \"{}\"", key)?;
        }
        if let Some(context) = &self.context {
            write!(f, " on {}", context)?;
        }
        write!(f, ". Expected {} but got {}", self.expected, self.actual_text())
    }
}

/// Schema error type with full context
#[derive(Debug)]
pub struct SchemaError {
    /// Error code
    code: SchemaErrorCode,
    /// Human-readable message
    message: String,
    /// Schema ID if applicable
    schema_id: Option<String>,
    /// Schema version if applicable
    schema_version: Option<String>,
    /// Validation details if applicable
    details: Option<ValidationError>,
}

impl SchemaError {
    fn new(code: SchemaErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            schema_id: None,
            schema_version: None,
            details: None,
        }
    }

    /// Create an unknown schema error
    pub fn unknown_schema(schema_id: impl Into<String>) -> Self {
        let id = schema_id.into();
        let mut err = Self::new(
            SchemaErrorCode::UnknownSchema,
            format!("Schema '{}' not found", id),
        );
        err.schema_id = Some(id);
        err
    }

    /// Create an unknown schema version error
    pub fn unknown_version(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        let id = schema_id.into();
        let ver = version.into();
        let mut err = Self::new(
            SchemaErrorCode::UnknownSchemaVersion,
            format!("Schema '{}' version '{}' not found", id, ver),
        );
        err.schema_id = Some(id);
        err.schema_version = Some(ver);
        err
    }

    /// Create an error for a schema that has several versions and none was named
    pub fn ambiguous_version(schema_id: impl Into<String>, versions: &[&str]) -> Self {
        let id = schema_id.into();
        let mut err = Self::new(
            SchemaErrorCode::UnknownSchemaVersion,
            format!(
                "Schema '{}' has several versions ({}); name one explicitly",
                id,
                versions.join(", ")
            ),
        );
        err.schema_id = Some(id);
        err
    }

    /// Create an unknown type error
    pub fn unknown_type(
        schema_id: impl Into<String>,
        schema_version: impl Into<String>,
        type_name: &str,
    ) -> Self {
        let id = schema_id.into();
        let mut err = Self::new(
            SchemaErrorCode::UnknownType,
            format!("Type '{}' is not defined in schema '{}'", type_name, id),
        );
        err.schema_id = Some(id);
        err.schema_version = Some(schema_version.into());
        err
    }

    /// Create a validation failed error
    pub fn validation_failed(
        schema_id: impl Into<String>,
        schema_version: impl Into<String>,
        details: ValidationError,
    ) -> Self {
        let mut err = Self::new(SchemaErrorCode::SchemaValidationFailed, details.to_string());
        err.schema_id = Some(schema_id.into());
        err.schema_version = Some(schema_version.into());
        err.details = Some(details);
        err
    }

    /// Create a schema immutable error
    pub fn schema_immutable(schema_id: impl Into<String>, version: impl Into<String>) -> Self {
        let id = schema_id.into();
        let ver = version.into();
        let mut err = Self::new(
            SchemaErrorCode::SchemaImmutable,
            format!("Schema '{}' version '{}' is already registered", id, ver),
        );
        err.schema_id = Some(id);
        err.schema_version = Some(ver);
        err
    }

    /// Create an error for a malformed schema definition
    pub fn malformed_schema(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            SchemaErrorCode::MalformedSchema,
            format!("Malformed schema '{}': {}", origin.into(), reason.into()),
        )
    }

    /// Create an error for payload text that is not JSON
    pub fn invalid_json(reason: impl fmt::Display) -> Self {
        Self::new(SchemaErrorCode::InvalidJson, format!("Invalid JSON: {}", reason))
    }

    /// Create an error for a failed schema file operation
    pub fn io_failed(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::new(
            SchemaErrorCode::SchemaIoFailed,
            format!("Schema file '{}': {}", path.into(), reason),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the schema ID if applicable
    pub fn schema_id(&self) -> Option<&str> {
        self.schema_id.as_deref()
    }

    /// Returns the schema version if applicable
    pub fn schema_version(&self) -> Option<&str> {
        self.schema_version.as_deref()
    }

    /// Returns validation details if applicable
    pub fn details(&self) -> Option<&ValidationError> {
        self.details.as_ref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
