//! Schema subsystem for groundcast
//!
//! A schema is static, immutable configuration: a table of named type
//! descriptors built once and reused for every call. Payloads are walked
//! against it in either direction.
//!
//! # Design Principles
//!
//! - One generic transformer; each payload family is data only
//! - Fail-fast: the first mismatch aborts the walk
//! - Union members are tried in order, first match wins
//! - Field lookup maps are built with the descriptor, never lazily

mod errors;
mod loader;
mod transformer;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, ValidationError};
pub use loader::{parse_schema, SchemaLoader};
pub use transformer::{format_date, parse_date, Direction, SchemaTransformer, Transformer};
pub use types::{FieldDescriptor, ObjectType, PrimitiveKind, Schema, TypeDescriptor};
