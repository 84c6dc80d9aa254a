//! Type descriptor definitions
//!
//! A schema is a table of named type descriptors. Descriptors are a closed
//! sum type serialized with a `kind` tag:
//! - primitive: string, number, boolean
//! - any, null, invalid, absent, date
//! - enum: ordered set of string literals
//! - object: ordered field list plus an `additional` descriptor
//! - array, union, ref

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Underlying JSON kind a primitive descriptor expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }

    /// Returns true if the value has exactly this kind
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            PrimitiveKind::String => value.is_string(),
            PrimitiveKind::Number => value.is_number(),
            PrimitiveKind::Boolean => value.is_boolean(),
        }
    }
}

/// A node in the schema tree describing the expected shape of a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// Value kind must match exactly
    Primitive { of: PrimitiveKind },
    /// Accepts anything, including a missing key
    Any,
    /// Explicit null only
    Null,
    /// Always fails
    Invalid,
    /// Matches only a missing object key
    Absent,
    /// ISO-8601 date string (or null)
    Date,
    /// One of a fixed set of string literals
    Enum { values: Vec<String> },
    /// Structural map with renamed fields
    Object(ObjectType),
    /// Homogeneous sequence
    Array { items: Box<TypeDescriptor> },
    /// First matching member wins
    Union { members: Vec<TypeDescriptor> },
    /// Named type resolved through the schema
    #[serde(rename = "ref")]
    Reference { name: String },
}

impl TypeDescriptor {
    pub fn string() -> Self {
        TypeDescriptor::Primitive {
            of: PrimitiveKind::String,
        }
    }

    pub fn number() -> Self {
        TypeDescriptor::Primitive {
            of: PrimitiveKind::Number,
        }
    }

    pub fn boolean() -> Self {
        TypeDescriptor::Primitive {
            of: PrimitiveKind::Boolean,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        TypeDescriptor::Reference { name: name.into() }
    }

    pub fn array_of(items: TypeDescriptor) -> Self {
        TypeDescriptor::Array {
            items: Box::new(items),
        }
    }

    pub fn union_of(members: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Union { members }
    }

    /// Union of absent and `inner`, i.e. a field that may be left out
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Union {
            members: vec![TypeDescriptor::Absent, inner],
        }
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDescriptor::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Object with the given fields that rejects undeclared keys
    pub fn object(fields: Vec<FieldDescriptor>) -> Self {
        TypeDescriptor::Object(ObjectType::new(fields, TypeDescriptor::Invalid))
    }

    /// Object with the given fields whose undeclared keys are checked against `additional`
    pub fn object_with(fields: Vec<FieldDescriptor>, additional: TypeDescriptor) -> Self {
        TypeDescriptor::Object(ObjectType::new(fields, additional))
    }

    /// Free-form map whose values all match `additional`
    pub fn map_of(additional: TypeDescriptor) -> Self {
        TypeDescriptor::Object(ObjectType::new(Vec::new(), additional))
    }

    /// Human-readable expected-type description used in error messages
    pub fn describe(&self) -> String {
        match self {
            TypeDescriptor::Primitive { of } => of.type_name().to_string(),
            TypeDescriptor::Any => "any".to_string(),
            TypeDescriptor::Null => "null".to_string(),
            TypeDescriptor::Invalid => "nothing".to_string(),
            TypeDescriptor::Absent => "undefined".to_string(),
            TypeDescriptor::Date => "Date".to_string(),
            TypeDescriptor::Enum { values } => one_of(values.iter().cloned()),
            TypeDescriptor::Object(_) => "object".to_string(),
            TypeDescriptor::Array { .. } => "array".to_string(),
            TypeDescriptor::Union { members } => match members.as_slice() {
                [TypeDescriptor::Absent, inner] => format!("an optional {}", inner.describe()),
                _ => one_of(members.iter().map(TypeDescriptor::describe)),
            },
            TypeDescriptor::Reference { name } => name.clone(),
        }
    }
}

fn one_of(items: impl Iterator<Item = String>) -> String {
    format!("one of [{}]", items.collect::<Vec<_>>().join(", "))
}

/// Field definition: external (wire) name, internal name, and type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Name as transmitted in JSON
    pub external: String,
    /// Name in decoded values; defaults to `external`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
    /// Field data type
    #[serde(rename = "type")]
    pub field_type: TypeDescriptor,
}

impl FieldDescriptor {
    /// Field whose internal name equals its external name
    pub fn new(external: impl Into<String>, field_type: TypeDescriptor) -> Self {
        Self {
            external: external.into(),
            internal: None,
            field_type,
        }
    }

    /// Field decoded under a different name
    pub fn renamed(
        external: impl Into<String>,
        internal: impl Into<String>,
        field_type: TypeDescriptor,
    ) -> Self {
        Self {
            external: external.into(),
            internal: Some(internal.into()),
            field_type,
        }
    }

    pub fn internal_name(&self) -> &str {
        self.internal.as_deref().unwrap_or(&self.external)
    }
}

/// Object descriptor with name lookup maps built at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ObjectRepr", into = "ObjectRepr")]
pub struct ObjectType {
    fields: Vec<FieldDescriptor>,
    additional: Box<TypeDescriptor>,
    by_external: HashMap<String, usize>,
    by_internal: HashMap<String, usize>,
}

impl ObjectType {
    pub fn new(fields: Vec<FieldDescriptor>, additional: TypeDescriptor) -> Self {
        let by_external = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.external.clone(), i))
            .collect();
        let by_internal = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.internal_name().to_string(), i))
            .collect();

        Self {
            fields,
            additional: Box::new(additional),
            by_external,
            by_internal,
        }
    }

    /// Declared fields in schema order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Descriptor applied to undeclared keys
    pub fn additional(&self) -> &TypeDescriptor {
        &self.additional
    }

    pub fn field_by_external(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_external.get(name).map(|&i| &self.fields[i])
    }

    pub fn field_by_internal(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_internal.get(name).map(|&i| &self.fields[i])
    }

    /// Returns the first external or internal name declared twice, if any
    fn duplicate_name(&self) -> Option<&str> {
        let mut external = HashSet::new();
        let mut internal = HashSet::new();
        self.fields.iter().find_map(|f| {
            if !external.insert(f.external.as_str()) {
                Some(f.external.as_str())
            } else if !internal.insert(f.internal_name()) {
                Some(f.internal_name())
            } else {
                None
            }
        })
    }
}

#[derive(Serialize, Deserialize)]
struct ObjectRepr {
    #[serde(default)]
    fields: Vec<FieldDescriptor>,
    #[serde(default = "invalid_descriptor", skip_serializing_if = "is_invalid")]
    additional: Box<TypeDescriptor>,
}

fn invalid_descriptor() -> Box<TypeDescriptor> {
    Box::new(TypeDescriptor::Invalid)
}

fn is_invalid(descriptor: &TypeDescriptor) -> bool {
    *descriptor == TypeDescriptor::Invalid
}

impl From<ObjectRepr> for ObjectType {
    fn from(repr: ObjectRepr) -> Self {
        ObjectType::new(repr.fields, *repr.additional)
    }
}

impl From<ObjectType> for ObjectRepr {
    fn from(object: ObjectType) -> Self {
        ObjectRepr {
            fields: object.fields,
            additional: object.additional,
        }
    }
}

/// A named, versioned table of type descriptors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique schema identifier
    pub schema_id: String,
    /// Schema version
    pub schema_version: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Type used when a caller does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Type descriptors by name
    pub types: BTreeMap<String, TypeDescriptor>,
}

impl Schema {
    /// Create a new schema
    pub fn new(
        schema_id: impl Into<String>,
        schema_version: impl Into<String>,
        types: BTreeMap<String, TypeDescriptor>,
    ) -> Self {
        Self {
            schema_id: schema_id.into(),
            schema_version: schema_version.into(),
            description: None,
            root: None,
            types,
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the unique key for this schema (id, version)
    pub fn key(&self) -> (&str, &str) {
        (&self.schema_id, &self.schema_version)
    }

    /// Looks up a type descriptor by name
    pub fn resolve(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.types.is_empty() {
            return Err("Schema must define at least one type".into());
        }

        if let Some(root) = &self.root {
            if !self.types.contains_key(root) {
                return Err(format!("Root type '{}' is not defined", root));
            }
        }

        for (name, descriptor) in &self.types {
            self.check_descriptor(descriptor, name)?;
        }

        if let Some(cycle) = self.find_unguarded_cycle() {
            return Err(format!(
                "{}: type refers back to itself without an array or object ({})",
                cycle[0],
                cycle.join(" -> ")
            ));
        }

        Ok(())
    }

    /// Finds a cycle of references and union members that never enters an
    /// array or object. Walking such a cycle consumes no input, so no value
    /// can terminate it.
    fn find_unguarded_cycle(&self) -> Option<Vec<&str>> {
        let edges: BTreeMap<&str, Vec<&str>> = self
            .types
            .iter()
            .map(|(name, descriptor)| {
                let mut targets = Vec::new();
                unguarded_refs(descriptor, &mut targets);
                (name.as_str(), targets)
            })
            .collect();

        let mut finished = HashSet::new();
        edges.keys().find_map(|name| {
            let mut trail = Vec::new();
            visit_unguarded(name, &edges, &mut trail, &mut finished)
        })
    }

    fn check_descriptor(&self, descriptor: &TypeDescriptor, at: &str) -> Result<(), String> {
        match descriptor {
            TypeDescriptor::Reference { name } => {
                if !self.types.contains_key(name) {
                    return Err(format!("{}: reference to undefined type '{}'", at, name));
                }
            }
            TypeDescriptor::Enum { values } => {
                if values.is_empty() {
                    return Err(format!("{}: enum must list at least one value", at));
                }
            }
            TypeDescriptor::Union { members } => {
                if members.is_empty() {
                    return Err(format!("{}: union must have at least one member", at));
                }
                for member in members {
                    self.check_descriptor(member, at)?;
                }
            }
            TypeDescriptor::Array { items } => {
                self.check_descriptor(items, &format!("{}[]", at))?;
            }
            TypeDescriptor::Object(object) => {
                if let Some(dup) = object.duplicate_name() {
                    return Err(format!("{}: field name '{}' declared twice", at, dup));
                }
                for field in object.fields() {
                    self.check_descriptor(&field.field_type, &format!("{}.{}", at, field.external))?;
                }
                self.check_descriptor(object.additional(), &format!("{}.*", at))?;
            }
            TypeDescriptor::Primitive { .. }
            | TypeDescriptor::Any
            | TypeDescriptor::Null
            | TypeDescriptor::Invalid
            | TypeDescriptor::Absent
            | TypeDescriptor::Date => {}
        }

        Ok(())
    }
}

/// Reference targets reachable from `descriptor` through refs and union
/// members alone
fn unguarded_refs<'s>(descriptor: &'s TypeDescriptor, targets: &mut Vec<&'s str>) {
    match descriptor {
        TypeDescriptor::Reference { name } => targets.push(name),
        TypeDescriptor::Union { members } => {
            for member in members {
                unguarded_refs(member, targets);
            }
        }
        _ => {}
    }
}

fn visit_unguarded<'s>(
    name: &'s str,
    edges: &BTreeMap<&'s str, Vec<&'s str>>,
    trail: &mut Vec<&'s str>,
    finished: &mut HashSet<&'s str>,
) -> Option<Vec<&'s str>> {
    if let Some(start) = trail.iter().position(|seen| *seen == name) {
        let mut cycle = trail[start..].to_vec();
        cycle.push(name);
        return Some(cycle);
    }
    if finished.contains(name) {
        return None;
    }

    trail.push(name);
    for next in edges.get(name).into_iter().flatten() {
        if let Some(cycle) = visit_unguarded(next, edges, trail, finished) {
            return Some(cycle);
        }
    }
    trail.pop();
    finished.insert(name);
    None
}
