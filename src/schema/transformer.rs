//! Typed JSON transformer
//!
//! One recursive walk drives both directions:
//! - decode (`validate`): external field names are replaced by internal ones
//! - encode (`serialize`): internal names are mapped back to external ones
//!
//! The walk is fail-fast: the first mismatch aborts it. Union members are
//! tried in order and the first one that succeeds wins; failures of the
//! other members are discarded. Missing object keys are walked as absent
//! (`None`) and an absent result leaves the key out of the output.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult, ValidationError};
use super::loader::SchemaLoader;
use super::types::{FieldDescriptor, ObjectType, Schema, TypeDescriptor};

/// Which way field names are mapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Wire JSON to internal names
    Decode,
    /// Internal names back to wire JSON
    Encode,
}

impl Direction {
    fn source_name<'f>(&self, field: &'f FieldDescriptor) -> &'f str {
        match self {
            Direction::Decode => &field.external,
            Direction::Encode => field.internal_name(),
        }
    }

    fn target_name<'f>(&self, field: &'f FieldDescriptor) -> &'f str {
        match self {
            Direction::Decode => field.internal_name(),
            Direction::Encode => &field.external,
        }
    }

    fn declares(&self, object: &ObjectType, key: &str) -> bool {
        match self {
            Direction::Decode => object.field_by_external(key).is_some(),
            Direction::Encode => object.field_by_internal(key).is_some(),
        }
    }
}

/// Walk failure before it is tied to a schema id
enum Failure {
    Invalid(ValidationError),
    MissingType(String),
}

/// Where in the payload the walk currently is
struct Site<'a> {
    key: Option<&'a str>,
    context: Option<&'a str>,
    path: &'a str,
}

impl<'a> Site<'a> {
    fn root() -> Self {
        Site {
            key: None,
            context: None,
            path: "",
        }
    }

    /// Same location with no key or enclosing type, as seen by array elements and union members
    fn detached(path: &'a str) -> Self {
        Site {
            key: None,
            context: None,
            path,
        }
    }
}

/// Transformer bound to a single schema.
///
/// The schema is read-only; one transformer can be shared across threads.
pub struct Transformer<'a> {
    schema: &'a Schema,
}

impl<'a> Transformer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Validates `raw` against `root_type`, renaming external fields to internal names.
    pub fn validate(&self, raw: &Value, root_type: &str) -> SchemaResult<Value> {
        self.run(Direction::Decode, raw, root_type)
    }

    /// Walks `value` against `root_type`, renaming internal fields back to external names.
    pub fn serialize(&self, value: &Value, root_type: &str) -> SchemaResult<Value> {
        self.run(Direction::Encode, value, root_type)
    }

    /// Runs the walk in the given direction from a named root type.
    pub fn run(&self, direction: Direction, value: &Value, root_type: &str) -> SchemaResult<Value> {
        let (id, version) = self.schema.key();
        if self.schema.resolve(root_type).is_none() {
            return Err(SchemaError::unknown_type(id, version, root_type));
        }

        let root = TypeDescriptor::reference(root_type);
        match self.transform(direction, Some(value), &root, &Site::root()) {
            Ok(out) => Ok(out.unwrap_or(Value::Null)),
            Err(Failure::Invalid(details)) => Err(SchemaError::validation_failed(id, version, details)),
            Err(Failure::MissingType(name)) => Err(SchemaError::unknown_type(id, version, &name)),
        }
    }

    fn transform(
        &self,
        direction: Direction,
        value: Option<&Value>,
        descriptor: &TypeDescriptor,
        site: &Site<'_>,
    ) -> Result<Option<Value>, Failure> {
        let mut descriptor = descriptor;
        let mut context: Option<&str> = None;
        while let TypeDescriptor::Reference { name } = descriptor {
            descriptor = self
                .schema
                .resolve(name)
                .ok_or_else(|| Failure::MissingType(name.clone()))?;
            context = Some(name);
        }

        let invalid = |expected: String| Failure::Invalid(invalid_value(site, expected, value));

        match descriptor {
            TypeDescriptor::Any => Ok(value.cloned()),
            TypeDescriptor::Null => match value {
                Some(Value::Null) => Ok(Some(Value::Null)),
                _ => Err(invalid(descriptor.describe())),
            },
            TypeDescriptor::Invalid => Err(invalid(descriptor.describe())),
            TypeDescriptor::Absent => match value {
                None => Ok(None),
                Some(_) => Err(invalid(descriptor.describe())),
            },
            TypeDescriptor::Enum { values } => match value {
                Some(Value::String(s)) if values.iter().any(|v| v == s) => Ok(value.cloned()),
                _ => Err(invalid(descriptor.describe())),
            },
            TypeDescriptor::Union { members } => {
                for member in members {
                    match self.transform(direction, value, member, &Site::detached(site.path)) {
                        Ok(out) => return Ok(out),
                        Err(Failure::Invalid(_)) => continue,
                        Err(missing) => return Err(missing),
                    }
                }
                Err(invalid(descriptor.describe()))
            }
            TypeDescriptor::Array { items } => {
                let Some(Value::Array(elements)) = value else {
                    return Err(invalid("array".to_string()));
                };
                let mut out = Vec::with_capacity(elements.len());
                for (i, element) in elements.iter().enumerate() {
                    let path = format!("{}[{}]", site.path, i);
                    let transformed =
                        self.transform(direction, Some(element), items, &Site::detached(&path))?;
                    // A present element only comes back absent through `any`, which it is not
                    out.push(transformed.unwrap_or(Value::Null));
                }
                Ok(Some(Value::Array(out)))
            }
            TypeDescriptor::Object(object) => {
                let Some(Value::Object(map)) = value else {
                    return Err(invalid(context.unwrap_or("object").to_string()));
                };
                self.transform_object(direction, object, map, context, site.path)
                    .map(|out| Some(Value::Object(out)))
            }
            TypeDescriptor::Date => match value {
                Some(Value::Null) => Ok(Some(Value::Null)),
                Some(Value::String(text)) => match parse_date(text) {
                    Some(date) => Ok(Some(Value::String(format_date(&date)))),
                    None => Err(invalid("Date".to_string())),
                },
                _ => Err(invalid("Date".to_string())),
            },
            TypeDescriptor::Primitive { of } => match value {
                Some(v) if of.matches(v) => Ok(Some(v.clone())),
                _ => Err(invalid(of.type_name().to_string())),
            },
            TypeDescriptor::Reference { .. } => unreachable!("references resolved above"),
        }
    }

    fn transform_object(
        &self,
        direction: Direction,
        object: &ObjectType,
        map: &Map<String, Value>,
        context: Option<&str>,
        path: &str,
    ) -> Result<Map<String, Value>, Failure> {
        let mut out = Map::new();

        for field in object.fields() {
            let source = direction.source_name(field);
            let field_path = make_path(path, source);
            let site = Site {
                key: Some(source),
                context,
                path: &field_path,
            };
            if let Some(v) = self.transform(direction, map.get(source), &field.field_type, &site)? {
                out.insert(direction.target_name(field).to_string(), v);
            }
        }

        for (key, v) in map {
            if direction.declares(object, key) {
                continue;
            }
            let field_path = make_path(path, key);
            let site = Site {
                key: Some(key),
                context,
                path: &field_path,
            };
            if let Some(v) = self.transform(direction, Some(v), object.additional(), &site)? {
                out.insert(key.clone(), v);
            }
        }

        Ok(out)
    }
}

/// Transformer backed by a schema registry.
///
/// Looks up the schema by (id, version), defaults the type to the schema's
/// root, and delegates to [`Transformer`].
pub struct SchemaTransformer<'a> {
    loader: &'a SchemaLoader,
}

impl<'a> SchemaTransformer<'a> {
    /// Creates a new transformer backed by the given schema loader.
    pub fn new(loader: &'a SchemaLoader) -> Self {
        Self { loader }
    }

    /// Validates a payload, producing the renamed internal value.
    ///
    /// # Errors
    ///
    /// - GC_UNKNOWN_SCHEMA / GC_UNKNOWN_SCHEMA_VERSION if the schema is not registered
    /// - GC_UNKNOWN_TYPE if `type_name` (or the schema root) is not defined
    /// - GC_SCHEMA_VALIDATION_FAILED on the first mismatch
    pub fn validate_document(
        &self,
        schema_id: &str,
        schema_version: Option<&str>,
        type_name: Option<&str>,
        document: &Value,
    ) -> SchemaResult<Value> {
        self.run(Direction::Decode, schema_id, schema_version, type_name, document)
    }

    /// Serializes an internal value back to wire field names.
    pub fn serialize_document(
        &self,
        schema_id: &str,
        schema_version: Option<&str>,
        type_name: Option<&str>,
        value: &Value,
    ) -> SchemaResult<Value> {
        self.run(Direction::Encode, schema_id, schema_version, type_name, value)
    }

    fn run(
        &self,
        direction: Direction,
        schema_id: &str,
        schema_version: Option<&str>,
        type_name: Option<&str>,
        value: &Value,
    ) -> SchemaResult<Value> {
        let schema = self.loader.resolve(schema_id, schema_version)?;
        let root = type_name
            .or(schema.root.as_deref())
            .ok_or_else(|| SchemaError::unknown_type(&schema.schema_id, &schema.schema_version, "<root>"))?;

        Transformer::new(schema).run(direction, value, root)
    }
}

/// Parses the date forms accepted for `date` descriptors.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` without offset, and a bare
/// `YYYY-MM-DD`; the last two are taken as UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Normalized text form of a decoded date
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn invalid_value(site: &Site<'_>, expected: String, actual: Option<&Value>) -> ValidationError {
    ValidationError {
        context: site.context.map(str::to_string),
        key: site.key.map(str::to_string),
        path: site.path.to_string(),
        expected,
        actual: actual.cloned(),
    }
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, SchemaErrorCode};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn schema(types: Vec<(&str, TypeDescriptor)>) -> Schema {
        let types: BTreeMap<String, TypeDescriptor> =
            types.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        Schema::new("test", "v1", types)
    }

    fn story_schema() -> Schema {
        schema(vec![
            (
                "Story",
                TypeDescriptor::object(vec![
                    FieldDescriptor::renamed("storyId", "id", TypeDescriptor::string()),
                    FieldDescriptor::new("title", TypeDescriptor::string()),
                    FieldDescriptor::renamed("createdAt", "created", TypeDescriptor::Date),
                    FieldDescriptor::new("tags", TypeDescriptor::array_of(TypeDescriptor::reference("Tag"))),
                    FieldDescriptor::new("bias", TypeDescriptor::optional(TypeDescriptor::reference("Bias"))),
                ]),
            ),
            (
                "Tag",
                TypeDescriptor::object(vec![FieldDescriptor::new("name", TypeDescriptor::string())]),
            ),
            ("Bias", TypeDescriptor::enumeration(["left", "center", "right"])),
        ])
    }

    fn story() -> Value {
        json!({
            "storyId": "s1",
            "title": "Budget passes",
            "createdAt": "2024-03-01T10:00:00Z",
            "tags": [{ "name": "politics" }],
            "bias": "center"
        })
    }

    #[test]
    fn test_decode_renames_fields() {
        let schema = story_schema();
        let out = Transformer::new(&schema).validate(&story(), "Story").unwrap();

        assert_eq!(out["id"], "s1");
        assert_eq!(out["created"], "2024-03-01T10:00:00.000Z");
        assert!(out.get("storyId").is_none());
        assert_eq!(out["tags"][0]["name"], "politics");
    }

    #[test]
    fn test_output_keeps_schema_field_order() {
        let schema = story_schema();
        let input = json!({
            "bias": "left",
            "tags": [],
            "createdAt": "2024-03-01",
            "title": "t",
            "storyId": "s1"
        });
        let out = Transformer::new(&schema).validate(&input, "Story").unwrap();
        let keys: Vec<&str> = out.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["id", "title", "created", "tags", "bias"]);
    }

    #[test]
    fn test_encode_restores_external_names() {
        let schema = story_schema();
        let transformer = Transformer::new(&schema);
        let internal = transformer.validate(&story(), "Story").unwrap();
        let external = transformer.serialize(&internal, "Story").unwrap();

        assert_eq!(external["storyId"], "s1");
        assert_eq!(external["createdAt"], "2024-03-01T10:00:00.000Z");
        assert!(external.get("id").is_none());
    }

    #[test]
    fn test_optional_field_may_be_missing() {
        let schema = story_schema();
        let mut input = story();
        input.as_object_mut().unwrap().remove("bias");

        let out = Transformer::new(&schema).validate(&input, "Story").unwrap();
        assert!(out.get("bias").is_none());
    }

    #[test]
    fn test_optional_field_rejects_null() {
        let schema = story_schema();
        let mut input = story();
        input["bias"] = Value::Null;

        let err = Transformer::new(&schema).validate(&input, "Story").unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.expected, "an optional Bias");
        assert_eq!(details.key.as_deref(), Some("bias"));
        assert_eq!(details.context.as_deref(), Some("Story"));
    }

    #[test]
    fn test_missing_required_field_reports_undefined() {
        let schema = story_schema();
        let mut input = story();
        input.as_object_mut().unwrap().remove("title");

        let err = Transformer::new(&schema).validate(&input, "Story").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::SchemaValidationFailed);
        assert!(err.details().unwrap().actual.is_none());
        assert!(err.message().ends_with("but got undefined"));
    }

    #[test]
    fn test_first_offending_field_is_reported() {
        let schema = story_schema();
        let mut input = story();
        input["title"] = json!(7);
        input["tags"] = json!("nope");

        let err = Transformer::new(&schema).validate(&input, "Story").unwrap_err();
        assert_eq!(err.details().unwrap().key.as_deref(), Some("title"));
    }

    #[test]
    fn test_undeclared_key_rejected_by_default() {
        let schema = story_schema();
        let mut input = story();
        input["extra"] = json!(1);

        let err = Transformer::new(&schema).validate(&input, "Story").unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.key.as_deref(), Some("extra"));
        assert_eq!(details.expected, "nothing");
    }

    #[test]
    fn test_undeclared_key_passes_through_with_any() {
        let schema = schema(vec![(
            "Loose",
            TypeDescriptor::object_with(
                vec![FieldDescriptor::new("a", TypeDescriptor::number())],
                TypeDescriptor::Any,
            ),
        )]);
        let input = json!({ "a": 1, "extra": { "nested": [1, "x", null] } });

        let out = Transformer::new(&schema).validate(&input, "Loose").unwrap();
        assert_eq!(out["extra"], input["extra"]);
    }

    #[test]
    fn test_additional_descriptor_type_checks_unknown_keys() {
        let schema = schema(vec![("Counts", TypeDescriptor::map_of(TypeDescriptor::number()))]);
        let transformer = Transformer::new(&schema);

        assert!(transformer.validate(&json!({ "x": 1, "y": 2.5 }), "Counts").is_ok());
        let err = transformer
            .validate(&json!({ "x": 1, "y": "two" }), "Counts")
            .unwrap_err();
        assert_eq!(err.details().unwrap().key.as_deref(), Some("y"));
    }

    #[test]
    fn test_union_first_match_wins() {
        let schema = schema(vec![
            (
                "Wrapper",
                TypeDescriptor::object(vec![FieldDescriptor::new(
                    "v",
                    TypeDescriptor::union_of(vec![
                        TypeDescriptor::reference("A"),
                        TypeDescriptor::reference("B"),
                    ]),
                )]),
            ),
            (
                "A",
                TypeDescriptor::object_with(
                    vec![FieldDescriptor::renamed("n", "from_a", TypeDescriptor::number())],
                    TypeDescriptor::Any,
                ),
            ),
            (
                "B",
                TypeDescriptor::object_with(
                    vec![FieldDescriptor::renamed("n", "from_b", TypeDescriptor::number())],
                    TypeDescriptor::Any,
                ),
            ),
        ]);

        let out = Transformer::new(&schema)
            .validate(&json!({ "v": { "n": 1 } }), "Wrapper")
            .unwrap();
        assert_eq!(out["v"], json!({ "from_a": 1 }));
    }

    #[test]
    fn test_union_failure_lists_members() {
        let schema = schema(vec![(
            "Id",
            TypeDescriptor::union_of(vec![TypeDescriptor::Null, TypeDescriptor::string()]),
        )]);
        let err = Transformer::new(&schema).validate(&json!(5), "Id").unwrap_err();
        assert_eq!(err.details().unwrap().expected, "one of [null, string]");
    }

    #[test]
    fn test_enum_rejection_lists_literals() {
        let schema = schema(vec![("Side", TypeDescriptor::enumeration(["x", "y"]))]);
        let err = Transformer::new(&schema).validate(&json!("z"), "Side").unwrap_err();
        assert_eq!(err.details().unwrap().expected, "one of [x, y]");
    }

    #[test]
    fn test_date_rejects_numbers() {
        let schema = schema(vec![("When", TypeDescriptor::Date)]);
        let err = Transformer::new(&schema)
            .validate(&json!(1_700_000_000_000u64), "When")
            .unwrap_err();
        assert_eq!(err.details().unwrap().expected, "Date");
    }

    #[test]
    fn test_date_null_passes_through() {
        let schema = schema(vec![("When", TypeDescriptor::Date)]);
        let out = Transformer::new(&schema).validate(&Value::Null, "When").unwrap();
        assert_eq!(out, Value::Null);
    }

    #[test]
    fn test_date_unparseable_string_fails() {
        let schema = schema(vec![("When", TypeDescriptor::Date)]);
        assert!(Transformer::new(&schema)
            .validate(&json!("yesterday"), "When")
            .is_err());
    }

    #[test]
    fn test_date_forms() {
        assert_eq!(
            format_date(&parse_date("2023-10-29T14:03:41.285Z").unwrap()),
            "2023-10-29T14:03:41.285Z"
        );
        assert_eq!(
            format_date(&parse_date("2023-10-29T16:03:41+02:00").unwrap()),
            "2023-10-29T14:03:41.000Z"
        );
        assert_eq!(
            format_date(&parse_date("2023-10-29T14:03:41").unwrap()),
            "2023-10-29T14:03:41.000Z"
        );
        assert_eq!(
            format_date(&parse_date("2023-10-29").unwrap()),
            "2023-10-29T00:00:00.000Z"
        );
        assert!(parse_date("2023-13-45").is_none());
    }

    #[test]
    fn test_null_marker() {
        let schema = schema(vec![("Nothing", TypeDescriptor::Null)]);
        let transformer = Transformer::new(&schema);
        assert_eq!(transformer.validate(&Value::Null, "Nothing").unwrap(), Value::Null);
        assert!(transformer.validate(&json!(""), "Nothing").is_err());
    }

    #[test]
    fn test_any_accepts_everything() {
        let schema = schema(vec![("Blob", TypeDescriptor::Any)]);
        let input = json!([1, { "a": null }]);
        assert_eq!(Transformer::new(&schema).validate(&input, "Blob").unwrap(), input);
    }

    #[test]
    fn test_array_rejects_non_sequence() {
        let schema = schema(vec![("Names", TypeDescriptor::array_of(TypeDescriptor::string()))]);
        let err = Transformer::new(&schema)
            .validate(&json!({ "0": "a" }), "Names")
            .unwrap_err();
        assert_eq!(err.details().unwrap().expected, "array");
    }

    #[test]
    fn test_nested_error_path() {
        let schema = story_schema();
        let mut input = story();
        input["tags"] = json!([{ "name": "a" }, { "name": 2 }]);

        let err = Transformer::new(&schema).validate(&input, "Story").unwrap_err();
        let details = err.details().unwrap();
        assert_eq!(details.path, "tags[1].name");
        assert_eq!(details.context.as_deref(), Some("Tag"));
    }

    #[test]
    fn test_object_error_names_referenced_type() {
        let schema = story_schema();
        let err = Transformer::new(&schema).validate(&json!([]), "Story").unwrap_err();
        assert_eq!(err.details().unwrap().expected, "Story");
    }

    #[test]
    fn test_unknown_root_type() {
        let schema = story_schema();
        let err = Transformer::new(&schema).validate(&story(), "Nope").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnknownType);
    }

    #[test]
    fn test_dangling_reference_fails_immediately() {
        let schema = schema(vec![(
            "Holder",
            TypeDescriptor::union_of(vec![TypeDescriptor::reference("Gone"), TypeDescriptor::Any]),
        )]);
        let err = Transformer::new(&schema).validate(&json!(1), "Holder").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::UnknownType);
        assert!(err.message().contains("Gone"));
    }

    #[test]
    fn test_reference_chains_resolve() {
        let schema = schema(vec![
            ("Alias", TypeDescriptor::reference("Target")),
            ("Target", TypeDescriptor::number()),
        ]);
        assert!(Transformer::new(&schema).validate(&json!(3), "Alias").is_ok());
    }
}
