//! Built-in Payload Tests
//!
//! Realistic ground.news payloads through the embedded schemas:
//! - A complete summary validates and serializes back unchanged
//! - Each kind of mismatch is reported with its key, enclosing type and path
//! - Malformed JSON text is rejected before any walk

use groundcast::catalog::{self, Builtin};
use groundcast::schema::{SchemaErrorCode, SchemaLoader, SchemaTransformer};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

const SUMMARY_FIXTURE: &str = include_str!("fixtures/summary.json");

fn summary_fixture() -> Value {
    serde_json::from_str(SUMMARY_FIXTURE).unwrap()
}

fn expect_rejection(payload: &Value) -> groundcast::schema::ValidationError {
    let err = catalog::to_summary(&payload.to_string()).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::SchemaValidationFailed);
    assert_eq!(err.schema_id(), Some("summary"));
    err.details().cloned().unwrap()
}

// =============================================================================
// Summary
// =============================================================================

#[test]
fn test_full_summary_validates() {
    let value = catalog::to_summary(SUMMARY_FIXTURE).unwrap();

    assert_eq!(value["summary"]["sourceCount"], 42);
    assert_eq!(value["summary"]["interests"][0]["type"], "place");
    assert!(value["summary"]["interests"][1].get("type").is_none());
    assert_eq!(value["summary"]["sources"][1]["date"], Value::Null);
    assert_eq!(value["summary"]["latestMedia"]["youtubeEmbed"], Value::Null);
}

#[test]
fn test_full_summary_round_trips() {
    let value = catalog::to_summary(SUMMARY_FIXTURE).unwrap();
    let text = catalog::summary_to_json(&value).unwrap();

    let reparsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(reparsed, summary_fixture());
    assert_eq!(catalog::to_summary(&text).unwrap(), value);
}

#[test]
fn test_serialized_summary_is_pretty_printed() {
    let value = catalog::to_summary(SUMMARY_FIXTURE).unwrap();
    let text = catalog::summary_to_json(&value).unwrap();
    assert!(text.contains('\n'));
}

#[test]
fn test_summary_dates_are_normalized() {
    let mut payload = summary_fixture();
    payload["summary"]["start"] = json!("2024-01-15T12:00:00+02:00");

    let value = catalog::to_summary(&payload.to_string()).unwrap();
    assert_eq!(value["summary"]["start"], "2024-01-15T10:00:00.000Z");
}

#[test]
fn test_nested_type_mismatch() {
    let mut payload = summary_fixture();
    payload["summary"]["latestMedia"]["width"] = json!("wide");

    let details = expect_rejection(&payload);
    assert_eq!(details.key.as_deref(), Some("width"));
    assert_eq!(details.context.as_deref(), Some("Media"));
    assert_eq!(details.path, "summary.latestMedia.width");
    assert_eq!(details.expected, "number");
    assert_eq!(details.actual, Some(json!("wide")));
}

#[test]
fn test_missing_required_field() {
    let mut payload = summary_fixture();
    payload["summary"].as_object_mut().unwrap().remove("title");

    let details = expect_rejection(&payload);
    assert_eq!(details.key.as_deref(), Some("title"));
    assert_eq!(details.context.as_deref(), Some("SummaryClass"));
    assert_eq!(details.expected, "string");
    assert!(details.actual.is_none());
    assert!(details.to_string().ends_with("but got undefined"));
}

#[test]
fn test_undeclared_field_rejected() {
    let mut payload = summary_fixture();
    payload["summary"]["place"]["population"] = json!(38_000_000);

    let details = expect_rejection(&payload);
    assert_eq!(details.key.as_deref(), Some("population"));
    assert_eq!(details.context.as_deref(), Some("Place"));
    assert_eq!(details.expected, "nothing");
}

#[test]
fn test_enum_outside_set_rejected() {
    let mut payload = summary_fixture();
    payload["summary"]["interests"][0]["type"] = json!("planet");

    let details = expect_rejection(&payload);
    assert_eq!(details.key.as_deref(), Some("type"));
    assert_eq!(details.context.as_deref(), Some("Interest"));
    assert_eq!(details.path, "summary.interests[0].type");
    assert_eq!(details.expected, "an optional Type");
}

#[test]
fn test_optional_field_with_wrong_type() {
    let mut payload = summary_fixture();
    payload["summary"]["sources"][0]["sourceInfo"]["bias"] = json!(3);

    let details = expect_rejection(&payload);
    assert_eq!(details.path, "summary.sources[0].sourceInfo.bias");
    assert_eq!(details.expected, "an optional string");
}

#[test]
fn test_null_marker_rejects_values() {
    let mut payload = summary_fixture();
    payload["summary"]["sources"][0]["articleId"] = json!("a-1");

    let details = expect_rejection(&payload);
    assert_eq!(details.key.as_deref(), Some("articleId"));
    assert_eq!(details.context.as_deref(), Some("Source"));
    assert_eq!(details.expected, "null");
}

#[test]
fn test_first_mismatch_wins() {
    let mut payload = summary_fixture();
    payload["summary"]["biasSourceCount"] = json!("many");
    payload["summary"]["sourceCount"] = json!("many");

    let details = expect_rejection(&payload);
    assert_eq!(details.key.as_deref(), Some("biasSourceCount"));
}

#[test]
fn test_malformed_json_text() {
    let err = catalog::to_summary("{\"summary\": ").unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::InvalidJson);
}

// =============================================================================
// Other Payload Families
// =============================================================================

#[test]
fn test_sources_for_web_requires_object_root() {
    let err = catalog::to_sources_for_web("[]").unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::SchemaValidationFailed);
    assert_eq!(err.details().unwrap().expected, "SourcesForWeb");
}

#[test]
fn test_event_rejects_empty_object() {
    let err = catalog::to_event("{}").unwrap_err();
    let details = err.details().unwrap();
    assert_eq!(details.key.as_deref(), Some("event"));
    assert_eq!(details.context.as_deref(), Some("Event"));
    assert_eq!(details.expected, "EventClass");
}

#[test]
fn test_every_builtin_parses() {
    for builtin in Builtin::ALL {
        let schema = builtin.schema().unwrap();
        assert_eq!(schema.schema_id, builtin.id());
        assert_eq!(schema.root.as_deref(), Some(builtin.root()));
        assert!(schema.validate_structure().is_ok());
    }
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn test_registry_resolves_builtin_without_version() {
    let mut loader = SchemaLoader::new();
    catalog::register_builtins(&mut loader).unwrap();

    let transformer = SchemaTransformer::new(&loader);
    let value = transformer
        .validate_document("summary", None, None, &summary_fixture())
        .unwrap();
    assert_eq!(value, catalog::to_summary(SUMMARY_FIXTURE).unwrap());
}

#[test]
fn test_registry_walks_from_named_type() {
    let mut loader = SchemaLoader::new();
    catalog::register_builtins(&mut loader).unwrap();

    let transformer = SchemaTransformer::new(&loader);
    let place = json!({ "id": "p-1", "name": "Lagos", "type": "city" });
    let value = transformer
        .validate_document("summary", Some("v1"), Some("Place"), &place)
        .unwrap();
    assert_eq!(value, place);

    let err = transformer
        .validate_document("summary", Some("v1"), Some("Planet"), &place)
        .unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::UnknownType);
}

#[test]
fn test_registering_builtins_twice_is_rejected() {
    let mut loader = SchemaLoader::new();
    catalog::register_builtins(&mut loader).unwrap();

    let err = catalog::register_builtins(&mut loader).unwrap_err();
    assert_eq!(err.code(), SchemaErrorCode::SchemaImmutable);
}
