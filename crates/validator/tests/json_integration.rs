//! Integration tests for the serde_json bridge: JSON input, JSON issue
//! reports and JSON configuration.

use pretty_assertions::assert_eq;
use serde_json::json;
use strata_validator::prelude::*;

fn config_schema() -> Schema {
    object! {
        "server" => object! {
            "host" => string(),
            "port" => number().with_default(8080),
        },
        "replicas" => array(object! {
            "url" => string(),
            "weight" => number().optional(),
        }),
        "mode" => union([literal("primary"), literal("standby")]),
    }
    .into()
}

// ============================================================================
// JSON INPUT
// ============================================================================

#[test]
fn validates_json_documents() {
    let data = Value::from(json!({
        "server": { "host": "localhost", "port": 9000 },
        "replicas": [{ "url": "a" }, { "url": "b", "weight": 2 }],
        "mode": "primary"
    }));

    let output = config_schema().parse(&data).unwrap();
    assert!(output.ptr_eq(&data));
}

#[test]
fn injected_defaults_serialize_back_to_json() {
    let data = Value::from(json!({
        "server": { "host": "localhost" },
        "replicas": [],
        "mode": "standby"
    }));

    let output = config_schema().parse(&data).unwrap();
    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        json!({
            "server": { "host": "localhost", "port": 8080 },
            "replicas": [],
            "mode": "standby"
        })
    );
}

// ============================================================================
// ISSUE REPORTS
// ============================================================================

#[test]
fn issues_serialize_with_code_and_path() {
    let data = Value::from(json!({
        "server": { "host": 1 },
        "replicas": [{ "url": "a" }, { "weight": "heavy" }],
        "mode": "backup",
        "debug": true
    }));

    let err = config_schema().parse(&data).unwrap_err();
    assert_eq!(
        serde_json::to_value(err.issues()).unwrap(),
        json!([
            { "path": ["server", "host"], "code": "invalid_type", "expected": ["string"] },
            { "path": ["replicas", 1], "code": "missing_key", "key": "url" },
            { "path": ["replicas", 1, "weight"], "code": "invalid_type", "expected": ["number"] },
            { "path": ["mode"], "code": "invalid_literal", "expected": ["primary", "standby"] },
            { "path": [], "code": "unrecognized_key", "key": "debug" }
        ])
    );
    assert_eq!(err.to_string(), "invalid_type at .server.host (expected string)");
}

#[test]
fn union_and_custom_issues_serialize() {
    let schema = union([
        object! { "id" => number() }.into(),
        object! { "id" => number().assert(|_| false) }.into(),
    ]);
    let err = schema.parse(&Value::from(json!({ "id": "7" }))).unwrap_err();
    assert_eq!(
        serde_json::to_value(err.issues()).unwrap(),
        json!([{
            "path": [],
            "code": "invalid_union",
            "issues": [
                { "path": ["id"], "code": "invalid_type", "expected": ["number"] },
                { "path": ["id"], "code": "invalid_type", "expected": ["number"] }
            ]
        }])
    );

    let err = schema.parse(&Value::from(json!({ "id": 7 })));
    assert!(err.is_ok());

    let custom = number()
        .assert_with(|_| false, CustomError::from("too big").with_path(["limit"]))
        .parse(&Value::from(json!(1)))
        .unwrap_err();
    assert_eq!(
        serde_json::to_value(custom.issues()).unwrap(),
        json!([{ "path": ["limit"], "code": "custom_error", "message": "too big" }])
    );
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn parse_options_load_from_json() {
    #[derive(serde::Deserialize)]
    struct AppConfig {
        #[serde(default)]
        validation: ParseOptions,
    }

    let config: AppConfig =
        serde_json::from_value(json!({ "validation": { "mode": "strip" } })).unwrap();
    assert_eq!(config.validation.mode, ParseMode::Strip);

    let data = Value::from(json!({
        "server": { "host": "h", "port": 1, "tls": true },
        "replicas": [],
        "mode": "primary"
    }));
    let output = config_schema().parse_with(&data, &config.validation).unwrap();
    assert_eq!(
        serde_json::to_value(&output).unwrap(),
        json!({ "server": { "host": "h", "port": 1 }, "replicas": [], "mode": "primary" })
    );

    let config: AppConfig = serde_json::from_value(json!({})).unwrap();
    assert_eq!(config.validation, ParseOptions::strict());
}
