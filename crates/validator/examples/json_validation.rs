//! Validating JSON data with strata-validator.
//!
//! Run: `RUST_LOG=strata_validator=debug cargo run -p strata-validator --example json_validation`

use serde_json::json;
use strata_validator::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    primitive_validation();
    event_routing();
    config_with_defaults();
    error_reporting();
}

/// Primitive schemas against raw JSON values.
fn primitive_validation() {
    println!("=== Primitive Validation ===\n");

    let port = number().assert(|v| v.as_f64().is_some_and(|n| (1.0..=65535.0).contains(&n)));
    for input in [json!(8080), json!(0), json!("8080")] {
        let result = port.parse(&Value::from(input.clone()));
        println!("port on {input}: {}", status(&result));
    }

    println!();
}

/// A tagged union: the `type` key picks the alternative to run.
fn event_routing() {
    println!("=== Event Routing ===\n");

    let event = union([
        object! { "type" => literal("click"), "x" => number(), "y" => number() }.into(),
        object! { "type" => literal("key"), "code" => string() }.into(),
        object! { "type" => literal("scroll"), "delta" => number() }.into(),
    ]);

    let inputs = [
        json!({ "type": "click", "x": 10, "y": 20 }),
        json!({ "type": "key", "code": 13 }),
        json!({ "type": "hover" }),
        json!({ "x": 1 }),
    ];
    for input in inputs {
        let result = event.parse(&Value::from(input.clone()));
        println!("{input}\n  -> {}", status(&result));
    }

    println!();
}

/// Defaults fill in missing keys; strip mode drops unknown ones.
fn config_with_defaults() {
    println!("=== Config With Defaults ===\n");

    let config = object! {
        "host" => string(),
        "port" => number().with_default(8080),
        "tags" => array(string()).with_default(Value::array([])),
    };

    let input = Value::from(json!({ "host": "localhost", "legacy": true }));
    match config.parse_with(&input, &ParseOptions::strip()) {
        Ok(output) => println!("normalized: {}", serde_json::to_string(&output).unwrap_or_default()),
        Err(err) => println!("invalid: {err}"),
    }

    println!();
}

/// Full issue list as JSON.
fn error_reporting() {
    println!("=== Error Reporting ===\n");

    let user = object! {
        "name" => string(),
        "emails" => array(string().assert_with(
            |v| v.as_str().is_some_and(|s| s.contains('@')),
            "must contain @",
        )),
    };

    let input = Value::from(json!({ "emails": ["a@b.c", "nope", 7] }));
    if let Err(err) = user.parse(&input) {
        println!("message: {err}");
        println!(
            "issues:  {}",
            serde_json::to_string_pretty(err.issues()).unwrap_or_default()
        );
    }
}

fn status(result: &Result<Value, ParseError>) -> String {
    match result {
        Ok(_) => "valid".to_owned(),
        Err(err) => format!("invalid ({err})"),
    }
}
