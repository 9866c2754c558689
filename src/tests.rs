use crate::document::Document;
use crate::error::BclError;
use crate::value::Value;
use crate::{expr, load, parser, printer, query, resolver};

use pretty_assertions::assert_eq;

// ── Shared fixture runners ──────────────────────────────────────────

/// Embed fixture files at compile time.
const RESOLVE_FIXTURES: &str = include_str!("../test-data/fixtures/resolve.json");
const PARSE_ERROR_FIXTURES: &str = include_str!("../test-data/fixtures/parse-errors.json");
const RESOLVE_ERROR_FIXTURES: &str = include_str!("../test-data/fixtures/resolve-errors.json");

/// Compare a document value against a fixture "expected" JSON scalar.
fn value_matches(value: &Value, expected: &serde_json::Value) -> bool {
    match (value, expected) {
        (Value::Int(v), serde_json::Value::Number(n)) => n.as_i64() == Some(*v),
        (Value::Float(v), serde_json::Value::Number(n)) => n.as_f64() == Some(*v),
        (Value::Bool(v), serde_json::Value::Bool(b)) => v == b,
        (Value::Str(s), serde_json::Value::String(e)) => s == e,
        _ => false,
    }
}

#[test]
fn test_fixture_resolve() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(RESOLVE_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();

        let doc = load(input).unwrap_or_else(|err| {
            panic!("Fixture '{}': load failed: {}", name, err);
        });

        for check in fixture["checks"].as_array().unwrap() {
            let path = check["path"].as_str().unwrap();
            let expected = &check["expected"];

            let value = query::find_value(&doc, path).unwrap_or_else(|| {
                panic!("Fixture '{}': path '{}' not found", name, path);
            });
            assert!(
                value_matches(value, expected),
                "Fixture '{}': path '{}' mismatch\n  Got:      {}\n  Expected: {}",
                name,
                path,
                value,
                expected
            );
        }
    }
}

#[test]
fn test_fixture_parse_errors() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(PARSE_ERROR_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();

        match parser::parse(input) {
            Err(BclError::Parse { .. }) => {}
            Err(other) => panic!(
                "Fixture '{}': expected a parse error, got {:?}",
                name, other
            ),
            Ok(_) => panic!(
                "Fixture '{}': expected a parse error for input '{}'",
                name, input
            ),
        }
    }
}

#[test]
fn test_fixture_resolve_errors() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(RESOLVE_ERROR_FIXTURES).unwrap();

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let input = fixture["input"].as_str().unwrap();

        let mut doc = parser::parse(input).unwrap_or_else(|err| {
            panic!("Fixture '{}': unexpected parse error: {}", name, err);
        });
        match resolver::resolve(&mut doc) {
            Err(BclError::Resolve { .. }) => {}
            Err(other) => panic!(
                "Fixture '{}': expected a resolve error, got {:?}",
                name, other
            ),
            Ok(_) => panic!(
                "Fixture '{}': expected a resolve error for input '{}'",
                name, input
            ),
        }
    }
}

// ── Round trip and idempotence ──────────────────────────────────────

const ROUND_TRIP_INPUT: &str = r#"
server "primary" {
    int port = 8080;
    host = "localhost";
    ratio = 0.5;
    marker = 'x';
    flags = { true, false };
    limits {
        int[] steps = { 1, 2, 3 };
    }
}
fallback {
    target = $server["primary"].port;
    local = $.target;
    expr doubled = "2 * 21";
}
"#;

#[test]
fn round_trip_preserves_structure() {
    let first = parser::parse(ROUND_TRIP_INPUT).unwrap();
    let source = printer::to_source(&first);
    let second = parser::parse(&source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn round_trip_of_resolved_document() {
    let first = load(ROUND_TRIP_INPUT).unwrap();
    let source = printer::to_source(&first);
    let second = load(&source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn resolve_is_idempotent() {
    let resolved = load(ROUND_TRIP_INPUT).unwrap();
    let mut again = resolved.clone();
    resolver::resolve(&mut again).unwrap();
    assert_eq!(resolved, again);
}

// ── Scope semantics ─────────────────────────────────────────────────

#[test]
fn global_scope_reaches_across_blocks() {
    let doc = load("A { x = 1; B { y = $A.x; } }").unwrap();
    assert_eq!(query::get_int(&doc, "A.B.y"), Some(1));
}

#[test]
fn local_scope_requires_field_in_own_block() {
    let mut doc = parser::parse("A { x = 1; B { y = $.x; } }").unwrap();
    assert!(resolver::resolve(&mut doc).is_err());

    let doc = load("A { x = 1; B { x = 2; y = $.x; } }").unwrap();
    assert_eq!(query::get_int(&doc, "A.B.y"), Some(2));
}

#[test]
fn parent_scope_searches_enclosing_blocks() {
    let doc = load("A { x = 9; B { C { y = ^x; } } }").unwrap();
    assert_eq!(query::get_int(&doc, "A.B.C.y"), Some(9));
}

#[test]
fn parent_scope_prefers_the_nearest_binding() {
    let doc = load("A { x = 1; B { x = 2; C { y = ^x; } } }").unwrap();
    assert_eq!(query::get_int(&doc, "A.B.C.y"), Some(2));
}

#[test]
fn cyclic_references_report_an_error() {
    let mut doc = parser::parse("A { x = $A.y; y = $A.x; }").unwrap();
    let err = resolver::resolve(&mut doc).unwrap_err();
    assert!(matches!(err, BclError::Resolve { .. }));
    assert!(err.to_string().contains("did not settle"));
}

// ── Path queries and typed getters ──────────────────────────────────

fn sample() -> Document {
    load(
        r#"
        net {
            nums = { 1, 2, 3 };
            scale = 1.5;
            count = 4;
            name = "edge";
            up = true;
        }
        "#,
    )
    .unwrap()
}

#[test]
fn array_index_in_query_path() {
    let doc = sample();
    assert_eq!(query::get_int(&doc, "net.nums[1]"), Some(2));
    assert_eq!(query::get_int(&doc, "net.nums[3]"), None);
}

#[test]
fn typed_getters_enforce_tags() {
    let doc = sample();
    assert_eq!(query::get_int(&doc, "net.count"), Some(4));
    assert_eq!(query::get_int(&doc, "net.scale"), None);
    assert_eq!(query::get_float(&doc, "net.scale"), Some(1.5));
    assert_eq!(query::get_float(&doc, "net.count"), Some(4.0));
    assert_eq!(query::get_bool(&doc, "net.up"), Some(true));
    assert_eq!(query::get_string(&doc, "net.name"), Some("edge"));
    assert_eq!(query::get_string(&doc, "net.count"), None);
}

#[test]
fn queries_miss_quietly() {
    let doc = sample();
    assert_eq!(query::find_value(&doc, "net.absent"), None);
    assert_eq!(query::find_value(&doc, "nowhere.x"), None);
    assert_eq!(query::find_value(&doc, "net"), None);
    assert_eq!(query::find_value(&doc, ""), None);
    assert_eq!(query::find_value(&doc, "net..x"), None);
    assert_eq!(query::find_value(&doc, "net.nums[bad]"), None);
}

// ── Expression sub-language ─────────────────────────────────────────

#[test]
fn expr_arithmetic() {
    assert_eq!(expr::evaluate("1 + 2"), Some("3".to_string()));
    assert_eq!(expr::evaluate("2 + 3 * 4"), Some("14".to_string()));
    assert_eq!(expr::evaluate("(2 + 3) * 4"), Some("20".to_string()));
    assert_eq!(expr::evaluate("-5 + 2"), Some("-3".to_string()));
    assert_eq!(expr::evaluate("7 % 3"), Some("1".to_string()));
}

#[test]
fn expr_division_promotes_and_guards() {
    assert_eq!(expr::evaluate("7 / 2"), Some("3".to_string()));
    assert_eq!(expr::evaluate("7.0 / 2"), Some("3.5".to_string()));
    assert_eq!(expr::evaluate("1 / 0"), None);
    assert_eq!(expr::evaluate("1 % 0"), None);
}

#[test]
fn expr_strings_and_comparison() {
    assert_eq!(expr::evaluate("\"ab\" + \"cd\""), Some("abcd".to_string()));
    assert_eq!(expr::evaluate("1 < 2"), Some("1".to_string()));
    assert_eq!(expr::evaluate("2 <= 1"), Some("0".to_string()));
    assert_eq!(expr::evaluate("\"x\" == \"x\""), Some("1".to_string()));
    assert_eq!(expr::evaluate("\"x\" != \"y\""), Some("1".to_string()));
}

#[test]
fn expr_ternary_and_logic() {
    assert_eq!(expr::evaluate("true ? \"a\" : \"b\""), Some("a".to_string()));
    assert_eq!(expr::evaluate("0 ? \"a\" : \"b\""), Some("b".to_string()));
    assert_eq!(expr::evaluate("1 && 0"), Some("0".to_string()));
    assert_eq!(expr::evaluate("1 || 0"), Some("1".to_string()));
    assert_eq!(expr::evaluate("!0"), Some("1".to_string()));
}

#[test]
fn expr_casts() {
    assert_eq!(expr::evaluate("(int) 3.9"), Some("3".to_string()));
    assert_eq!(expr::evaluate("(double) 5 / 2"), Some("2.5".to_string()));
    assert_eq!(expr::evaluate("(int) 7 / (int) 2.9"), Some("3".to_string()));
}

#[test]
fn expr_rejects_malformed_input() {
    assert_eq!(expr::evaluate(""), None);
    assert_eq!(expr::evaluate("1 +"), None);
    assert_eq!(expr::evaluate("(1"), None);
    assert_eq!(expr::evaluate("1 2"), None);
    assert_eq!(expr::evaluate("\"open"), None);
}

// ── Diagnostics ─────────────────────────────────────────────────────

#[test]
fn parse_errors_carry_positions() {
    let err = parser::parse("A {\n  x = ;\n}").unwrap_err();
    let pos = err.pos();
    assert_eq!(pos.line, 1);
    assert_eq!(pos.column, 6);
    assert!(err.to_string().starts_with("parse error at 2:7"));
}

#[test]
fn context_line_points_at_the_column() {
    let input = "A {\n  x = ;\n}";
    let err = parser::parse(input).unwrap_err();
    assert_eq!(err.context_line(input), "    x = ;\n        ^");
}

#[test]
fn dump_renders_blocks_and_fields() {
    let doc = load("A \"main\" { x = 1; B { y = true; } }").unwrap();
    let out = printer::dump(&doc);
    assert_eq!(
        out,
        "Block: A \"main\"\n  Field: x (inferred) = 1\n  Block: B\n    Field: y (inferred) = true\n"
    );
}
