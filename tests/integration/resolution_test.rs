//! End-to-end template resolution workflows
//!
//! Verifies the workspace-config-to-resolved-request path: environment files
//! on disk, namespace precedence, typed JSON bodies, and the fail-fast error
//! contract.

use pm_harness::request::{build, HttpMethod, RequestDescriptor};
use pm_harness::resolver::ResolveError;
use pm_harness::session::Session;
use pm_harness::store::Scalar;

use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn workspace_with_env(config: &str) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join(".pm-env.json"), config).unwrap();
    temp_dir
}

#[test]
fn test_workspace_env_to_resolved_request() {
    let workspace = workspace_with_env(
        r#"{
            "$shared": {"api_version": "v1"},
            "ci": {
                "server": "https://api.test",
                "org_member_token": "tok-ci"
            },
            "local": {
                "server": "http://localhost:8088",
                "org_member_token": "tok-local"
            },
            "active": "ci"
        }"#,
    );

    let mut session = Session::from_workspace(workspace.path()).unwrap();
    session.capture("last_event_id", "evt-42");

    let descriptor = RequestDescriptor::new(
        HttpMethod::GET,
        "{{server}}/{{api_version}}/events/{{last_event_id}}/ticket_types",
    )
    .header("Authorization", "Bearer {{org_member_token}}");

    let resolved = build(&descriptor, session.store()).unwrap();

    assert_eq!(
        resolved.url,
        "https://api.test/v1/events/evt-42/ticket_types"
    );
    assert_eq!(
        resolved.headers.get("Authorization").unwrap(),
        "Bearer tok-ci"
    );
}

#[test]
fn test_explicit_environment_overrides_active() {
    let workspace = workspace_with_env(
        r#"{
            "ci": {"server": "https://api.test"},
            "local": {"server": "http://localhost:8088"},
            "active": "ci"
        }"#,
    );

    let session = Session::from_workspace_env(workspace.path(), "local").unwrap();
    assert_eq!(
        session.resolve("{{server}}").unwrap(),
        "http://localhost:8088"
    );
}

#[test]
fn test_captured_variable_shadows_environment() {
    let workspace = workspace_with_env(r#"{"ci": {"server": "https://api.test"}, "active": "ci"}"#);

    let mut session = Session::from_workspace(workspace.path()).unwrap();
    session.capture("server", "http://127.0.0.1:1234");

    assert_eq!(
        session.resolve("{{server}}").unwrap(),
        "http://127.0.0.1:1234"
    );

    // The shadow disappears with the variables namespace; the environment
    // value is visible again.
    session.reset_variables();
    assert_eq!(session.resolve("{{server}}").unwrap(), "https://api.test");
}

#[test]
fn test_typed_body_resolution() {
    let mut session = Session::new();
    session.capture("ticket_type_id", "tt-9");
    session.capture("quantity", 3i64);
    session.capture("is_comp", true);

    let body = json!({
        "ticket_type_id": "{{ticket_type_id}}",
        "quantity": "{{quantity}}",
        "comp": "{{is_comp}}",
        "note": "hold {{quantity}} tickets"
    });

    assert_eq!(
        session.resolve_json(&body).unwrap(),
        json!({
            "ticket_type_id": "tt-9",
            "quantity": 3,
            "comp": true,
            "note": "hold 3 tickets"
        })
    );
}

#[test]
fn test_fail_fast_error_contract() {
    let mut session = Session::new();
    session.set_environment("server", "https://api.test");

    // Missing variable: the error names both the key and the template.
    match session.resolve("{{server}}/orders/{{order_id}}").unwrap_err() {
        ResolveError::UnresolvedVariable { name, template } => {
            assert_eq!(name, "order_id");
            assert_eq!(template, "{{server}}/orders/{{order_id}}");
        }
        other => panic!("expected UnresolvedVariable, got {:?}", other),
    }

    // Unterminated marker is malformed, not passed through.
    assert!(matches!(
        session.resolve("{{server}}/events/{{oops").unwrap_err(),
        ResolveError::MalformedTemplate { .. }
    ));

    // A failed build produces no partial request.
    let descriptor = RequestDescriptor::new(HttpMethod::GET, "{{server}}/{{missing}}");
    assert!(build(&descriptor, session.store()).is_err());
}

#[test]
fn test_nested_values_and_escapes() {
    let mut session = Session::new();
    session.set_environment("host", "api.test");
    session.set_environment("server", "https://{{host}}");

    assert_eq!(
        session.resolve("{{server}}/events").unwrap(),
        "https://api.test/events"
    );

    // Escaped braces survive as literal markers.
    assert_eq!(
        session.resolve(r"literal \{{host\}} here").unwrap(),
        "literal {{host}} here"
    );
}

#[test]
fn test_builtin_variables_resolve() {
    let session = Session::new();

    let guid = session.resolve("{{$guid}}").unwrap();
    assert_eq!(guid.len(), 36);

    let n = session.resolve("{{$randomInt 5 5}}").unwrap();
    assert_eq!(n, "5");

    let ts = session.resolve("{{$timestamp}}").unwrap();
    assert!(ts.parse::<i64>().is_ok());
}

#[test]
fn test_typed_resolution_preserves_scalar_type() {
    let mut session = Session::new();
    session.capture("count", 7i64);

    assert_eq!(
        session.resolve_typed("{{count}}").unwrap(),
        Scalar::Num(7.into())
    );
    // Mixed content always stringifies.
    assert_eq!(
        session.resolve_typed("n={{count}}").unwrap(),
        Scalar::Str("n=7".to_string())
    );
}
